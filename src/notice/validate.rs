use super::address::AddressMode;
use super::kind::DocumentType;
use super::state::PopupState;
use crate::util::{is_valid_pan, is_valid_postal_code};
use std::fmt;

/// First reason a notice cannot be generated yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ValidationError {
    NoCase,
    NoticeDate,
    Address,
    PostalCode,
    BankAccount,
    HearingDate,
    HearingBeforeNotice,
    Cp1Date,
    ShowCauseRef,
    Names,
    Subject,
    LetterBody,
    Pan,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::NoCase => "No case selected",
            Self::NoticeDate => "Select the notice date",
            Self::Address => "Enter the address for the notice",
            Self::PostalCode => "Enter a valid 6-digit postal code",
            Self::BankAccount => "Add at least one bank account with bank name and account number",
            Self::HearingDate => "Select the hearing date",
            Self::HearingBeforeNotice => "Hearing date must be after the notice date",
            Self::Cp1Date => "Enter the CP-1 date",
            Self::ShowCauseRef => "Enter the show-cause notice reference",
            Self::Names => "Add at least one name",
            Self::Subject => "Enter the letter subject",
            Self::LetterBody => "Enter the letter body",
            Self::Pan => "Enter a valid PAN (e.g. ABCDE1234F)",
        };
        f.write_str(msg)
    }
}

pub(crate) fn validate(state: &PopupState) -> Result<(), ValidationError> {
    let (Some(doc), Some(_)) = (state.doc, state.case.as_ref()) else {
        return Err(ValidationError::NoCase);
    };
    let notice_date = state.notice_date.ok_or(ValidationError::NoticeDate)?;

    let resolved = state.resolved_address();
    if resolved.is_empty() {
        return Err(ValidationError::Address);
    }
    if state.address_mode == AddressMode::New && !is_valid_postal_code(&resolved.postal_code) {
        return Err(ValidationError::PostalCode);
    }

    let f = &state.fields;
    match doc {
        DocumentType::Cp3 => {
            if !f.bank_accounts.iter().any(|a| a.is_complete()) {
                return Err(ValidationError::BankAccount);
            }
        }
        DocumentType::Cp25 => {
            let hearing = f.hearing_date.ok_or(ValidationError::HearingDate)?;
            if hearing <= notice_date {
                return Err(ValidationError::HearingBeforeNotice);
            }
            if f.cp1_date.is_none() {
                return Err(ValidationError::Cp1Date);
            }
        }
        DocumentType::Cp26 => {
            if f.show_cause_ref.trim().is_empty() {
                return Err(ValidationError::ShowCauseRef);
            }
            if state.effective_names().is_empty() {
                return Err(ValidationError::Names);
            }
        }
        DocumentType::EstaLetter => {
            if f.subject.trim().is_empty() {
                return Err(ValidationError::Subject);
            }
            if f.letter_body.trim().is_empty() {
                return Err(ValidationError::LetterBody);
            }
        }
        DocumentType::IncomeTaxLetter => {
            if !is_valid_pan(&f.pan) {
                return Err(ValidationError::Pan);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BankAccount, CaseRecord};
    use crate::notice::state::Phase;
    use chrono::NaiveDate;

    fn state(doc: DocumentType) -> PopupState {
        PopupState {
            phase: Phase::Ready,
            doc: Some(doc),
            case: Some(CaseRecord {
                establishment_code: "PUPUN0000001000".to_string(),
                address1: "Plot 4, MIDC".to_string(),
                postal_code: "411019".to_string(),
                ..Default::default()
            }),
            identity: "user-7".to_string(),
            notice_date: NaiveDate::from_ymd_opt(2024, 3, 1),
            ..Default::default()
        }
    }

    #[test]
    fn test_cp3_needs_a_complete_account() {
        let mut s = state(DocumentType::Cp3);
        s.fields.bank_accounts = vec![BankAccount {
            bank_name: "SBI".to_string(),
            account_no: " ".to_string(),
        }];
        assert_eq!(validate(&s), Err(ValidationError::BankAccount));

        s.fields.bank_accounts[0].account_no = "0011".to_string();
        assert_eq!(validate(&s), Ok(()));
    }

    #[test]
    fn test_cp25_hearing_must_follow_notice() {
        let mut s = state(DocumentType::Cp25);
        assert_eq!(validate(&s), Err(ValidationError::HearingDate));

        s.fields.hearing_date = s.notice_date;
        assert_eq!(validate(&s), Err(ValidationError::HearingBeforeNotice));

        s.fields.hearing_date = NaiveDate::from_ymd_opt(2024, 4, 2);
        assert_eq!(validate(&s), Err(ValidationError::Cp1Date));

        s.fields.cp1_date = NaiveDate::from_ymd_opt(2023, 11, 20);
        assert_eq!(validate(&s), Ok(()));
    }

    #[test]
    fn test_cp26_accepts_typed_name() {
        let mut s = state(DocumentType::Cp26);
        s.fields.show_cause_ref = "SC/44".to_string();
        assert_eq!(validate(&s), Err(ValidationError::Names));

        s.name_input = "A. Rao".to_string();
        assert_eq!(validate(&s), Ok(()));
    }

    #[test]
    fn test_letter_fields() {
        let mut s = state(DocumentType::EstaLetter);
        s.fields.subject = "Dues".to_string();
        assert_eq!(validate(&s), Err(ValidationError::LetterBody));

        let mut s = state(DocumentType::IncomeTaxLetter);
        s.fields.pan = "ABCDE12345".to_string();
        assert_eq!(validate(&s), Err(ValidationError::Pan));
    }

    #[test]
    fn test_missing_address_reported_first() {
        let mut s = state(DocumentType::IncomeTaxLetter);
        s.address_mode = AddressMode::New;
        assert_eq!(validate(&s), Err(ValidationError::Address));
        assert_eq!(
            ValidationError::Address.to_string(),
            "Enter the address for the notice"
        );
    }
}
