use crate::models::{CaseRecord, SavedAddress};

/// Where the notice's address comes from. Exactly one source is active.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) enum AddressMode {
    /// Address lines stored on the case record.
    #[default]
    Existing,
    /// A previously saved address, by id.
    Saved(String),
    /// Typed into the popup.
    New,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct ResolvedAddress {
    pub address: String,
    pub postal_code: String,
}

impl ResolvedAddress {
    pub fn is_empty(&self) -> bool {
        self.address.trim().is_empty()
    }
}

pub(crate) fn resolve_address(
    mode: &AddressMode,
    case: Option<&CaseRecord>,
    saved: &[SavedAddress],
    new_address: &str,
    new_postal_code: &str,
) -> ResolvedAddress {
    match mode {
        AddressMode::Existing => case
            .map(|c| ResolvedAddress {
                address: c.joined_address(),
                postal_code: c.postal_code.trim().to_string(),
            })
            .unwrap_or_default(),
        AddressMode::Saved(id) => saved
            .iter()
            .find(|a| &a.id == id)
            .map(|a| ResolvedAddress {
                address: a.address.trim().to_string(),
                postal_code: a.postal_code.trim().to_string(),
            })
            .unwrap_or_default(),
        AddressMode::New => ResolvedAddress {
            address: new_address.trim().to_string(),
            postal_code: new_postal_code.trim().to_string(),
        },
    }
}

/// Whether `saved` already holds this exact address text and postal code.
pub(crate) fn is_already_saved(saved: &[SavedAddress], address: &str, postal_code: &str) -> bool {
    saved
        .iter()
        .any(|a| a.address.trim() == address.trim() && a.postal_code.trim() == postal_code.trim())
}

/// Enforcement officer assigned to any case in the same postal code.
///
/// The first non-blank assignment in list order wins.
pub(crate) fn officer_for_postal(cases: &[CaseRecord], postal_code: &str) -> Option<String> {
    let postal_code = postal_code.trim();
    if postal_code.is_empty() {
        return None;
    }
    cases
        .iter()
        .filter(|c| c.postal_code.trim() == postal_code)
        .map(|c| c.enforcement_officer.trim())
        .find(|o| !o.is_empty())
        .map(|o| o.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case() -> CaseRecord {
        CaseRecord {
            establishment_code: "PUPUN0000001000".to_string(),
            address1: "Plot 4, MIDC".to_string(),
            city: "Pune".to_string(),
            postal_code: "411019".to_string(),
            ..Default::default()
        }
    }

    fn saved() -> Vec<SavedAddress> {
        vec![SavedAddress {
            id: "a1".to_string(),
            address: "Office 2, Camp".to_string(),
            postal_code: "411001".to_string(),
            employer_name: String::new(),
        }]
    }

    #[test]
    fn test_resolve_each_mode() {
        let c = case();
        let s = saved();

        let r = resolve_address(&AddressMode::Existing, Some(&c), &s, "", "");
        assert_eq!(r.address, "Plot 4, MIDC, Pune");
        assert_eq!(r.postal_code, "411019");

        let r = resolve_address(&AddressMode::Saved("a1".to_string()), Some(&c), &s, "", "");
        assert_eq!(r.postal_code, "411001");

        let r = resolve_address(&AddressMode::New, Some(&c), &s, " Shop 9 ", "411002");
        assert_eq!(r.address, "Shop 9");
        assert_eq!(r.postal_code, "411002");
    }

    #[test]
    fn test_resolve_unknown_saved_id_is_empty() {
        let r = resolve_address(&AddressMode::Saved("gone".to_string()), None, &saved(), "", "");
        assert!(r.is_empty());
    }

    #[test]
    fn test_already_saved_is_exact_match() {
        let s = saved();
        assert!(is_already_saved(&s, "Office 2, Camp ", "411001"));
        assert!(!is_already_saved(&s, "Office 2, Camp", "411002"));
        assert!(!is_already_saved(&s, "office 2, camp", "411001"));
    }

    #[test]
    fn test_officer_for_postal_skips_unassigned() {
        let cases = vec![
            CaseRecord {
                postal_code: "411001".to_string(),
                ..Default::default()
            },
            CaseRecord {
                postal_code: "411001".to_string(),
                enforcement_officer: "S. Kale".to_string(),
                ..Default::default()
            },
            CaseRecord {
                postal_code: "411002".to_string(),
                enforcement_officer: "M. Joshi".to_string(),
                ..Default::default()
            },
        ];
        assert_eq!(officer_for_postal(&cases, "411001").as_deref(), Some("S. Kale"));
        assert_eq!(officer_for_postal(&cases, "411099"), None);
        assert_eq!(officer_for_postal(&cases, ""), None);
    }
}
