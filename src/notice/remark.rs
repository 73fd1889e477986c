use super::kind::DocumentType;
use crate::util::format_dmy;
use chrono::NaiveDate;

/// `<DD-MM-YYYY> - <label> issued[ to <names>]`.
///
/// Names are only listed for multi-name notices; blanks are skipped.
pub(crate) fn derive_remark(doc: DocumentType, date: Option<NaiveDate>, names: &[String]) -> String {
    let Some(date) = date else {
        return String::new();
    };

    let mut out = format!("{} - {} issued", format_dmy(date), doc.label());

    if doc.is_multi_name() {
        let names: Vec<&str> = names
            .iter()
            .map(|n| n.trim())
            .filter(|n| !n.is_empty())
            .collect();
        if !names.is_empty() {
            out.push_str(" to ");
            out.push_str(&names.join(", "));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn test_plain_remark() {
        assert_eq!(
            derive_remark(DocumentType::Cp3, ymd(2024, 1, 15), &[]),
            "15-01-2024 - CP-3 issued"
        );
    }

    #[test]
    fn test_multi_name_remark_lists_names() {
        let names = vec!["R. Shah".to_string(), " ".to_string(), "A. Rao".to_string()];
        assert_eq!(
            derive_remark(DocumentType::Cp26, ymd(2024, 2, 1), &names),
            "01-02-2024 - CP-26 issued to R. Shah, A. Rao"
        );
    }

    #[test]
    fn test_single_name_notice_ignores_names() {
        let names = vec!["R. Shah".to_string()];
        assert_eq!(
            derive_remark(DocumentType::IncomeTaxLetter, ymd(2024, 2, 1), &names),
            "01-02-2024 - Income Tax Letter issued"
        );
    }

    #[test]
    fn test_no_date_no_remark() {
        assert!(derive_remark(DocumentType::Cp25, None, &[]).is_empty());
    }
}
