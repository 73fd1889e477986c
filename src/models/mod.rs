use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Text field that tolerates `null` and bare numbers (postal codes often
/// arrive as numbers).
fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match Option::<serde_json::Value>::deserialize(d)? {
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}

/// Backend case ("RRC") row.
///
/// The backend has shipped both camelCase and snake_case keys over time, so
/// every field defaults and accepts either spelling.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CaseRecord {
    #[serde(default, deserialize_with = "lenient_string", alias = "_id")]
    pub id: String,

    #[serde(default, deserialize_with = "lenient_string", alias = "establishment_code", alias = "estaCode")]
    pub establishment_code: String,

    #[serde(default, deserialize_with = "lenient_string", alias = "cert_no", alias = "rrcNo")]
    pub cert_no: String,

    #[serde(default, deserialize_with = "lenient_string", alias = "establishment_name", alias = "estaName")]
    pub establishment_name: String,

    #[serde(default, deserialize_with = "lenient_string", alias = "add1")]
    pub address1: String,
    #[serde(default, deserialize_with = "lenient_string", alias = "add2")]
    pub address2: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub city: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub district: String,

    #[serde(default, deserialize_with = "lenient_string", alias = "postal_code", alias = "pincode")]
    pub postal_code: String,

    #[serde(default, deserialize_with = "lenient_string", alias = "enforcement_officer")]
    pub enforcement_officer: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub remarks: String,

    /// `YYYY-MM-DD` when the backend knows it.
    #[serde(default, alias = "cp1_date")]
    pub cp1_date: Option<String>,
}

impl CaseRecord {
    /// Address lines of the case joined into one line, blanks skipped.
    pub fn joined_address(&self) -> String {
        [
            self.address1.as_str(),
            self.address2.as_str(),
            self.city.as_str(),
            self.district.as_str(),
        ]
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }

    pub fn parsed_cp1_date(&self) -> Option<NaiveDate> {
        self.cp1_date
            .as_deref()
            .and_then(|s| NaiveDate::parse_from_str(s.get(..10).unwrap_or(s), "%Y-%m-%d").ok())
    }

    /// Identity used to decide whether an open popup must be reset.
    pub fn key(&self) -> (String, String) {
        (self.establishment_code.clone(), self.cert_no.clone())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SavedAddress {
    #[serde(default, deserialize_with = "lenient_string", alias = "_id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub address: String,
    #[serde(default, deserialize_with = "lenient_string", alias = "postal_code", alias = "pincode")]
    pub postal_code: String,
    #[serde(default, deserialize_with = "lenient_string", alias = "employer_name")]
    pub employer_name: String,
}

/// Office-level defaults used to prefill notices.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OfficeRecord {
    #[serde(default, deserialize_with = "lenient_string", alias = "office_name")]
    pub office_name: String,
    #[serde(default, deserialize_with = "lenient_string", alias = "officer_name")]
    pub officer_name: String,
    #[serde(default, deserialize_with = "lenient_string", alias = "officer_designation")]
    pub officer_designation: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub address: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub phone: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: String,
}

/// One bank account on a prohibitory order.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BankAccount {
    pub bank_name: String,
    pub account_no: String,
}

impl BankAccount {
    pub fn is_complete(&self) -> bool {
        !self.bank_name.trim().is_empty() && !self.account_no.trim().is_empty()
    }
}
