use chrono::{Datelike, Duration, NaiveDate, Weekday};

pub(crate) fn today_local() -> NaiveDate {
    // Use system local timezone (browser runtime).
    let d = js_sys::Date::new_0();
    NaiveDate::from_ymd_opt(d.get_full_year() as i32, d.get_month() + 1, d.get_date())
        .unwrap_or_default()
}

pub(crate) fn now_ms() -> i64 {
    js_sys::Date::now().round() as i64
}

/// `DD-MM-YYYY`, the format printed on notices and remarks.
pub(crate) fn format_dmy(d: NaiveDate) -> String {
    d.format("%d-%m-%Y").to_string()
}

/// `YYYY-MM-DD`, the format of `<input type="date">` and the backend.
pub(crate) fn format_iso(d: NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

pub(crate) fn parse_iso(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

fn is_weekend(d: NaiveDate) -> bool {
    matches!(d.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Move forward `days` working days (Mon-Fri). Public holidays are not known
/// to the front end and are not skipped.
pub(crate) fn add_business_days(start: NaiveDate, days: u32) -> NaiveDate {
    let mut d = start;
    let mut left = days;
    while left > 0 {
        d += Duration::days(1);
        if !is_weekend(d) {
            left -= 1;
        }
    }
    d
}

/// Indian PIN code: six digits, never starting with 0.
pub(crate) fn is_valid_postal_code(s: &str) -> bool {
    let s = s.trim();
    s.len() == 6 && s.bytes().all(|b| b.is_ascii_digit()) && !s.starts_with('0')
}

/// PAN layout: five letters, four digits, one letter.
pub(crate) fn is_valid_pan(s: &str) -> bool {
    let b = s.trim().as_bytes();
    b.len() == 10
        && b[..5].iter().all(|c| c.is_ascii_uppercase())
        && b[5..9].iter().all(|c| c.is_ascii_digit())
        && b[9].is_ascii_uppercase()
}
