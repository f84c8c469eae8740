//! Lenient field parsing shared by the source adapters.
//!
//! Upstream payloads disagree on date layouts and on whether amounts are
//! numbers or formatted strings; everything funnels through here.

use serde_json::Value;
use time::macros::format_description;
use time::Date;

/// `MM/dd/yyyy`, the layout SAM.gov expects for `postedFrom`/`postedTo`.
pub fn format_us_date(date: Date) -> String {
    format!(
        "{:02}/{:02}/{:04}",
        u8::from(date.month()),
        date.day(),
        date.year()
    )
}

/// `yyyy-MM-dd`, the layout USAspending expects in `time_period`.
pub fn format_iso_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// Parses `yyyy-MM-dd`, `yyyy-MM-ddTHH:mm:ss±hh:mm`, `yyyy-MM-dd HH:mm:ss`,
/// or `MM/dd/yyyy`. Anything else yields `None`.
pub fn parse_loose_date(value: &str) -> Option<Date> {
    let value = value.trim();
    if value.len() >= 10 && value.as_bytes().get(4) == Some(&b'-') {
        let head = value.get(..10)?;
        return Date::parse(head, format_description!("[year]-[month]-[day]")).ok();
    }
    if value.len() >= 10 && value.as_bytes().get(2) == Some(&b'/') {
        let head = value.get(..10)?;
        return Date::parse(head, format_description!("[month]/[day]/[year]")).ok();
    }
    None
}

pub fn date_field(value: Option<&Value>) -> Option<Date> {
    value.and_then(Value::as_str).and_then(parse_loose_date)
}

/// Numbers pass through; strings like `"$1,250,000.00"` are cleaned first.
pub fn amount_field(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => {
            let cleaned = text
                .trim()
                .chars()
                .filter(|ch| !matches!(ch, '$' | ',' | ' '))
                .collect::<String>();
            cleaned.parse::<f64>().ok()
        }
        _ => None,
    }
    .filter(|amount| amount.is_finite())
}

/// Non-blank strings pass through; numbers are rendered (some sources send
/// NAICS codes and years as integers).
pub fn text_field(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(text) => {
            let text = text.trim();
            (!text.is_empty()).then(|| text.to_owned())
        }
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

pub fn year_field(value: Option<&Value>) -> Option<i32> {
    match value? {
        Value::Number(number) => number.as_i64().and_then(|year| i32::try_from(year).ok()),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::date;

    #[test]
    fn formats_both_request_layouts() {
        let day = date!(2025 - 03 - 07);
        assert_eq!(format_us_date(day), "03/07/2025");
        assert_eq!(format_iso_date(day), "2025-03-07");
    }

    #[test]
    fn parses_the_date_shapes_upstreams_send() {
        let expected = Some(date!(2024 - 01 - 15));
        assert_eq!(parse_loose_date("2024-01-15"), expected);
        assert_eq!(parse_loose_date("2024-01-15T17:00:00-05:00"), expected);
        assert_eq!(parse_loose_date("2024-01-15 00:00:00"), expected);
        assert_eq!(parse_loose_date("01/15/2024"), expected);
        assert_eq!(parse_loose_date("January 15"), None);
        assert_eq!(parse_loose_date(""), None);
    }

    #[test]
    fn amounts_accept_numbers_and_formatted_strings() {
        assert_eq!(amount_field(Some(&json!(150000))), Some(150_000.0));
        assert_eq!(amount_field(Some(&json!("$1,250,000.50"))), Some(1_250_000.5));
        assert_eq!(amount_field(Some(&json!("n/a"))), None);
        assert_eq!(amount_field(Some(&Value::Null)), None);
        assert_eq!(amount_field(None), None);
    }

    #[test]
    fn text_renders_numbers_and_drops_blanks() {
        assert_eq!(text_field(Some(&json!(541512))), Some(String::from("541512")));
        assert_eq!(text_field(Some(&json!("  "))), None);
        assert_eq!(year_field(Some(&json!("2023"))), Some(2023));
    }
}
