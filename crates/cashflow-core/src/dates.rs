//! Lenient calendar-date parsing shared by every input boundary.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer};

/// Calendar-only formats, tried in order.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d"];

/// Timestamp formats without an offset (`%.f` also accepts no fraction).
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse a calendar date.
///
/// Accepts ISO dates (`2025-01-31`), day-first dates (`31/01/2025`),
/// slash ISO (`2025/01/31`), RFC 3339 timestamps and naive timestamps. The
/// time-of-day part is discarded; RFC 3339 timestamps keep their local date.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Some(date);
        }
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(ts.date_naive());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(ts.date());
        }
    }

    None
}

/// `#[serde(deserialize_with)]` adapter over [`parse_date`].
pub fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("unrecognised date '{raw}'")))
}

/// Optional form of [`deserialize_date`]; pair with `#[serde(default)]`.
pub fn deserialize_optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) => parse_date(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("unrecognised date '{raw}'"))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_iso_date() {
        assert_eq!(parse_date("2025-01-31"), Some(ymd(2025, 1, 31)));
    }

    #[test]
    fn test_parse_day_first_date() {
        assert_eq!(parse_date("05/03/2025"), Some(ymd(2025, 3, 5)));
    }

    #[test]
    fn test_parse_rfc3339_keeps_local_date() {
        assert_eq!(
            parse_date("2025-02-28T23:30:00+02:00"),
            Some(ymd(2025, 2, 28))
        );
        assert_eq!(
            parse_date("2025-06-30T10:15:00.000Z"),
            Some(ymd(2025, 6, 30))
        );
    }

    #[test]
    fn test_parse_naive_timestamp() {
        assert_eq!(parse_date("2025-04-01T08:15:00"), Some(ymd(2025, 4, 1)));
        assert_eq!(
            parse_date("2025-04-01 08:15:00.250"),
            Some(ymd(2025, 4, 1))
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("   "), None);
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date("2025-13-01"), None);
        assert_eq!(parse_date("31/02/2025"), None);
    }

    #[derive(Debug, Deserialize)]
    struct Dated {
        #[serde(deserialize_with = "deserialize_date")]
        on: NaiveDate,
        #[serde(default, deserialize_with = "deserialize_optional_date")]
        until: Option<NaiveDate>,
    }

    #[test]
    fn test_serde_adapters() {
        let d: Dated =
            serde_json::from_str(r#"{"on":"2025-06-30T10:15:00Z","until":"30/07/2025"}"#).unwrap();
        assert_eq!(d.on, ymd(2025, 6, 30));
        assert_eq!(d.until, Some(ymd(2025, 7, 30)));

        let d: Dated = serde_json::from_str(r#"{"on":"2025-06-30","until":null}"#).unwrap();
        assert_eq!(d.until, None);
        let d: Dated = serde_json::from_str(r#"{"on":"2025-06-30"}"#).unwrap();
        assert_eq!(d.until, None);

        let err = serde_json::from_str::<Dated>(r#"{"on":"someday"}"#).unwrap_err();
        assert!(err.to_string().contains("someday"));
    }
}
