use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

pub fn parse_datetime(dt_str: &str) -> Option<DateTime<Utc>> {
    let dt_str = dt_str.trim();

    // Try ISO 8601 format first
    if let Ok(dt) = DateTime::parse_from_rfc3339(dt_str) {
        return Some(dt.with_timezone(&Utc));
    }

    // The service emits naive timestamps for columns without a zone.
    let formats = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
    ];

    let clean_str = dt_str.trim_end_matches('Z');
    for fmt in &formats {
        if let Ok(naive) = NaiveDateTime::parse_from_str(clean_str, fmt) {
            return Some(DateTime::from_naive_utc_and_offset(naive, Utc));
        }
    }

    NaiveDate::parse_from_str(clean_str, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
}

pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M").to_string()
}

/// Serde adapter for optional timestamps that tolerates naive and malformed
/// values. Anything unparseable becomes `None` rather than failing the payload.
pub fn deserialize_optional<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_datetime))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_rfc3339_with_offset() {
        let dt = parse_datetime("2024-03-01T12:30:00+09:00").unwrap();
        assert_eq!(dt.hour(), 3);
        assert_eq!(dt.day(), 1);
    }

    #[test]
    fn test_parse_naive_with_fraction() {
        let dt = parse_datetime("2023-12-31T23:59:58.123456").unwrap();
        assert_eq!(dt.year(), 2023);
        assert_eq!(dt.second(), 58);
    }

    #[test]
    fn test_parse_date_only() {
        let dt = parse_datetime("2022-07-04").unwrap();
        assert_eq!((dt.month(), dt.day(), dt.hour()), (7, 4, 0));
    }

    #[test]
    fn test_parse_garbage() {
        assert!(parse_datetime("yesterday").is_none());
        assert!(parse_datetime("").is_none());
    }

    #[test]
    fn test_deserialize_optional_tolerates_bad_values() {
        #[derive(Deserialize)]
        struct Row {
            #[serde(default, deserialize_with = "deserialize_optional")]
            at: Option<DateTime<Utc>>,
        }

        let row: Row = serde_json::from_str(r#"{"at":"not a date"}"#).unwrap();
        assert!(row.at.is_none());
        let row: Row = serde_json::from_str(r#"{"at":null}"#).unwrap();
        assert!(row.at.is_none());
        let row: Row = serde_json::from_str(r#"{}"#).unwrap();
        assert!(row.at.is_none());
        let row: Row = serde_json::from_str(r#"{"at":"2024-01-15T10:30:00"}"#).unwrap();
        assert_eq!(row.at.unwrap().year(), 2024);
    }
}
