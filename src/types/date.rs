// src/types/date.rs

use chrono::{DateTime, Utc};
use serde_json::Value;

/// Converts a millisecond Unix epoch into a UTC datetime.
///
/// Returns `None` for values outside chrono's representable range.
pub fn from_epoch_millis(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(millis)
}

/// Reads a millisecond epoch from a JSON value.
///
/// Image services deliver these as integers, but floats and numeric strings show up too.
/// `null`, missing and non-numeric values yield `None`.
pub fn from_epoch_millis_value(value: Option<&Value>) -> Option<DateTime<Utc>> {
    let millis = match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    from_epoch_millis(millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_from_epoch_millis() {
        let dt = from_epoch_millis(1_718_438_400_000).unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 6, 15, 8, 0, 0).unwrap());
    }

    #[test]
    fn test_from_epoch_millis_value_variants() {
        let expected = Utc.with_ymd_and_hms(2024, 6, 15, 8, 0, 0).unwrap();
        assert_eq!(
            from_epoch_millis_value(Some(&json!(1_718_438_400_000i64))),
            Some(expected)
        );
        assert_eq!(
            from_epoch_millis_value(Some(&json!(1_718_438_400_000.0))),
            Some(expected)
        );
        assert_eq!(
            from_epoch_millis_value(Some(&json!("1718438400000"))),
            Some(expected)
        );
        assert_eq!(from_epoch_millis_value(Some(&Value::Null)), None);
        assert_eq!(from_epoch_millis_value(Some(&json!("soon"))), None);
        assert_eq!(from_epoch_millis_value(None), None);
    }
}
