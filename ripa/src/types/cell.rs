use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde::{Serialize, Serializer};

use crate::conversions::bool::Truthiness;

/// A typed value of a canonical document field.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Bool(bool),
    String(String),
    I64(i64),
    /// Timestamp carrying the offset of the zone it was recorded in.
    TimestampTz(DateTime<FixedOffset>),
}

impl Cell {
    pub fn as_timestamp(&self) -> Option<&DateTime<FixedOffset>> {
        match self {
            Cell::TimestampTz(value) => Some(value),
            _ => None,
        }
    }
}

/// Recognized literals become booleans, anything else stays text.
impl From<Truthiness> for Cell {
    fn from(value: Truthiness) -> Self {
        match value {
            Truthiness::Bool(value) => Cell::Bool(value),
            Truthiness::Unrecognized(raw) => Cell::String(raw),
        }
    }
}

impl From<Option<i64>> for Cell {
    fn from(value: Option<i64>) -> Self {
        value.map(Cell::I64).unwrap_or(Cell::Null)
    }
}

impl Serialize for Cell {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Cell::Null => serializer.serialize_none(),
            Cell::Bool(value) => value.serialize(serializer),
            Cell::String(value) => value.serialize(serializer),
            Cell::I64(value) => value.serialize(serializer),
            Cell::TimestampTz(value) => {
                serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::AutoSi, false))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn timestamps_serialize_as_rfc3339_with_offset() {
        let offset = FixedOffset::west_opt(8 * 3600).unwrap();
        let timestamp = offset.with_ymd_and_hms(2022, 1, 25, 10, 10, 5).unwrap();

        let value = serde_json::to_value(Cell::TimestampTz(timestamp)).unwrap();

        assert_eq!(value, json!("2022-01-25T10:10:05-08:00"));
    }

    #[test]
    fn unrecognized_truthiness_stays_text() {
        assert_eq!(Cell::from(Truthiness::Bool(true)), Cell::Bool(true));
        assert_eq!(
            Cell::from(Truthiness::Unrecognized("maybe".to_string())),
            Cell::String("maybe".to_string())
        );
    }

    #[test]
    fn missing_integers_serialize_as_null() {
        assert_eq!(serde_json::to_value(Cell::from(None)).unwrap(), json!(null));
        assert_eq!(serde_json::to_value(Cell::from(Some(42))).unwrap(), json!(42));
    }
}
