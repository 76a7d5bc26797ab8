use std::collections::HashMap;

use crate::error::{ErrorKind, EtlResult};
use crate::etl_error;

/// One source row: column name to raw text.
///
/// Records are never mutated once read; the transformer only borrows from them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    values: HashMap<String, String>,
}

impl RawRecord {
    pub fn new(values: HashMap<String, String>) -> Self {
        Self { values }
    }

    /// Returns the value of `column`, if the record has that column.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }

    /// Returns the value of `column` or a [`ErrorKind::SchemaViolation`] naming it.
    pub fn required(&self, column: &str) -> EtlResult<&str> {
        self.get(column).ok_or_else(|| {
            etl_error!(
                ErrorKind::SchemaViolation,
                "Required column is missing from the record",
                format!("column `{column}` is absent")
            )
        })
    }

    pub fn contains(&self, column: &str) -> bool {
        self.values.contains_key(column)
    }
}

impl<K, V> FromIterator<(K, V)> for RawRecord
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(column, value)| (column.into(), value.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_required_column_is_a_schema_violation() {
        let record: RawRecord = [("pid", "1")].into_iter().collect();

        assert_eq!(record.required("pid").unwrap(), "1");

        let err = record.required("stop_id").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaViolation);
        assert!(err.detail().unwrap().contains("stop_id"));
    }

    #[test]
    fn empty_values_are_present() {
        let record: RawRecord = [("beat", "")].into_iter().collect();

        assert!(record.contains("beat"));
        assert_eq!(record.required("beat").unwrap(), "");
        assert_eq!(record.get("city"), None);
    }
}
