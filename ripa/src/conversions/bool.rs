use crate::bail;
use crate::error::{ErrorKind, EtlResult};

/// Result of reading a boolean-like literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Truthiness {
    Bool(bool),
    /// The literal was not recognized and is kept verbatim.
    Unrecognized(String),
}

impl Truthiness {
    /// Returns `true` only for a recognized true literal.
    pub fn is_set(&self) -> bool {
        matches!(self, Truthiness::Bool(true))
    }

    /// Returns `true` for a recognized true literal or any non-empty unrecognized text.
    ///
    /// Used where a raw indicator counts as present unless it is empty or explicitly false.
    /// This is stricter than a plain non-empty check: recognized false literals such as `"0"`,
    /// `"false"` or `"no"` count as absent, so `gend_nc = "0"` does not mark a person as
    /// nonconforming.
    pub fn is_present(&self) -> bool {
        match self {
            Truthiness::Bool(value) => *value,
            Truthiness::Unrecognized(raw) => !raw.trim().is_empty(),
        }
    }
}

/// Reads `{yes,1,true,on}` as `true` and `{no,0,false,off}` as `false`, ignoring case.
///
/// Anything else is returned unchanged as [`Truthiness::Unrecognized`].
pub fn parse_truthiness(value: &str) -> Truthiness {
    match value.to_ascii_lowercase().as_str() {
        "yes" | "1" | "true" | "on" => Truthiness::Bool(true),
        "no" | "0" | "false" | "off" => Truthiness::Bool(false),
        _ => Truthiness::Unrecognized(value.to_string()),
    }
}

/// Like [`parse_truthiness`] but rejects unrecognized literals.
pub fn parse_bool_strict(value: &str) -> EtlResult<bool> {
    match parse_truthiness(value) {
        Truthiness::Bool(value) => Ok(value),
        Truthiness::Unrecognized(raw) => {
            bail!(
                ErrorKind::ConversionError,
                "Unrecognized boolean literal",
                format!("value `{raw}` is not one of yes/no, 1/0, true/false, on/off")
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn true_literals_are_recognized_in_any_case() {
        for literal in ["yes", "YES", "Yes", "1", "true", "True", "TRUE", "on", "On"] {
            assert_eq!(parse_truthiness(literal), Truthiness::Bool(true), "{literal}");
        }
    }

    #[test]
    fn false_literals_are_recognized_in_any_case() {
        for literal in ["no", "NO", "0", "false", "False", "off", "OFF"] {
            assert_eq!(parse_truthiness(literal), Truthiness::Bool(false), "{literal}");
        }
    }

    #[test]
    fn other_text_is_returned_unchanged() {
        for literal in ["", "2", "maybe", "Y", " yes", "N/A"] {
            assert_eq!(
                parse_truthiness(literal),
                Truthiness::Unrecognized(literal.to_string())
            );
        }
    }

    #[test]
    fn presence_follows_text_truthiness() {
        assert!(parse_truthiness("1").is_present());
        assert!(parse_truthiness("maybe").is_present());
        assert!(!parse_truthiness("0").is_present());
        assert!(!parse_truthiness("FALSE").is_present());
        assert!(!parse_truthiness("no").is_present());
        assert!(!parse_truthiness("").is_present());

        assert!(!parse_truthiness("maybe").is_set());
        assert!(parse_truthiness("on").is_set());
    }

    #[test]
    fn strict_parsing_rejects_unrecognized_literals() {
        assert!(parse_bool_strict("Off").is_ok_and(|value| !value));

        let err = parse_bool_strict("perhaps").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConversionError);
        assert!(err.detail().unwrap().contains("perhaps"));
    }
}
