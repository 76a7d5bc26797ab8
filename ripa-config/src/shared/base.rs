use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A field holds a value outside its allowed range.
    #[error("invalid value for `{field}`: {constraint}")]
    InvalidFieldValue { field: String, constraint: String },
    /// A password was configured without a username.
    #[error("Invalid Elasticsearch config: `username` must be set when `password` is set")]
    PasswordWithoutUsername,
}
