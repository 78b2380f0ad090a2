use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A field holds a value outside of its allowed range.
    #[error("Invalid value for `{field}`: {constraint}")]
    InvalidFieldValue { field: String, constraint: String },
    /// Every diff classification is disabled, so nothing would ever be printed.
    #[error("Invalid output config: at least one diff mode must be enabled")]
    NoDiffModesEnabled,
}
