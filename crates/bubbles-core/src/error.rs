//! Error types for Bubbles

use thiserror::Error;

/// The main error type for Bubbles operations
#[derive(Debug, Error)]
pub enum BubblesError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),

    #[error("Invalid field type for '{field}': expected {expected}, got {got}")]
    InvalidFieldType {
        field: String,
        expected: String,
        got: String,
    },

    #[error("Value out of range: {field} must be between {min} and {max}, got {value}")]
    ValueOutOfRange {
        field: String,
        min: f64,
        max: f64,
        value: f64,
    },

    #[error("Invalid enum value: {value} is not one of {allowed:?}")]
    InvalidEnumValue {
        value: String,
        allowed: Vec<String>,
    },

    #[error("Render error: {0}")]
    RenderError(String),
}

/// Result type alias for Bubbles operations
pub type Result<T> = std::result::Result<T, BubblesError>;

impl From<toml::de::Error> for BubblesError {
    fn from(err: toml::de::Error) -> Self {
        BubblesError::TomlParseError(err.to_string())
    }
}
