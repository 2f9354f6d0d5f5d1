//! Error types shared across the workspace

use thiserror::Error;

/// Result type alias for common operations
pub type Result<T> = std::result::Result<T, CommonError>;

/// Validation errors for shared types
#[derive(Error, Debug)]
pub enum CommonError {
    #[error("Invalid chamber: '{0}', must be one of: 'house', 'senate', 'nochamber'")]
    InvalidChamber(String),

    #[error("Chamber '{chamber}' is not supported for {resource}")]
    UnsupportedChamber { chamber: String, resource: String },

    #[error("Invalid congress number: {value}, must be between {min} and {max}")]
    InvalidCongress { value: i64, min: u16, max: u16 },

    #[error("Invalid congress number: '{0}', must be an integer")]
    CongressNotANumber(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),
}

impl CommonError {
    /// Create an invalid identifier error
    pub fn invalid_identifier(msg: impl Into<String>) -> Self {
        Self::InvalidIdentifier(msg.into())
    }
}
