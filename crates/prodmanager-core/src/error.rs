use thiserror::Error;

use crate::validation::FieldError;

/// Application-wide error types for ProdManager.
#[derive(Error, Debug)]
pub enum AppError {
    /// One or more fields failed their checks.
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    /// A uniqueness constraint rejected the write.
    #[error("{field} already exists")]
    Conflict { field: String },

    /// A foreign-key constraint rejected the write.
    #[error("Referenced record does not exist")]
    ForeignKey,

    /// Missing, invalid or expired credentials.
    #[error("{0}")]
    Authentication(String),

    /// Authenticated principal lacks the required role.
    #[error("{0}")]
    Authorization(String),

    /// The addressed record does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Explicit status chosen by a handler.
    #[error("{message}")]
    WithStatus { status: u16, message: String },

    /// The persistence layer is unreachable.
    #[error("Database connection failed: {0}")]
    Connection(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(String),

    /// Missing or malformed configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Password hashing or hash parsing failed.
    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Anything else.
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// Shorthand for a single-field validation failure.
    pub fn invalid_field(
        field: impl Into<String>,
        message: impl Into<String>,
        value: serde_json::Value,
    ) -> Self {
        AppError::Validation(vec![FieldError::new(field, message, value)])
    }
}
