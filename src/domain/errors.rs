//! Domain-specific error types

use thiserror::Error;

/// Domain-level validation errors
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid input for field {field}: {message}")]
    InvalidInput { field: String, message: String },
}
