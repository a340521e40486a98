// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Provider reported the account limit as reached
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Quota check itself failed and the policy is fail-closed
    #[error("Quota check unavailable: {0}")]
    QuotaUnavailable(String),

    #[error("Execution error: {0}")]
    Execution(#[from] crate::port::ExecutionError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// True for errors caused by the caller's input (mapped to 4xx by the API layer)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AppError::Validation(_)
                | AppError::NotFound(_)
                | AppError::QuotaExceeded(_)
                | AppError::Domain(crate::domain::DomainError::ValidationError(_))
        )
    }
}
