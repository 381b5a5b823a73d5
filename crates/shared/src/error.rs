//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
///
/// Cross-tenant access is always reported as `NotFound`.
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found, or not visible from the caller's workspace.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Business rule violation.
    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    /// A ledger row failed its reconciliation formula.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::BusinessRule(_) => 422,
            Self::InvariantViolation(_) | Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::BusinessRule(_) => "BUSINESS_RULE_VIOLATION",
            Self::InvariantViolation(_) => "INVARIANT_VIOLATION",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns true for errors whose detail must not be shown to API callers.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        self.status_code() >= 500
    }
}
