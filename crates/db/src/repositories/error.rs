//! Error type shared by the ledger repositories.

use kasa_core::ledger::LedgerError;
use kasa_shared::AppError;
use sea_orm::DbErr;

/// Errors raised by ledger repositories.
#[derive(Debug, thiserror::Error)]
pub enum LedgerRepoError {
    /// Row is missing or belongs to another workspace.
    #[error("{0} not found")]
    NotFound(String),

    /// Validation, lifecycle, or invariant error from the ledger core.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl LedgerRepoError {
    /// Builds a `NotFound` naming the entity and id.
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{entity} {id}"))
    }
}

impl From<LedgerRepoError> for AppError {
    fn from(err: LedgerRepoError) -> Self {
        match err {
            LedgerRepoError::NotFound(what) => Self::NotFound(what),
            LedgerRepoError::Ledger(e) => match e.http_status_code() {
                404 => Self::NotFound(e.to_string()),
                422 => Self::BusinessRule(e.to_string()),
                500 => Self::InvariantViolation(e.to_string()),
                _ => Self::Validation(e.to_string()),
            },
            LedgerRepoError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kasa_shared::types::BudgetPeriodId;

    #[test]
    fn test_maps_to_app_error_taxonomy() {
        let err: AppError = LedgerRepoError::not_found("Period balance", 5).into();
        assert!(matches!(err, AppError::NotFound(ref m) if m == "Period balance 5"));

        let err: AppError = LedgerRepoError::from(LedgerError::SameCurrencyExchange).into();
        assert_eq!(err.status_code(), 400);

        let err: AppError =
            LedgerRepoError::from(LedgerError::PeriodNotFound(BudgetPeriodId::new(1))).into();
        assert_eq!(err.status_code(), 404);

        let err: AppError = LedgerRepoError::from(LedgerError::AlreadyExecuted).into();
        assert_eq!(err.status_code(), 422);

        let err: AppError =
            LedgerRepoError::from(LedgerError::InvariantViolation("x".into())).into();
        assert_eq!(err.error_code(), "INVARIANT_VIOLATION");

        let err: AppError = LedgerRepoError::from(DbErr::Custom("boom".into())).into();
        assert_eq!(err.status_code(), 500);
    }
}
