//! Ledger error types for validation, lifecycle, and invariant errors.
//!
//! Validation errors are raised before any balance row is touched. Lifecycle errors
//! come from planned transaction execution. `InvariantViolation` means a balance row
//! could not be reconciled and indicates corrupted data rather than a caller mistake.

use chrono::NaiveDate;
use kasa_shared::types::{BudgetPeriodId, CategoryId};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur during ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Amount must be strictly positive.
    #[error("{field} must be greater than zero, got {amount}")]
    NonPositiveAmount {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected amount.
        amount: Decimal,
    },

    /// Amount carries more decimal places than the ledger stores.
    #[error("{field} allows at most 2 decimal places, got {amount}")]
    TooManyDecimalPlaces {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected amount.
        amount: Decimal,
    },

    /// Currency code is not three uppercase letters.
    #[error("Invalid currency code '{0}'")]
    InvalidCurrency(String),

    /// Source and target currencies must be different.
    #[error("Source and target currencies must be different")]
    SameCurrencyExchange,

    /// Category is unknown or belongs to a different period.
    #[error("Category {0} does not belong to the selected budget period")]
    CategoryNotInPeriod(CategoryId),

    /// Period start is after its end.
    #[error("Invalid period range: start {start} is after end {end}")]
    InvalidDateRange {
        /// Requested start date.
        start: NaiveDate,
        /// Requested end date.
        end: NaiveDate,
    },

    /// Manual opening balance must not be negative.
    #[error("Opening balance cannot be negative, got {0}")]
    InvalidOpeningBalance(Decimal),

    /// A required name is blank.
    #[error("{0} cannot be empty")]
    EmptyName(&'static str),

    /// Date arithmetic left the representable calendar.
    #[error("Date out of range when shifting {0}")]
    DateOutOfRange(NaiveDate),

    // ========== Scope Errors ==========
    /// Period is missing or outside the caller's workspace.
    #[error("Budget period {0} not found")]
    PeriodNotFound(BudgetPeriodId),

    // ========== Planned Transaction Errors ==========
    /// Planned transaction has already been executed.
    #[error("Planned transaction already executed")]
    AlreadyExecuted,

    /// Cancelled planned transactions cannot be executed.
    #[error("Cancelled planned transaction cannot be executed")]
    PlannedCancelled,

    /// Status change is not allowed outside of execution.
    #[error("Cannot change planned transaction status from {from} to {to}")]
    InvalidStatusTransition {
        /// Current status.
        from: &'static str,
        /// Requested status.
        to: &'static str,
    },

    /// No budget period covers the given date.
    #[error("No budget period found for date {0}")]
    NoPeriodForDate(NaiveDate),

    // ========== Invariant Errors ==========
    /// Balance arithmetic overflowed or the reconciliation formula does not hold.
    #[error("Ledger invariant violated: {0}")]
    InvariantViolation(String),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NonPositiveAmount { .. } => "NON_POSITIVE_AMOUNT",
            Self::TooManyDecimalPlaces { .. } => "TOO_MANY_DECIMAL_PLACES",
            Self::InvalidCurrency(_) => "INVALID_CURRENCY",
            Self::SameCurrencyExchange => "SAME_CURRENCY_EXCHANGE",
            Self::CategoryNotInPeriod(_) => "CATEGORY_NOT_IN_PERIOD",
            Self::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
            Self::InvalidOpeningBalance(_) => "INVALID_OPENING_BALANCE",
            Self::EmptyName(_) => "EMPTY_NAME",
            Self::DateOutOfRange(_) => "DATE_OUT_OF_RANGE",
            Self::PeriodNotFound(_) => "NOT_FOUND",
            Self::AlreadyExecuted => "ALREADY_EXECUTED",
            Self::PlannedCancelled => "PLANNED_CANCELLED",
            Self::InvalidStatusTransition { .. } => "INVALID_STATUS_TRANSITION",
            Self::NoPeriodForDate(_) => "NO_PERIOD_FOR_DATE",
            Self::InvariantViolation(_) => "INVARIANT_VIOLATION",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation errors
            Self::NonPositiveAmount { .. }
            | Self::TooManyDecimalPlaces { .. }
            | Self::InvalidCurrency(_)
            | Self::SameCurrencyExchange
            | Self::CategoryNotInPeriod(_)
            | Self::InvalidDateRange { .. }
            | Self::InvalidOpeningBalance(_)
            | Self::EmptyName(_)
            | Self::DateOutOfRange(_)
            | Self::NoPeriodForDate(_) => 400,

            // 404 Not Found - never reveal other workspaces
            Self::PeriodNotFound(_) => 404,

            // 422 Unprocessable - lifecycle rules
            Self::AlreadyExecuted
            | Self::PlannedCancelled
            | Self::InvalidStatusTransition { .. } => 422,

            // 500 Internal Server Error
            Self::InvariantViolation(_) => 500,
        }
    }

    /// Returns true if this error points at corrupted ledger data.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::InvariantViolation(_))
    }
}
