//! Planned transaction lifecycle.
//!
//! `pending` may move to `cancelled` and back through edits. `done` is reached only by
//! execution, which is one-way and creates exactly one expense transaction.

use kasa_shared::types::{BudgetPeriodId, CurrencyCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::{LedgerError, TransactionLeg, TransactionType};

/// Status of a planned transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlannedStatus {
    /// Waiting to be paid.
    Pending,
    /// Executed into a transaction.
    Done,
    /// Will not be paid.
    Cancelled,
}

impl PlannedStatus {
    /// Lowercase name as stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Done => "done",
            Self::Cancelled => "cancelled",
        }
    }

    /// Checks that execution may start from this status.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyExecuted` or `PlannedCancelled`.
    pub const fn ensure_executable(self) -> Result<(), LedgerError> {
        match self {
            Self::Pending => Ok(()),
            Self::Done => Err(LedgerError::AlreadyExecuted),
            Self::Cancelled => Err(LedgerError::PlannedCancelled),
        }
    }

    /// Checks a status change requested through an edit.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStatusTransition` when leaving or entering `done`.
    pub fn ensure_editable_to(self, next: Self) -> Result<(), LedgerError> {
        match (self, next) {
            (from, to) if from == to => Ok(()),
            (Self::Pending, Self::Cancelled) | (Self::Cancelled, Self::Pending) => Ok(()),
            (from, to) => Err(LedgerError::InvalidStatusTransition {
                from: from.as_str(),
                to: to.as_str(),
            }),
        }
    }
}

impl std::fmt::Display for PlannedStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PlannedStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "done" => Ok(Self::Done),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("Unknown planned status: {s}")),
        }
    }
}

/// The expense leg produced by executing a planned transaction.
#[must_use]
pub const fn execution_leg(
    period_id: BudgetPeriodId,
    currency: CurrencyCode,
    amount: Decimal,
) -> TransactionLeg {
    TransactionLeg {
        period_id: Some(period_id),
        currency,
        transaction_type: TransactionType::Expense,
        amount,
    }
}
