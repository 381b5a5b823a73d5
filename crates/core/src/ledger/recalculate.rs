//! Full rebuild of a period balance from its underlying entries.
//!
//! The database layer gathers sums and the predecessor's closing balance; this module
//! decides what the row should look like. Rebuilding is a pure function of its inputs,
//! so running it twice over unchanged data yields the same row.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::balance::BalanceTotals;
use super::error::LedgerError;

/// Freshly aggregated sums for one (period, currency).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PeriodAggregates {
    /// Sum of income transactions.
    pub total_income: Decimal,
    /// Sum of expense transactions.
    pub total_expenses: Decimal,
    /// Sum of `to_amount` for exchanges into this currency.
    pub exchanges_in: Decimal,
    /// Sum of `from_amount` for exchanges out of this currency.
    pub exchanges_out: Decimal,
}

/// Stored opening balance and whether a user set it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OpeningBalance {
    /// Current stored value.
    pub amount: Decimal,
    /// Set by a manual opening-balance update.
    pub is_manual: bool,
}

/// Result of comparing a stored row with a fresh aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceDrift {
    /// Stored accumulators equal the fresh sums.
    pub accumulators_match: bool,
    /// Stored closing balance satisfies the reconciliation formula.
    pub invariant_holds: bool,
}

impl BalanceDrift {
    /// True when the row needs a recalculation.
    #[must_use]
    pub const fn has_drift(&self) -> bool {
        !(self.accumulators_match && self.invariant_holds)
    }
}

/// Stateless rebuild rules.
pub struct Recalculator;

impl Recalculator {
    /// Chooses the opening balance for a rebuild.
    ///
    /// A manually set value, or any non-zero stored value, is kept. Otherwise the
    /// predecessor's closing balance carries over (zero when there is none).
    #[must_use]
    pub fn opening_balance(stored: OpeningBalance, carried_over: Option<Decimal>) -> Decimal {
        if stored.is_manual || !stored.amount.is_zero() {
            stored.amount
        } else {
            carried_over.unwrap_or(Decimal::ZERO)
        }
    }

    /// Builds the full row: chosen opening, overwritten accumulators, derived closing.
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolation` if the closing balance overflows.
    pub fn rebuild(
        stored: OpeningBalance,
        carried_over: Option<Decimal>,
        aggregates: PeriodAggregates,
    ) -> Result<BalanceTotals, LedgerError> {
        let mut totals = BalanceTotals {
            opening_balance: Self::opening_balance(stored, carried_over),
            total_income: aggregates.total_income,
            total_expenses: aggregates.total_expenses,
            exchanges_in: aggregates.exchanges_in,
            exchanges_out: aggregates.exchanges_out,
            closing_balance: Decimal::ZERO,
        };
        totals.recompute_closing()?;
        Ok(totals)
    }

    /// Compares a stored row against fresh sums without changing anything.
    #[must_use]
    pub fn drift(stored: &BalanceTotals, fresh: &PeriodAggregates) -> BalanceDrift {
        BalanceDrift {
            accumulators_match: stored.total_income == fresh.total_income
                && stored.total_expenses == fresh.total_expenses
                && stored.exchanges_in == fresh.exchanges_in
                && stored.exchanges_out == fresh.exchanges_out,
            invariant_holds: stored.verify_invariant().is_ok(),
        }
    }
}
