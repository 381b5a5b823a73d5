//! Period balance arithmetic.
//!
//! A period balance reconciles one currency inside one budget period:
//!
//! `closing = opening + income - expenses + exchanges_in - exchanges_out`
//!
//! Every mutation goes through checked decimal arithmetic so an overflow surfaces as
//! `LedgerError::InvariantViolation` instead of a panic.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::LedgerError;

/// Accumulator columns a delta can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceField {
    /// `total_income`
    Income,
    /// `total_expenses`
    Expense,
    /// `exchanges_in`
    ExchangeIn,
    /// `exchanges_out`
    ExchangeOut,
}

impl BalanceField {
    /// Column name, used in log fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Income => "total_income",
            Self::Expense => "total_expenses",
            Self::ExchangeIn => "exchanges_in",
            Self::ExchangeOut => "exchanges_out",
        }
    }
}

/// A signed amount to add into one accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceDelta {
    /// Target accumulator.
    pub field: BalanceField,
    /// Signed amount; negative values revert an earlier delta.
    pub amount: Decimal,
}

impl BalanceDelta {
    /// Creates a delta.
    #[must_use]
    pub const fn new(field: BalanceField, amount: Decimal) -> Self {
        Self { field, amount }
    }

    /// Returns the delta that undoes this one.
    #[must_use]
    pub fn inverse(self) -> Self {
        Self {
            field: self.field,
            amount: -self.amount,
        }
    }
}

/// The monetary columns of a period balance row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BalanceTotals {
    /// Balance carried into the period.
    pub opening_balance: Decimal,
    /// Sum of income transactions.
    pub total_income: Decimal,
    /// Sum of expense transactions.
    pub total_expenses: Decimal,
    /// Sum of exchange legs received in this currency.
    pub exchanges_in: Decimal,
    /// Sum of exchange legs paid out of this currency.
    pub exchanges_out: Decimal,
    /// Derived closing balance.
    pub closing_balance: Decimal,
}

impl BalanceTotals {
    /// All columns at zero.
    #[must_use]
    pub const fn zero() -> Self {
        Self {
            opening_balance: Decimal::ZERO,
            total_income: Decimal::ZERO,
            total_expenses: Decimal::ZERO,
            exchanges_in: Decimal::ZERO,
            exchanges_out: Decimal::ZERO,
            closing_balance: Decimal::ZERO,
        }
    }

    /// Computes the closing balance from the other five columns.
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolation` if any intermediate step overflows.
    pub fn expected_closing(&self) -> Result<Decimal, LedgerError> {
        self.opening_balance
            .checked_add(self.total_income)
            .and_then(|v| v.checked_sub(self.total_expenses))
            .and_then(|v| v.checked_add(self.exchanges_in))
            .and_then(|v| v.checked_sub(self.exchanges_out))
            .ok_or_else(|| {
                LedgerError::InvariantViolation(format!(
                    "closing balance overflow (opening {}, income {}, expenses {}, in {}, out {})",
                    self.opening_balance,
                    self.total_income,
                    self.total_expenses,
                    self.exchanges_in,
                    self.exchanges_out
                ))
            })
    }

    /// Overwrites `closing_balance` from the formula.
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolation` on overflow; the row is left unchanged.
    pub fn recompute_closing(&mut self) -> Result<(), LedgerError> {
        self.closing_balance = self.expected_closing()?;
        Ok(())
    }

    /// Adds a delta into its accumulator and recomputes the closing balance.
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolation` on overflow; the row is left unchanged.
    pub fn apply(&mut self, delta: BalanceDelta) -> Result<(), LedgerError> {
        let mut next = *self;
        let slot = match delta.field {
            BalanceField::Income => &mut next.total_income,
            BalanceField::Expense => &mut next.total_expenses,
            BalanceField::ExchangeIn => &mut next.exchanges_in,
            BalanceField::ExchangeOut => &mut next.exchanges_out,
        };
        *slot = slot.checked_add(delta.amount).ok_or_else(|| {
            LedgerError::InvariantViolation(format!(
                "{} overflow adding {}",
                delta.field.as_str(),
                delta.amount
            ))
        })?;
        next.recompute_closing()?;
        *self = next;
        Ok(())
    }

    /// Replaces the opening balance and recomputes the closing balance.
    ///
    /// Accumulators are left untouched.
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolation` on overflow; the row is left unchanged.
    pub fn set_opening(&mut self, opening_balance: Decimal) -> Result<(), LedgerError> {
        let mut next = *self;
        next.opening_balance = opening_balance;
        next.recompute_closing()?;
        *self = next;
        Ok(())
    }

    /// Checks the stored closing balance against the formula.
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolation` describing the mismatch.
    pub fn verify_invariant(&self) -> Result<(), LedgerError> {
        let expected = self.expected_closing()?;
        if expected == self.closing_balance {
            Ok(())
        } else {
            Err(LedgerError::InvariantViolation(format!(
                "closing balance {} does not match expected {}",
                self.closing_balance, expected
            )))
        }
    }
}
