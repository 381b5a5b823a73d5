//! Period balance ledger.
//!
//! One ledger row exists per (budget period, currency). This module holds everything
//! about those rows that does not need a database:
//! - Balance arithmetic and the reconciliation formula
//! - Postings produced by transactions and exchanges, and their inverses
//! - The full rebuild used by recalculation
//! - Entry validation against the caller's periods and categories
//! - Exchange rate derivation
//! - Error types for ledger operations

pub mod balance;
pub mod error;
pub mod exchange;
pub mod posting;
pub mod recalculate;
pub mod validation;

#[cfg(test)]
mod posting_props;

pub use balance::{BalanceDelta, BalanceField, BalanceTotals};
pub use error::LedgerError;
pub use exchange::exchange_rate;
pub use posting::{
    BalanceKey, ExchangeLegs, LedgerSource, Posting, PostingPlan, TransactionLeg, TransactionType,
};
pub use recalculate::{BalanceDrift, OpeningBalance, PeriodAggregates, Recalculator};
pub use validation::{
    CategoryScope, EntryScope, ProposedExchange, ProposedPlanned, ProposedTransaction,
    ValidatedExchange, ValidatedPlanned, ValidatedTransaction, check_scale, parse_currency, validate_exchange,
    validate_planned, validate_transaction,
};
