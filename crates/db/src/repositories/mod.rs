//! Repository layer for database operations.
//!
//! Ledger mutations run inside one database transaction each: the entry row is
//! written and every affected period balance is locked and updated before commit.

pub mod budget_period;
pub mod currency_exchange;
pub mod error;
mod ledger;
pub mod period_balance;
pub mod planned_transaction;
pub mod report;
mod scope;
pub mod transaction;

pub use budget_period::{
    BudgetPeriodFilter, BudgetPeriodRepository, CopyBudgetPeriod, CreateBudgetPeriod,
    UpdateBudgetPeriod,
};
pub use currency_exchange::{CurrencyExchangeRepository, ExchangeFilter, ExchangeInput};
pub use error::LedgerRepoError;
pub use period_balance::{BalanceCheck, BalanceFilter, PeriodBalanceRepository};
pub use planned_transaction::{
    ExecutedPlanned, ImportPlannedRow, PlannedFilter, PlannedInput, PlannedTransactionRepository,
};
pub use report::{
    BudgetLine, BudgetSummary, CurrencyBalances, CurrencySummary, CurrentBalance,
    ReportRepository, SummaryPeriod,
};
pub use transaction::{
    ImportTransactionRow, TransactionFilter, TransactionInput, TransactionRepository,
};
