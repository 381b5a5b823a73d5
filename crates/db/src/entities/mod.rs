//! `SeaORM` entity definitions.
//!
//! Mirrors the schema created by `migration::m20250101_000001_initial`.

pub mod budget_accounts;
pub mod budget_periods;
pub mod budgets;
pub mod categories;
pub mod currency_exchanges;
pub mod period_balances;
pub mod planned_transactions;
pub mod sea_orm_active_enums;
pub mod transactions;
pub mod workspaces;
