//! `SeaORM` Entity for period_balances table.
//!
//! One row per (budget period, currency). `closing_balance` always equals
//! `opening_balance + total_income - total_expenses + exchanges_in - exchanges_out`.

use kasa_core::ledger::BalanceTotals;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "period_balances")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub budget_period_id: i64,
    pub currency: String,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub opening_balance: Decimal,
    pub opening_balance_is_manual: bool,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub total_income: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub total_expenses: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub exchanges_in: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub exchanges_out: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub closing_balance: Decimal,
    pub last_calculated_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Monetary columns as ledger arithmetic input.
    #[must_use]
    pub const fn totals(&self) -> BalanceTotals {
        BalanceTotals {
            opening_balance: self.opening_balance,
            total_income: self.total_income,
            total_expenses: self.total_expenses,
            exchanges_in: self.exchanges_in,
            exchanges_out: self.exchanges_out,
            closing_balance: self.closing_balance,
        }
    }
}

impl ActiveModel {
    /// Copies every monetary column from `totals`.
    pub fn set_totals(&mut self, totals: &BalanceTotals) {
        self.opening_balance = sea_orm::Set(totals.opening_balance);
        self.total_income = sea_orm::Set(totals.total_income);
        self.total_expenses = sea_orm::Set(totals.total_expenses);
        self.exchanges_in = sea_orm::Set(totals.exchanges_in);
        self.exchanges_out = sea_orm::Set(totals.exchanges_out);
        self.closing_balance = sea_orm::Set(totals.closing_balance);
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::budget_periods::Entity",
        from = "Column::BudgetPeriodId",
        to = "super::budget_periods::Column::Id"
    )]
    BudgetPeriods,
}

impl Related<super::budget_periods::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BudgetPeriods.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
