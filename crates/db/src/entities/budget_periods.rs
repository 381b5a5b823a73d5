//! `SeaORM` Entity for budget_periods table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "budget_periods")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub budget_account_id: i64,
    pub name: String,
    pub start_date: Date,
    pub end_date: Date,
    pub weeks: Option<i32>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::budget_accounts::Entity",
        from = "Column::BudgetAccountId",
        to = "super::budget_accounts::Column::Id"
    )]
    BudgetAccounts,
    #[sea_orm(has_many = "super::period_balances::Entity")]
    PeriodBalances,
    #[sea_orm(has_many = "super::categories::Entity")]
    Categories,
}

impl Related<super::budget_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BudgetAccounts.def()
    }
}

impl Related<super::period_balances::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PeriodBalances.def()
    }
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
