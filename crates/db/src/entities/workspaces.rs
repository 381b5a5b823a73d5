//! `SeaORM` Entity for workspaces table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "workspaces")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::budget_accounts::Entity")]
    BudgetAccounts,
}

impl Related<super::budget_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BudgetAccounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
