//! `SeaORM` active enums backed by Postgres enum types.

use kasa_core::ledger::TransactionType as CoreTransactionType;
use kasa_core::planned::PlannedStatus as CorePlannedStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// `transaction_type` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "transaction_type")]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money received.
    #[sea_orm(string_value = "income")]
    Income,
    /// Money spent.
    #[sea_orm(string_value = "expense")]
    Expense,
}

impl From<CoreTransactionType> for TransactionType {
    fn from(value: CoreTransactionType) -> Self {
        match value {
            CoreTransactionType::Income => Self::Income,
            CoreTransactionType::Expense => Self::Expense,
        }
    }
}

impl From<TransactionType> for CoreTransactionType {
    fn from(value: TransactionType) -> Self {
        match value {
            TransactionType::Income => Self::Income,
            TransactionType::Expense => Self::Expense,
        }
    }
}

/// `planned_status` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "planned_status")]
#[serde(rename_all = "lowercase")]
pub enum PlannedStatus {
    /// Waiting to be paid.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Executed into a transaction.
    #[sea_orm(string_value = "done")]
    Done,
    /// Will not be paid.
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl From<CorePlannedStatus> for PlannedStatus {
    fn from(value: CorePlannedStatus) -> Self {
        match value {
            CorePlannedStatus::Pending => Self::Pending,
            CorePlannedStatus::Done => Self::Done,
            CorePlannedStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<PlannedStatus> for CorePlannedStatus {
    fn from(value: PlannedStatus) -> Self {
        match value {
            PlannedStatus::Pending => Self::Pending,
            PlannedStatus::Done => Self::Done,
            PlannedStatus::Cancelled => Self::Cancelled,
        }
    }
}
