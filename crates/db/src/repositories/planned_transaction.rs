//! Planned transaction repository.
//!
//! Planned rows never touch balances on their own. Executing one creates an expense
//! transaction in the period covering the payment date and posts it.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use kasa_core::ledger::{
    CategoryScope, EntryScope, LedgerError, PostingPlan, ProposedPlanned, TransactionType,
    ValidatedPlanned, ValidatedTransaction, parse_currency, validate_planned,
};
use kasa_core::planned::{PlannedStatus, execution_leg};
use kasa_shared::types::{BudgetPeriodId, CategoryId, PlannedTransactionId, WorkspaceId};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::info;

use super::error::LedgerRepoError;
use super::ledger::apply_plan;
use super::scope::{entry_scope, find_category, find_period, period_for_date, span};
use super::transaction::insert_row as insert_transaction;
use crate::entities::sea_orm_active_enums::PlannedStatus as DbPlannedStatus;
use crate::entities::{categories, planned_transactions, transactions};

/// Input for creating or replacing a planned transaction.
#[derive(Debug, Clone)]
pub struct PlannedInput {
    /// Explicit period; resolved from `planned_date` when absent.
    pub budget_period_id: Option<BudgetPeriodId>,
    /// Display name.
    pub name: String,
    /// Positive amount.
    pub amount: Decimal,
    /// Currency code.
    pub currency: String,
    /// Expense category.
    pub category_id: Option<CategoryId>,
    /// Date the payment is planned for.
    pub planned_date: NaiveDate,
    /// Requested status; `pending` when absent.
    pub status: Option<PlannedStatus>,
}

impl PlannedInput {
    fn proposed(&self) -> ProposedPlanned {
        ProposedPlanned {
            period_id: self.budget_period_id,
            name: self.name.clone(),
            amount: self.amount,
            currency: self.currency.clone(),
            category_id: self.category_id,
            planned_date: self.planned_date,
        }
    }
}

/// One row of a planned transaction import.
#[derive(Debug, Clone)]
pub struct ImportPlannedRow {
    /// Display name.
    pub name: String,
    /// Positive amount.
    pub amount: Decimal,
    /// Currency code.
    pub currency: String,
    /// Category name within the target period; unknown names are ignored.
    pub category_name: Option<String>,
    /// Date the payment is planned for.
    pub planned_date: NaiveDate,
}

/// Filter for listing planned transactions.
#[derive(Debug, Clone, Default)]
pub struct PlannedFilter {
    /// Only this period.
    pub budget_period_id: Option<BudgetPeriodId>,
    /// Only this status.
    pub status: Option<PlannedStatus>,
}

/// Outcome of executing a planned transaction.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutedPlanned {
    /// The planned row, now `done`.
    pub planned: planned_transactions::Model,
    /// The expense transaction it produced.
    pub transaction: transactions::Model,
}

/// Planned transaction repository.
#[derive(Debug, Clone)]
pub struct PlannedTransactionRepository {
    db: DatabaseConnection,
}

async fn insert_row(
    txn: &DatabaseTransaction,
    workspace_id: WorkspaceId,
    name: String,
    planned_date: NaiveDate,
    status: PlannedStatus,
    entry: &ValidatedPlanned,
) -> Result<planned_transactions::Model, LedgerRepoError> {
    let now = Utc::now().into();
    Ok(planned_transactions::ActiveModel {
        workspace_id: Set(workspace_id.into_inner()),
        budget_period_id: Set(entry.period_id.map(BudgetPeriodId::into_inner)),
        name: Set(name),
        amount: Set(entry.amount),
        currency: Set(entry.currency.to_string()),
        category_id: Set(entry.category_id.map(CategoryId::into_inner)),
        planned_date: Set(planned_date),
        payment_date: Set(None),
        status: Set(status.into()),
        transaction_id: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(txn)
    .await?)
}

impl PlannedTransactionRepository {
    /// Creates a new planned transaction repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn lock(
        txn: &DatabaseTransaction,
        workspace_id: WorkspaceId,
        id: PlannedTransactionId,
    ) -> Result<planned_transactions::Model, LedgerRepoError> {
        planned_transactions::Entity::find_by_id(id.into_inner())
            .filter(planned_transactions::Column::WorkspaceId.eq(workspace_id.into_inner()))
            .lock_exclusive()
            .one(txn)
            .await?
            .ok_or_else(|| LedgerRepoError::not_found("Planned transaction", id))
    }

    /// Creates a planned transaction in `pending` or `cancelled` status.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStatusTransition` for `done`, or a validation error.
    pub async fn create(
        &self,
        workspace_id: WorkspaceId,
        input: PlannedInput,
    ) -> Result<planned_transactions::Model, LedgerRepoError> {
        let status = input.status.unwrap_or(PlannedStatus::Pending);
        PlannedStatus::Pending.ensure_editable_to(status)?;

        let txn = self.db.begin().await?;
        let scope = entry_scope(
            &txn,
            workspace_id,
            input.budget_period_id,
            input.planned_date,
            input.category_id,
        )
        .await?;
        let entry = validate_planned(&input.proposed(), &scope)?;
        let row = insert_row(&txn, workspace_id, input.name, input.planned_date, status, &entry)
            .await?;
        txn.commit().await?;

        info!(planned_id = row.id, period_id = ?row.budget_period_id, "Planned transaction created");
        Ok(row)
    }

    /// Gets a planned transaction of the workspace.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if missing or in another workspace.
    pub async fn get(
        &self,
        workspace_id: WorkspaceId,
        id: PlannedTransactionId,
    ) -> Result<planned_transactions::Model, LedgerRepoError> {
        planned_transactions::Entity::find_by_id(id.into_inner())
            .filter(planned_transactions::Column::WorkspaceId.eq(workspace_id.into_inner()))
            .one(&self.db)
            .await?
            .ok_or_else(|| LedgerRepoError::not_found("Planned transaction", id))
    }

    /// Lists planned transactions by planned date.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn list(
        &self,
        workspace_id: WorkspaceId,
        filter: PlannedFilter,
    ) -> Result<Vec<planned_transactions::Model>, LedgerRepoError> {
        let mut query = planned_transactions::Entity::find()
            .filter(planned_transactions::Column::WorkspaceId.eq(workspace_id.into_inner()));
        if let Some(period_id) = filter.budget_period_id {
            query = query
                .filter(planned_transactions::Column::BudgetPeriodId.eq(period_id.into_inner()));
        }
        if let Some(status) = filter.status {
            query = query.filter(planned_transactions::Column::Status.eq(DbPlannedStatus::from(status)));
        }
        Ok(query
            .order_by_asc(planned_transactions::Column::PlannedDate)
            .order_by_asc(planned_transactions::Column::Id)
            .all(&self.db)
            .await?)
    }

    /// Replaces a planned transaction. Status may only move between `pending` and
    /// `cancelled`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `InvalidStatusTransition`, or a validation error.
    pub async fn update(
        &self,
        workspace_id: WorkspaceId,
        id: PlannedTransactionId,
        input: PlannedInput,
    ) -> Result<planned_transactions::Model, LedgerRepoError> {
        let txn = self.db.begin().await?;
        let stored = Self::lock(&txn, workspace_id, id).await?;
        let current = PlannedStatus::from(stored.status);
        let status = input.status.unwrap_or(current);
        current.ensure_editable_to(status)?;

        let scope = entry_scope(
            &txn,
            workspace_id,
            input.budget_period_id,
            input.planned_date,
            input.category_id,
        )
        .await?;
        let entry = validate_planned(&input.proposed(), &scope)?;

        let mut active: planned_transactions::ActiveModel = stored.into();
        active.budget_period_id = Set(entry.period_id.map(BudgetPeriodId::into_inner));
        active.name = Set(input.name);
        active.amount = Set(entry.amount);
        active.currency = Set(entry.currency.to_string());
        active.category_id = Set(entry.category_id.map(CategoryId::into_inner));
        active.planned_date = Set(input.planned_date);
        active.status = Set(status.into());
        active.updated_at = Set(Utc::now().into());
        let row = active.update(&txn).await?;
        txn.commit().await?;

        info!(planned_id = row.id, status = %status, "Planned transaction updated");
        Ok(row)
    }

    /// Deletes a planned transaction. An executed transaction it produced stays.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or a database error.
    pub async fn delete(
        &self,
        workspace_id: WorkspaceId,
        id: PlannedTransactionId,
    ) -> Result<(), LedgerRepoError> {
        let planned = self.get(workspace_id, id).await?;
        planned_transactions::Entity::delete_by_id(planned.id)
            .exec(&self.db)
            .await?;
        info!(planned_id = planned.id, "Planned transaction deleted");
        Ok(())
    }

    /// Executes a pending planned transaction into an expense.
    ///
    /// The period is the one covering `payment_date` (today when absent). The
    /// category carries over only if it belongs to that period.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyExecuted`, `PlannedCancelled`, `NoPeriodForDate`, or `NotFound`.
    pub async fn execute(
        &self,
        workspace_id: WorkspaceId,
        id: PlannedTransactionId,
        payment_date: Option<NaiveDate>,
    ) -> Result<ExecutedPlanned, LedgerRepoError> {
        let txn = self.db.begin().await?;
        let planned = Self::lock(&txn, workspace_id, id).await?;
        PlannedStatus::from(planned.status).ensure_executable()?;

        let payment_date = payment_date.unwrap_or_else(|| Utc::now().date_naive());
        let period_id = period_for_date(&txn, workspace_id, payment_date)
            .await?
            .ok_or(LedgerError::NoPeriodForDate(payment_date))?;

        let category_id = match planned.category_id {
            Some(raw) => find_category(&txn, workspace_id, CategoryId::new(raw))
                .await?
                .filter(|c| c.period_id == period_id)
                .map(|c| c.id),
            None => None,
        };

        let leg = execution_leg(period_id, parse_currency(planned.currency.trim())?, planned.amount);
        let entry = ValidatedTransaction {
            period_id: leg.period_id,
            category_id,
            currency: leg.currency,
            amount: leg.amount,
            transaction_type: TransactionType::Expense,
        };
        let transaction =
            insert_transaction(&txn, workspace_id, payment_date, planned.name.clone(), &entry)
                .await?;
        apply_plan(&txn, &PostingPlan::create(&leg)).await?;

        let mut active: planned_transactions::ActiveModel = planned.into();
        active.status = Set(DbPlannedStatus::Done);
        active.payment_date = Set(Some(payment_date));
        active.transaction_id = Set(Some(transaction.id));
        active.updated_at = Set(Utc::now().into());
        let planned = active.update(&txn).await?;
        txn.commit().await?;

        info!(
            planned_id = planned.id,
            transaction_id = transaction.id,
            period_id = %period_id,
            amount = %transaction.amount,
            "Planned transaction executed"
        );
        Ok(ExecutedPlanned {
            planned,
            transaction,
        })
    }

    /// Imports pending planned transactions into one period. All or nothing.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a period outside the workspace, or the first row error.
    pub async fn import(
        &self,
        workspace_id: WorkspaceId,
        period_id: BudgetPeriodId,
        rows: Vec<ImportPlannedRow>,
    ) -> Result<Vec<planned_transactions::Model>, LedgerRepoError> {
        let txn = self.db.begin().await?;
        let period = find_period(&txn, workspace_id, period_id).await?;
        let by_name: HashMap<String, i64> = categories::Entity::find()
            .filter(categories::Column::BudgetPeriodId.eq(period.id))
            .all(&txn)
            .await?
            .into_iter()
            .map(|c| (c.name, c.id))
            .collect();
        let scope = EntryScope {
            periods: vec![span(&period)],
            categories: by_name
                .values()
                .map(|&id| CategoryScope {
                    id: CategoryId::new(id),
                    period_id,
                })
                .collect(),
        };

        let mut imported = Vec::with_capacity(rows.len());
        for row in rows {
            let proposed = ProposedPlanned {
                period_id: Some(period_id),
                name: row.name,
                amount: row.amount,
                currency: row.currency,
                category_id: row
                    .category_name
                    .as_deref()
                    .and_then(|name| by_name.get(name.trim()))
                    .map(|&id| CategoryId::new(id)),
                planned_date: row.planned_date,
            };
            let entry = validate_planned(&proposed, &scope)?;
            imported.push(
                insert_row(
                    &txn,
                    workspace_id,
                    proposed.name,
                    row.planned_date,
                    PlannedStatus::Pending,
                    &entry,
                )
                .await?,
            );
        }
        txn.commit().await?;

        info!(period_id = %period_id, count = imported.len(), "Planned transactions imported");
        Ok(imported)
    }
}
