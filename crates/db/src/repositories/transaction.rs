//! Transaction repository.
//!
//! Every mutation validates the entry against the caller's workspace, writes the row,
//! and posts the balance deltas in the same database transaction. Updates and deletes
//! lock the stored row first and revert its stored values, never the request body.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use kasa_core::ledger::{
    CategoryScope, EntryScope, PostingPlan, ProposedTransaction, TransactionLeg,
    TransactionType as LedgerTransactionType, ValidatedTransaction, parse_currency,
    validate_transaction,
};
use kasa_shared::types::{BudgetPeriodId, CategoryId, TransactionId, WorkspaceId};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{info, warn};

use super::error::LedgerRepoError;
use super::ledger::apply_plan;
use super::scope::{entry_scope, find_period, span};
use crate::entities::{categories, transactions};

/// Input for creating or replacing a transaction.
#[derive(Debug, Clone)]
pub struct TransactionInput {
    /// Explicit period; resolved from `date` when absent.
    pub budget_period_id: Option<BudgetPeriodId>,
    /// Booking date.
    pub date: NaiveDate,
    /// Free-form description.
    pub description: String,
    /// Expense category; dropped for income.
    pub category_id: Option<CategoryId>,
    /// Positive amount.
    pub amount: Decimal,
    /// Currency code.
    pub currency: String,
    /// Income or expense.
    pub transaction_type: LedgerTransactionType,
}

impl TransactionInput {
    fn proposed(&self) -> ProposedTransaction {
        ProposedTransaction {
            period_id: self.budget_period_id,
            date: self.date,
            category_id: self.category_id,
            amount: self.amount,
            currency: self.currency.clone(),
            transaction_type: self.transaction_type,
        }
    }
}

/// One row of a transaction import.
#[derive(Debug, Clone)]
pub struct ImportTransactionRow {
    /// Booking date.
    pub date: NaiveDate,
    /// Free-form description.
    pub description: String,
    /// Category name within the target period; unknown names are ignored.
    pub category_name: Option<String>,
    /// Positive amount.
    pub amount: Decimal,
    /// Currency code.
    pub currency: String,
    /// Income or expense.
    pub transaction_type: LedgerTransactionType,
}

/// Filter for listing transactions.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    /// Only this period.
    pub budget_period_id: Option<BudgetPeriodId>,
    /// Only this type.
    pub transaction_type: Option<LedgerTransactionType>,
    /// Only this category.
    pub category_id: Option<CategoryId>,
    /// On or after this date.
    pub date_from: Option<NaiveDate>,
    /// On or before this date.
    pub date_to: Option<NaiveDate>,
}

/// Transaction repository.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    db: DatabaseConnection,
}

/// Ledger view of a stored transaction.
pub(crate) fn stored_leg(row: &transactions::Model) -> Result<TransactionLeg, LedgerRepoError> {
    Ok(TransactionLeg {
        period_id: row.budget_period_id.map(BudgetPeriodId::new),
        currency: parse_currency(row.currency.trim())?,
        transaction_type: row.transaction_type.into(),
        amount: row.amount,
    })
}

/// Inserts a validated transaction row.
pub(crate) async fn insert_row(
    txn: &DatabaseTransaction,
    workspace_id: WorkspaceId,
    date: NaiveDate,
    description: String,
    entry: &ValidatedTransaction,
) -> Result<transactions::Model, LedgerRepoError> {
    let now = Utc::now().into();
    let row = transactions::ActiveModel {
        workspace_id: Set(workspace_id.into_inner()),
        budget_period_id: Set(entry.period_id.map(BudgetPeriodId::into_inner)),
        date: Set(date),
        description: Set(description),
        category_id: Set(entry.category_id.map(CategoryId::into_inner)),
        amount: Set(entry.amount),
        currency: Set(entry.currency.to_string()),
        transaction_type: Set(entry.transaction_type.into()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(txn)
    .await?;

    if row.budget_period_id.is_none() {
        warn!(transaction_id = row.id, date = %row.date, "Transaction stored without a budget period");
    }
    Ok(row)
}

impl TransactionRepository {
    /// Creates a new transaction repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn lock(
        txn: &DatabaseTransaction,
        workspace_id: WorkspaceId,
        id: TransactionId,
    ) -> Result<transactions::Model, LedgerRepoError> {
        transactions::Entity::find_by_id(id.into_inner())
            .filter(transactions::Column::WorkspaceId.eq(workspace_id.into_inner()))
            .lock_exclusive()
            .one(txn)
            .await?
            .ok_or_else(|| LedgerRepoError::not_found("Transaction", id))
    }

    /// Creates a transaction and posts it to its period balance.
    ///
    /// # Errors
    ///
    /// Returns a validation error, `NotFound` for a foreign period, or a database error.
    pub async fn create(
        &self,
        workspace_id: WorkspaceId,
        input: TransactionInput,
    ) -> Result<transactions::Model, LedgerRepoError> {
        let txn = self.db.begin().await?;
        let scope = entry_scope(
            &txn,
            workspace_id,
            input.budget_period_id,
            input.date,
            input.category_id,
        )
        .await?;
        let entry = validate_transaction(&input.proposed(), &scope)?;

        let row = insert_row(&txn, workspace_id, input.date, input.description, &entry).await?;
        apply_plan(&txn, &PostingPlan::create(&entry.leg())).await?;
        txn.commit().await?;

        info!(
            transaction_id = row.id,
            period_id = ?row.budget_period_id,
            currency = %row.currency,
            amount = %row.amount,
            "Transaction created"
        );
        Ok(row)
    }

    /// Gets a transaction of the workspace.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if missing or in another workspace.
    pub async fn get(
        &self,
        workspace_id: WorkspaceId,
        id: TransactionId,
    ) -> Result<transactions::Model, LedgerRepoError> {
        transactions::Entity::find_by_id(id.into_inner())
            .filter(transactions::Column::WorkspaceId.eq(workspace_id.into_inner()))
            .one(&self.db)
            .await?
            .ok_or_else(|| LedgerRepoError::not_found("Transaction", id))
    }

    /// Lists transactions, newest first.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn list(
        &self,
        workspace_id: WorkspaceId,
        filter: TransactionFilter,
    ) -> Result<Vec<transactions::Model>, LedgerRepoError> {
        let mut query = transactions::Entity::find()
            .filter(transactions::Column::WorkspaceId.eq(workspace_id.into_inner()));
        if let Some(period_id) = filter.budget_period_id {
            query = query.filter(transactions::Column::BudgetPeriodId.eq(period_id.into_inner()));
        }
        if let Some(kind) = filter.transaction_type {
            query = query.filter(
                transactions::Column::TransactionType
                    .eq(crate::entities::sea_orm_active_enums::TransactionType::from(kind)),
            );
        }
        if let Some(category_id) = filter.category_id {
            query = query.filter(transactions::Column::CategoryId.eq(category_id.into_inner()));
        }
        if let Some(from) = filter.date_from {
            query = query.filter(transactions::Column::Date.gte(from));
        }
        if let Some(to) = filter.date_to {
            query = query.filter(transactions::Column::Date.lte(to));
        }
        Ok(query
            .order_by_desc(transactions::Column::Date)
            .order_by_desc(transactions::Column::Id)
            .all(&self.db)
            .await?)
    }

    /// Replaces a transaction, reverting its stored posting and applying the new one.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, a validation error, or a database error.
    pub async fn update(
        &self,
        workspace_id: WorkspaceId,
        id: TransactionId,
        input: TransactionInput,
    ) -> Result<transactions::Model, LedgerRepoError> {
        let txn = self.db.begin().await?;
        let stored = Self::lock(&txn, workspace_id, id).await?;
        let scope = entry_scope(
            &txn,
            workspace_id,
            input.budget_period_id,
            input.date,
            input.category_id,
        )
        .await?;
        let entry = validate_transaction(&input.proposed(), &scope)?;
        let plan = PostingPlan::update(&stored_leg(&stored)?, &entry.leg());

        let mut active: transactions::ActiveModel = stored.into();
        active.budget_period_id = Set(entry.period_id.map(BudgetPeriodId::into_inner));
        active.date = Set(input.date);
        active.description = Set(input.description);
        active.category_id = Set(entry.category_id.map(CategoryId::into_inner));
        active.amount = Set(entry.amount);
        active.currency = Set(entry.currency.to_string());
        active.transaction_type = Set(entry.transaction_type.into());
        active.updated_at = Set(Utc::now().into());
        let row = active.update(&txn).await?;

        apply_plan(&txn, &plan).await?;
        txn.commit().await?;

        info!(transaction_id = row.id, period_id = ?row.budget_period_id, "Transaction updated");
        Ok(row)
    }

    /// Deletes a transaction and reverts its posting.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or a database error.
    pub async fn delete(
        &self,
        workspace_id: WorkspaceId,
        id: TransactionId,
    ) -> Result<(), LedgerRepoError> {
        let txn = self.db.begin().await?;
        let stored = Self::lock(&txn, workspace_id, id).await?;
        let plan = PostingPlan::delete(&stored_leg(&stored)?);

        transactions::Entity::delete_by_id(stored.id)
            .exec(&txn)
            .await?;
        apply_plan(&txn, &plan).await?;
        txn.commit().await?;

        info!(transaction_id = stored.id, "Transaction deleted");
        Ok(())
    }

    /// Imports rows into one period. Any invalid row aborts the whole import.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a period outside the workspace, or the first row error.
    pub async fn import(
        &self,
        workspace_id: WorkspaceId,
        period_id: BudgetPeriodId,
        rows: Vec<ImportTransactionRow>,
    ) -> Result<Vec<transactions::Model>, LedgerRepoError> {
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

        let mut plan = PostingPlan::default();
        let mut imported = Vec::with_capacity(rows.len());
        for row in rows {
            let proposed = ProposedTransaction {
                period_id: Some(period_id),
                date: row.date,
                category_id: row
                    .category_name
                    .as_deref()
                    .and_then(|name| by_name.get(name.trim()))
                    .map(|&id| CategoryId::new(id)),
                amount: row.amount,
                currency: row.currency,
                transaction_type: row.transaction_type,
            };
            let entry = validate_transaction(&proposed, &scope)?;
            imported.push(insert_row(&txn, workspace_id, row.date, row.description, &entry).await?);
            plan.extend(PostingPlan::create(&entry.leg()));
        }
        apply_plan(&txn, &plan).await?;
        txn.commit().await?;

        info!(period_id = %period_id, count = imported.len(), "Transactions imported");
        Ok(imported)
    }
}
