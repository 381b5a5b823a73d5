//! Budget period repository: period lifecycle, copying, and date lookup.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use kasa_core::ledger::LedgerError;
use kasa_core::period::{CalendarOffset, validate_range};
use kasa_shared::config::LedgerConfig;
use kasa_shared::types::{BudgetAccountId, BudgetPeriodId, CurrencyCode, WorkspaceId};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tracing::info;

use super::error::LedgerRepoError;
use super::ledger::create_zero_balances;
use super::scope::{find_account, find_period, period_for_date, periods_in};
use crate::entities::sea_orm_active_enums::PlannedStatus;
use crate::entities::{budget_periods, budgets, categories, planned_transactions};

/// Input for creating a budget period.
#[derive(Debug, Clone)]
pub struct CreateBudgetPeriod {
    /// Owning account; must belong to the workspace.
    pub budget_account_id: BudgetAccountId,
    /// Display name.
    pub name: String,
    /// First day.
    pub start_date: NaiveDate,
    /// Last day, inclusive.
    pub end_date: NaiveDate,
    /// Optional week count.
    pub weeks: Option<i32>,
}

/// Input for copying a budget period into a new range.
#[derive(Debug, Clone)]
pub struct CopyBudgetPeriod {
    /// Name of the new period.
    pub name: String,
    /// First day of the new period.
    pub start_date: NaiveDate,
    /// Last day of the new period.
    pub end_date: NaiveDate,
    /// Optional week count.
    pub weeks: Option<i32>,
}

/// Partial update of a budget period.
#[derive(Debug, Clone, Default)]
pub struct UpdateBudgetPeriod {
    /// New name.
    pub name: Option<String>,
    /// New start date.
    pub start_date: Option<NaiveDate>,
    /// New end date.
    pub end_date: Option<NaiveDate>,
    /// New week count.
    pub weeks: Option<i32>,
}

/// Filter for listing periods.
#[derive(Debug, Clone, Default)]
pub struct BudgetPeriodFilter {
    /// Only periods of this account.
    pub budget_account_id: Option<BudgetAccountId>,
}

fn check_name(name: &str) -> Result<(), LedgerError> {
    if name.trim().is_empty() {
        return Err(LedgerError::EmptyName("name"));
    }
    Ok(())
}

/// Budget period repository.
#[derive(Debug, Clone)]
pub struct BudgetPeriodRepository {
    db: DatabaseConnection,
    currencies: Vec<CurrencyCode>,
}

impl BudgetPeriodRepository {
    /// Creates a new budget period repository.
    #[must_use]
    pub fn new(db: DatabaseConnection, ledger: &LedgerConfig) -> Self {
        Self {
            db,
            currencies: ledger.supported_currencies.clone(),
        }
    }

    /// Creates a period with a zero balance per configured currency.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an account outside the workspace, or `InvalidDateRange`.
    pub async fn create(
        &self,
        workspace_id: WorkspaceId,
        input: CreateBudgetPeriod,
    ) -> Result<budget_periods::Model, LedgerRepoError> {
        check_name(&input.name)?;
        validate_range(input.start_date, input.end_date)?;

        let txn = self.db.begin().await?;
        let account = find_account(&txn, workspace_id, input.budget_account_id).await?;
        let now = Utc::now().into();
        let period = budget_periods::ActiveModel {
            budget_account_id: Set(account.id),
            name: Set(input.name),
            start_date: Set(input.start_date),
            end_date: Set(input.end_date),
            weeks: Set(input.weeks),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        create_zero_balances(&txn, BudgetPeriodId::new(period.id), &self.currencies).await?;
        txn.commit().await?;

        info!(period_id = period.id, budget_account_id = account.id, "Budget period created");
        Ok(period)
    }

    /// Copies a period with its categories, budgets, and planned transactions.
    ///
    /// Planned dates move by the calendar distance between the two start dates. Copies
    /// start out `pending` with no payment date and no linked transaction.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a source outside the workspace, or `InvalidDateRange`.
    pub async fn copy(
        &self,
        workspace_id: WorkspaceId,
        source_id: BudgetPeriodId,
        input: CopyBudgetPeriod,
    ) -> Result<budget_periods::Model, LedgerRepoError> {
        check_name(&input.name)?;
        validate_range(input.start_date, input.end_date)?;

        let txn = self.db.begin().await?;
        let source = find_period(&txn, workspace_id, source_id).await?;
        let offset = CalendarOffset::between(source.start_date, input.start_date)?;
        let now = Utc::now().into();

        let copy = budget_periods::ActiveModel {
            budget_account_id: Set(source.budget_account_id),
            name: Set(input.name),
            start_date: Set(input.start_date),
            end_date: Set(input.end_date),
            weeks: Set(input.weeks),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        create_zero_balances(&txn, BudgetPeriodId::new(copy.id), &self.currencies).await?;

        let mut category_map = HashMap::new();
        let source_categories = categories::Entity::find()
            .filter(categories::Column::BudgetPeriodId.eq(source.id))
            .order_by_asc(categories::Column::Id)
            .all(&txn)
            .await?;
        for category in source_categories {
            let copied = categories::ActiveModel {
                budget_period_id: Set(copy.id),
                name: Set(category.name),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            category_map.insert(category.id, copied.id);
        }

        let source_budgets = budgets::Entity::find()
            .filter(budgets::Column::BudgetPeriodId.eq(source.id))
            .all(&txn)
            .await?;
        for budget in source_budgets {
            let Some(&category_id) = category_map.get(&budget.category_id) else {
                continue;
            };
            budgets::ActiveModel {
                budget_period_id: Set(copy.id),
                category_id: Set(category_id),
                currency: Set(budget.currency),
                amount: Set(budget.amount),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }

        let source_planned = planned_transactions::Entity::find()
            .filter(planned_transactions::Column::BudgetPeriodId.eq(source.id))
            .order_by_asc(planned_transactions::Column::Id)
            .all(&txn)
            .await?;
        let planned_count = source_planned.len();
        for planned in source_planned {
            planned_transactions::ActiveModel {
                workspace_id: Set(planned.workspace_id),
                budget_period_id: Set(Some(copy.id)),
                name: Set(planned.name),
                amount: Set(planned.amount),
                currency: Set(planned.currency),
                category_id: Set(planned
                    .category_id
                    .and_then(|id| category_map.get(&id).copied())),
                planned_date: Set(offset.apply(planned.planned_date)?),
                payment_date: Set(None),
                status: Set(PlannedStatus::Pending),
                transaction_id: Set(None),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }
        txn.commit().await?;

        info!(
            source_period_id = source.id,
            period_id = copy.id,
            categories = category_map.len(),
            planned = planned_count,
            "Budget period copied"
        );
        Ok(copy)
    }

    /// Gets a period of the workspace.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if missing or in another workspace.
    pub async fn get(
        &self,
        workspace_id: WorkspaceId,
        id: BudgetPeriodId,
    ) -> Result<budget_periods::Model, LedgerRepoError> {
        find_period(&self.db, workspace_id, id).await
    }

    /// Lists periods, latest start first.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn list(
        &self,
        workspace_id: WorkspaceId,
        filter: BudgetPeriodFilter,
    ) -> Result<Vec<budget_periods::Model>, LedgerRepoError> {
        let mut query = periods_in(workspace_id);
        if let Some(account_id) = filter.budget_account_id {
            query = query.filter(budget_periods::Column::BudgetAccountId.eq(account_id.into_inner()));
        }
        Ok(query
            .order_by_desc(budget_periods::Column::StartDate)
            .order_by_desc(budget_periods::Column::Id)
            .all(&self.db)
            .await?)
    }

    /// The workspace period covering `date`, if any.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn find_for_date(
        &self,
        workspace_id: WorkspaceId,
        date: NaiveDate,
    ) -> Result<Option<budget_periods::Model>, LedgerRepoError> {
        match period_for_date(&self.db, workspace_id, date).await? {
            Some(id) => Ok(Some(find_period(&self.db, workspace_id, id).await?)),
            None => Ok(None),
        }
    }

    /// The period covering `date`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when no period covers the date.
    pub async fn current(
        &self,
        workspace_id: WorkspaceId,
        date: NaiveDate,
    ) -> Result<budget_periods::Model, LedgerRepoError> {
        self.find_for_date(workspace_id, date)
            .await?
            .ok_or_else(|| LedgerRepoError::not_found("Budget period covering", date))
    }

    /// Updates name, dates, or week count. Entries keep their period link.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, or `InvalidDateRange` for the resulting range.
    pub async fn update(
        &self,
        workspace_id: WorkspaceId,
        id: BudgetPeriodId,
        input: UpdateBudgetPeriod,
    ) -> Result<budget_periods::Model, LedgerRepoError> {
        if let Some(name) = input.name.as_deref() {
            check_name(name)?;
        }
        let period = find_period(&self.db, workspace_id, id).await?;
        let start_date = input.start_date.unwrap_or(period.start_date);
        let end_date = input.end_date.unwrap_or(period.end_date);
        validate_range(start_date, end_date)?;

        let mut active: budget_periods::ActiveModel = period.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(weeks) = input.weeks {
            active.weeks = Set(Some(weeks));
        }
        active.start_date = Set(start_date);
        active.end_date = Set(end_date);
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&self.db).await?;

        info!(period_id = updated.id, "Budget period updated");
        Ok(updated)
    }

    /// Deletes a period. Its balances go with it; its entries become unassigned.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if missing or in another workspace.
    pub async fn delete(
        &self,
        workspace_id: WorkspaceId,
        id: BudgetPeriodId,
    ) -> Result<(), LedgerRepoError> {
        let period = find_period(&self.db, workspace_id, id).await?;
        budget_periods::Entity::delete_by_id(period.id)
            .exec(&self.db)
            .await?;
        info!(period_id = period.id, "Budget period deleted");
        Ok(())
    }
}
