//! Workspace scoping.
//!
//! Every lookup joins through `budget_periods -> budget_accounts -> workspaces`, or
//! filters on an entry's own `workspace_id`. Rows outside the caller's workspace are
//! indistinguishable from missing rows.

use chrono::NaiveDate;
use kasa_core::ledger::{CategoryScope, EntryScope};
use kasa_core::period::{PeriodSpan, covering_period, previous_period};
use kasa_shared::types::{BudgetAccountId, BudgetPeriodId, CategoryId, WorkspaceId};
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, JoinType, QueryFilter, QuerySelect, RelationTrait,
    Select,
};

use super::error::LedgerRepoError;
use crate::entities::{budget_accounts, budget_periods, categories};

/// Converts a period row into its date span.
pub(crate) fn span(period: &budget_periods::Model) -> PeriodSpan {
    PeriodSpan {
        id: BudgetPeriodId::new(period.id),
        start_date: period.start_date,
        end_date: period.end_date,
    }
}

/// Periods visible from `workspace_id`.
pub(crate) fn periods_in(workspace_id: WorkspaceId) -> Select<budget_periods::Entity> {
    budget_periods::Entity::find()
        .inner_join(budget_accounts::Entity)
        .filter(budget_accounts::Column::WorkspaceId.eq(workspace_id.into_inner()))
}

/// Fetches a period of the workspace.
pub(crate) async fn find_period<C: ConnectionTrait>(
    conn: &C,
    workspace_id: WorkspaceId,
    period_id: BudgetPeriodId,
) -> Result<budget_periods::Model, LedgerRepoError> {
    periods_in(workspace_id)
        .filter(budget_periods::Column::Id.eq(period_id.into_inner()))
        .one(conn)
        .await?
        .ok_or_else(|| LedgerRepoError::not_found("Budget period", period_id))
}

/// Fetches a budget account of the workspace.
pub(crate) async fn find_account<C: ConnectionTrait>(
    conn: &C,
    workspace_id: WorkspaceId,
    account_id: BudgetAccountId,
) -> Result<budget_accounts::Model, LedgerRepoError> {
    budget_accounts::Entity::find_by_id(account_id.into_inner())
        .filter(budget_accounts::Column::WorkspaceId.eq(workspace_id.into_inner()))
        .one(conn)
        .await?
        .ok_or_else(|| LedgerRepoError::not_found("Budget account", account_id))
}

/// Spans of every workspace period whose range contains `date`.
pub(crate) async fn covering_spans<C: ConnectionTrait>(
    conn: &C,
    workspace_id: WorkspaceId,
    date: NaiveDate,
) -> Result<Vec<PeriodSpan>, LedgerRepoError> {
    let periods = periods_in(workspace_id)
        .filter(budget_periods::Column::StartDate.lte(date))
        .filter(budget_periods::Column::EndDate.gte(date))
        .all(conn)
        .await?;
    Ok(periods.iter().map(span).collect())
}

/// The workspace period covering `date`, if any.
pub(crate) async fn period_for_date<C: ConnectionTrait>(
    conn: &C,
    workspace_id: WorkspaceId,
    date: NaiveDate,
) -> Result<Option<BudgetPeriodId>, LedgerRepoError> {
    let spans = covering_spans(conn, workspace_id, date).await?;
    Ok(covering_period(date, &spans).map(|s| s.id))
}

/// The period immediately before `period` in the same budget account.
pub(crate) async fn previous_span<C: ConnectionTrait>(
    conn: &C,
    period: &budget_periods::Model,
) -> Result<Option<PeriodSpan>, LedgerRepoError> {
    let earlier = budget_periods::Entity::find()
        .filter(budget_periods::Column::BudgetAccountId.eq(period.budget_account_id))
        .filter(budget_periods::Column::EndDate.lt(period.start_date))
        .all(conn)
        .await?;
    let spans: Vec<PeriodSpan> = earlier.iter().map(span).collect();
    Ok(previous_period(&span(period), &spans).copied())
}

/// A category of the workspace with its owning period.
pub(crate) async fn find_category<C: ConnectionTrait>(
    conn: &C,
    workspace_id: WorkspaceId,
    category_id: CategoryId,
) -> Result<Option<CategoryScope>, LedgerRepoError> {
    let category = categories::Entity::find_by_id(category_id.into_inner())
        .inner_join(budget_periods::Entity)
        .join(
            JoinType::InnerJoin,
            budget_periods::Relation::BudgetAccounts.def(),
        )
        .filter(budget_accounts::Column::WorkspaceId.eq(workspace_id.into_inner()))
        .one(conn)
        .await?;
    Ok(category.map(|c| CategoryScope {
        id: CategoryId::new(c.id),
        period_id: BudgetPeriodId::new(c.budget_period_id),
    }))
}

/// Collects what an entry may reference: the explicit period or the periods covering
/// `date`, plus the requested category when it is visible to the workspace.
pub(crate) async fn entry_scope<C: ConnectionTrait>(
    conn: &C,
    workspace_id: WorkspaceId,
    explicit_period: Option<BudgetPeriodId>,
    date: NaiveDate,
    category_id: Option<CategoryId>,
) -> Result<EntryScope, LedgerRepoError> {
    let periods = match explicit_period {
        Some(id) => match find_period(conn, workspace_id, id).await {
            Ok(period) => vec![span(&period)],
            Err(LedgerRepoError::NotFound(_)) => Vec::new(),
            Err(e) => return Err(e),
        },
        None => covering_spans(conn, workspace_id, date).await?,
    };
    let categories = match category_id {
        Some(id) => find_category(conn, workspace_id, id).await?.into_iter().collect(),
        None => Vec::new(),
    };
    Ok(EntryScope {
        periods,
        categories,
    })
}
