//! Budget period routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{NaiveDate, Utc};
use kasa_db::{
    BudgetPeriodRepository,
    repositories::{BudgetPeriodFilter, CopyBudgetPeriod, CreateBudgetPeriod, UpdateBudgetPeriod},
};
use kasa_shared::types::{BudgetAccountId, BudgetPeriodId};
use serde::Deserialize;
use serde_json::json;

use crate::{AppState, error::ApiResult, middleware::WorkspaceContext};

/// Creates the budget period routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/budget-periods", get(list_periods).post(create_period))
        .route("/budget-periods/current", get(current_period))
        .route(
            "/budget-periods/{id}",
            get(get_period).put(update_period).delete(delete_period),
        )
        .route("/budget-periods/{id}/copy", post(copy_period))
}

// ============================================================================
// Request Types
// ============================================================================

/// Request body for creating a period.
#[derive(Debug, Deserialize)]
pub struct CreatePeriodRequest {
    /// Owning budget account.
    pub budget_account_id: BudgetAccountId,
    /// Period name.
    pub name: String,
    /// First day.
    pub start_date: NaiveDate,
    /// Last day, inclusive.
    pub end_date: NaiveDate,
    /// Optional week count.
    pub weeks: Option<i32>,
}

/// Request body for copying a period.
#[derive(Debug, Deserialize)]
pub struct CopyPeriodRequest {
    /// Name of the copy.
    pub name: String,
    /// First day of the copy.
    pub start_date: NaiveDate,
    /// Last day of the copy.
    pub end_date: NaiveDate,
    /// Optional week count.
    pub weeks: Option<i32>,
}

/// Request body for updating a period.
#[derive(Debug, Deserialize)]
pub struct UpdatePeriodRequest {
    /// New name.
    pub name: Option<String>,
    /// New first day.
    pub start_date: Option<NaiveDate>,
    /// New last day.
    pub end_date: Option<NaiveDate>,
    /// New week count.
    pub weeks: Option<i32>,
}

/// Query parameters for listing periods.
#[derive(Debug, Deserialize)]
pub struct ListPeriodsQuery {
    /// Only periods of this account.
    pub budget_account_id: Option<BudgetAccountId>,
}

/// Query parameters for the current period.
#[derive(Debug, Deserialize)]
pub struct CurrentPeriodQuery {
    /// Date to look up; today when absent.
    pub date: Option<NaiveDate>,
}

fn repository(state: &AppState) -> BudgetPeriodRepository {
    BudgetPeriodRepository::new((*state.db).clone(), &state.ledger)
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/budget-periods`
async fn list_periods(
    State(state): State<AppState>,
    workspace: WorkspaceContext,
    Query(query): Query<ListPeriodsQuery>,
) -> ApiResult<impl IntoResponse> {
    let periods = repository(&state)
        .list(
            workspace.id(),
            BudgetPeriodFilter {
                budget_account_id: query.budget_account_id,
            },
        )
        .await?;
    Ok(Json(json!({ "budget_periods": periods })))
}

/// POST `/budget-periods`
async fn create_period(
    State(state): State<AppState>,
    workspace: WorkspaceContext,
    Json(request): Json<CreatePeriodRequest>,
) -> ApiResult<impl IntoResponse> {
    let period = repository(&state)
        .create(
            workspace.id(),
            CreateBudgetPeriod {
                budget_account_id: request.budget_account_id,
                name: request.name,
                start_date: request.start_date,
                end_date: request.end_date,
                weeks: request.weeks,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(period)))
}

/// GET `/budget-periods/current`
async fn current_period(
    State(state): State<AppState>,
    workspace: WorkspaceContext,
    Query(query): Query<CurrentPeriodQuery>,
) -> ApiResult<impl IntoResponse> {
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());
    Ok(Json(repository(&state).current(workspace.id(), date).await?))
}

/// GET `/budget-periods/{id}`
async fn get_period(
    State(state): State<AppState>,
    workspace: WorkspaceContext,
    Path(id): Path<BudgetPeriodId>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(repository(&state).get(workspace.id(), id).await?))
}

/// PUT `/budget-periods/{id}`
async fn update_period(
    State(state): State<AppState>,
    workspace: WorkspaceContext,
    Path(id): Path<BudgetPeriodId>,
    Json(request): Json<UpdatePeriodRequest>,
) -> ApiResult<impl IntoResponse> {
    let period = repository(&state)
        .update(
            workspace.id(),
            id,
            UpdateBudgetPeriod {
                name: request.name,
                start_date: request.start_date,
                end_date: request.end_date,
                weeks: request.weeks,
            },
        )
        .await?;
    Ok(Json(period))
}

/// DELETE `/budget-periods/{id}`
async fn delete_period(
    State(state): State<AppState>,
    workspace: WorkspaceContext,
    Path(id): Path<BudgetPeriodId>,
) -> ApiResult<impl IntoResponse> {
    repository(&state).delete(workspace.id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST `/budget-periods/{id}/copy`
async fn copy_period(
    State(state): State<AppState>,
    workspace: WorkspaceContext,
    Path(id): Path<BudgetPeriodId>,
    Json(request): Json<CopyPeriodRequest>,
) -> ApiResult<impl IntoResponse> {
    let period = repository(&state)
        .copy(
            workspace.id(),
            id,
            CopyBudgetPeriod {
                name: request.name,
                start_date: request.start_date,
                end_date: request.end_date,
                weeks: request.weeks,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(period)))
}
