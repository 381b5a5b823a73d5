//! Planned transaction routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::NaiveDate;
use kasa_core::planned::PlannedStatus;
use kasa_db::{
    PlannedTransactionRepository,
    repositories::{ImportPlannedRow, PlannedFilter, PlannedInput},
};
use kasa_shared::types::{BudgetPeriodId, CategoryId, PlannedTransactionId};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use crate::{AppState, error::ApiResult, middleware::WorkspaceContext};

/// Creates the planned transaction routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/planned-transactions", get(list_planned).post(create_planned))
        .route("/planned-transactions/import", post(import_planned))
        .route(
            "/planned-transactions/{id}",
            get(get_planned).put(update_planned).delete(delete_planned),
        )
        .route("/planned-transactions/{id}/execute", post(execute_planned))
}

// ============================================================================
// Request Types
// ============================================================================

/// Request body for creating or replacing a planned transaction.
#[derive(Debug, Deserialize)]
pub struct PlannedRequest {
    /// Explicit period; resolved from the planned date when absent.
    pub budget_period_id: Option<BudgetPeriodId>,
    /// Display name.
    pub name: String,
    /// Positive amount.
    pub amount: Decimal,
    /// Currency code.
    pub currency: String,
    /// Expense category.
    pub category_id: Option<CategoryId>,
    /// Planned payment date.
    pub planned_date: NaiveDate,
    /// `pending` or `cancelled`.
    pub status: Option<PlannedStatus>,
}

impl From<PlannedRequest> for PlannedInput {
    fn from(request: PlannedRequest) -> Self {
        Self {
            budget_period_id: request.budget_period_id,
            name: request.name,
            amount: request.amount,
            currency: request.currency,
            category_id: request.category_id,
            planned_date: request.planned_date,
            status: request.status,
        }
    }
}

/// Query parameters for listing planned transactions.
#[derive(Debug, Deserialize)]
pub struct ListPlannedQuery {
    /// Only this period.
    pub budget_period_id: Option<BudgetPeriodId>,
    /// Only this status.
    pub status: Option<PlannedStatus>,
}

/// Request body for executing a planned transaction.
#[derive(Debug, Default, Deserialize)]
pub struct ExecuteRequest {
    /// Payment date; today when absent.
    pub payment_date: Option<NaiveDate>,
}

/// One imported row.
#[derive(Debug, Deserialize)]
pub struct ImportRow {
    /// Display name.
    pub name: String,
    /// Positive amount.
    pub amount: Decimal,
    /// Currency code.
    pub currency: String,
    /// Category name in the target period.
    pub category: Option<String>,
    /// Planned payment date.
    pub planned_date: NaiveDate,
}

/// Request body for an import.
#[derive(Debug, Deserialize)]
pub struct ImportPlannedRequest {
    /// Target period.
    pub budget_period_id: BudgetPeriodId,
    /// Rows to import.
    pub planned_transactions: Vec<ImportRow>,
}

fn repository(state: &AppState) -> PlannedTransactionRepository {
    PlannedTransactionRepository::new((*state.db).clone())
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/planned-transactions`
async fn list_planned(
    State(state): State<AppState>,
    workspace: WorkspaceContext,
    Query(query): Query<ListPlannedQuery>,
) -> ApiResult<impl IntoResponse> {
    let planned = repository(&state)
        .list(
            workspace.id(),
            PlannedFilter {
                budget_period_id: query.budget_period_id,
                status: query.status,
            },
        )
        .await?;
    Ok(Json(json!({ "planned_transactions": planned })))
}

/// POST `/planned-transactions`
async fn create_planned(
    State(state): State<AppState>,
    workspace: WorkspaceContext,
    Json(request): Json<PlannedRequest>,
) -> ApiResult<impl IntoResponse> {
    let planned = repository(&state)
        .create(workspace.id(), request.into())
        .await?;
    Ok((StatusCode::CREATED, Json(planned)))
}

/// GET `/planned-transactions/{id}`
async fn get_planned(
    State(state): State<AppState>,
    workspace: WorkspaceContext,
    Path(id): Path<PlannedTransactionId>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(repository(&state).get(workspace.id(), id).await?))
}

/// PUT `/planned-transactions/{id}`
async fn update_planned(
    State(state): State<AppState>,
    workspace: WorkspaceContext,
    Path(id): Path<PlannedTransactionId>,
    Json(request): Json<PlannedRequest>,
) -> ApiResult<impl IntoResponse> {
    let planned = repository(&state)
        .update(workspace.id(), id, request.into())
        .await?;
    Ok(Json(planned))
}

/// DELETE `/planned-transactions/{id}`
async fn delete_planned(
    State(state): State<AppState>,
    workspace: WorkspaceContext,
    Path(id): Path<PlannedTransactionId>,
) -> ApiResult<impl IntoResponse> {
    repository(&state).delete(workspace.id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST `/planned-transactions/{id}/execute`
///
/// The body is optional; an empty request executes with today's date.
async fn execute_planned(
    State(state): State<AppState>,
    workspace: WorkspaceContext,
    Path(id): Path<PlannedTransactionId>,
    request: Option<Json<ExecuteRequest>>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = request.unwrap_or_default();
    let executed = repository(&state)
        .execute(workspace.id(), id, request.payment_date)
        .await?;
    Ok(Json(executed))
}

/// POST `/planned-transactions/import`
async fn import_planned(
    State(state): State<AppState>,
    workspace: WorkspaceContext,
    Json(request): Json<ImportPlannedRequest>,
) -> ApiResult<impl IntoResponse> {
    let rows = request
        .planned_transactions
        .into_iter()
        .map(|row| ImportPlannedRow {
            name: row.name,
            amount: row.amount,
            currency: row.currency,
            category_name: row.category,
            planned_date: row.planned_date,
        })
        .collect();
    let imported = repository(&state)
        .import(workspace.id(), request.budget_period_id, rows)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "imported": imported.len(), "planned_transactions": imported })),
    ))
}
