//! Period balance routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
};
use kasa_db::{
    PeriodBalanceRepository,
    repositories::BalanceFilter,
};
use kasa_shared::types::{BudgetPeriodId, PeriodBalanceId};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use crate::{AppState, error::ApiResult, middleware::WorkspaceContext};

/// Creates the period balance routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/period-balances", get(list_balances))
        .route("/period-balances/recalculate", post(recalculate))
        .route("/period-balances/recalculate-all", post(recalculate_all))
        .route("/period-balances/verify", get(verify))
        .route(
            "/period-balances/{id}",
            get(get_balance).put(update_opening_balance),
        )
}

// ============================================================================
// Request Types
// ============================================================================

/// Query parameters for listing balances.
#[derive(Debug, Deserialize)]
pub struct ListBalancesQuery {
    /// Only this period.
    pub budget_period_id: Option<BudgetPeriodId>,
    /// Only this currency.
    pub currency: Option<String>,
}

/// Request body for a manual opening balance.
#[derive(Debug, Deserialize)]
pub struct UpdateOpeningBalanceRequest {
    /// New opening balance, zero or more.
    pub opening_balance: Decimal,
}

/// Request body for recalculating one balance.
#[derive(Debug, Deserialize)]
pub struct RecalculateRequest {
    /// Period to rebuild.
    pub budget_period_id: BudgetPeriodId,
    /// Currency to rebuild.
    pub currency: String,
}

/// Request body for recalculating every balance of a period.
#[derive(Debug, Deserialize)]
pub struct RecalculateAllRequest {
    /// Period to rebuild.
    pub budget_period_id: BudgetPeriodId,
}

/// Query parameters for the drift check.
#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    /// Period to check.
    pub budget_period_id: BudgetPeriodId,
}

fn repository(state: &AppState) -> PeriodBalanceRepository {
    PeriodBalanceRepository::new((*state.db).clone(), &state.ledger)
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/period-balances`
async fn list_balances(
    State(state): State<AppState>,
    workspace: WorkspaceContext,
    Query(query): Query<ListBalancesQuery>,
) -> ApiResult<impl IntoResponse> {
    let balances = repository(&state)
        .list(
            workspace.id(),
            BalanceFilter {
                budget_period_id: query.budget_period_id,
                currency: query.currency,
            },
        )
        .await?;
    Ok(Json(json!({ "period_balances": balances })))
}

/// GET `/period-balances/{id}`
async fn get_balance(
    State(state): State<AppState>,
    workspace: WorkspaceContext,
    Path(id): Path<PeriodBalanceId>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(repository(&state).get(workspace.id(), id).await?))
}

/// PUT `/period-balances/{id}`
async fn update_opening_balance(
    State(state): State<AppState>,
    workspace: WorkspaceContext,
    Path(id): Path<PeriodBalanceId>,
    Json(request): Json<UpdateOpeningBalanceRequest>,
) -> ApiResult<impl IntoResponse> {
    let balance = repository(&state)
        .update_opening_balance(workspace.id(), id, request.opening_balance)
        .await?;
    Ok(Json(balance))
}

/// POST `/period-balances/recalculate`
async fn recalculate(
    State(state): State<AppState>,
    workspace: WorkspaceContext,
    Json(request): Json<RecalculateRequest>,
) -> ApiResult<impl IntoResponse> {
    let balance = repository(&state)
        .recalculate(workspace.id(), request.budget_period_id, &request.currency)
        .await?;
    Ok(Json(balance))
}

/// POST `/period-balances/recalculate-all`
async fn recalculate_all(
    State(state): State<AppState>,
    workspace: WorkspaceContext,
    Json(request): Json<RecalculateAllRequest>,
) -> ApiResult<impl IntoResponse> {
    let balances = repository(&state)
        .recalculate_all(workspace.id(), request.budget_period_id)
        .await?;
    Ok(Json(json!({ "period_balances": balances })))
}

/// GET `/period-balances/verify`
async fn verify(
    State(state): State<AppState>,
    workspace: WorkspaceContext,
    Query(query): Query<VerifyQuery>,
) -> ApiResult<impl IntoResponse> {
    let checks = repository(&state)
        .verify(workspace.id(), query.budget_period_id)
        .await?;
    let drifted = checks.iter().filter(|c| c.drift.has_drift()).count();
    Ok(Json(json!({ "checks": checks, "drifted": drifted })))
}
