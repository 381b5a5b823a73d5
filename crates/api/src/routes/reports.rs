//! Report routes.

use axum::{
    Json, Router,
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
};
use kasa_db::ReportRepository;
use kasa_shared::types::BudgetPeriodId;
use serde::Deserialize;
use serde_json::json;

use crate::{AppState, error::ApiResult, middleware::WorkspaceContext};

/// Creates the report routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reports/budget-summary", get(budget_summary))
        .route("/reports/current-balances", get(current_balances))
}

/// Query parameters for the budget summary.
#[derive(Debug, Deserialize)]
pub struct BudgetSummaryQuery {
    /// Period to summarize.
    pub budget_period_id: BudgetPeriodId,
}

fn repository(state: &AppState) -> ReportRepository {
    ReportRepository::new(
        (*state.db).clone(),
        state.ledger.supported_currencies.clone(),
    )
}

/// GET `/reports/budget-summary`
async fn budget_summary(
    State(state): State<AppState>,
    workspace: WorkspaceContext,
    Query(query): Query<BudgetSummaryQuery>,
) -> ApiResult<impl IntoResponse> {
    let summary = repository(&state)
        .budget_summary(workspace.id(), query.budget_period_id)
        .await?;
    Ok(Json(summary))
}

/// GET `/reports/current-balances`
async fn current_balances(
    State(state): State<AppState>,
    workspace: WorkspaceContext,
) -> ApiResult<impl IntoResponse> {
    let balances = repository(&state).current_balances(workspace.id()).await?;
    Ok(Json(json!({ "balances": balances })))
}
