//! Currency exchange routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::NaiveDate;
use kasa_db::{
    CurrencyExchangeRepository,
    repositories::{ExchangeFilter, ExchangeInput},
};
use kasa_shared::types::{BudgetPeriodId, CurrencyExchangeId};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use crate::{AppState, error::ApiResult, middleware::WorkspaceContext};

/// Creates the currency exchange routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/currency-exchanges", get(list_exchanges).post(create_exchange))
        .route("/currency-exchanges/import", post(import_exchanges))
        .route(
            "/currency-exchanges/{id}",
            get(get_exchange).put(update_exchange).delete(delete_exchange),
        )
}

/// Request body for creating, replacing, or importing an exchange.
#[derive(Debug, Deserialize)]
pub struct ExchangeRequest {
    /// Exchange date; selects the period.
    pub date: NaiveDate,
    /// Optional description.
    pub description: Option<String>,
    /// Currency paid out.
    pub from_currency: String,
    /// Amount paid out.
    pub from_amount: Decimal,
    /// Currency received.
    pub to_currency: String,
    /// Amount received.
    pub to_amount: Decimal,
}

impl From<ExchangeRequest> for ExchangeInput {
    fn from(request: ExchangeRequest) -> Self {
        Self {
            date: request.date,
            description: request.description,
            from_currency: request.from_currency,
            from_amount: request.from_amount,
            to_currency: request.to_currency,
            to_amount: request.to_amount,
        }
    }
}

/// Query parameters for listing exchanges.
#[derive(Debug, Deserialize)]
pub struct ListExchangesQuery {
    /// Only this period.
    pub budget_period_id: Option<BudgetPeriodId>,
    /// Either side in this currency.
    pub currency: Option<String>,
}

/// Request body for an import.
#[derive(Debug, Deserialize)]
pub struct ImportExchangesRequest {
    /// Rows to import.
    pub exchanges: Vec<ExchangeRequest>,
}

fn repository(state: &AppState) -> CurrencyExchangeRepository {
    CurrencyExchangeRepository::new((*state.db).clone())
}

/// GET `/currency-exchanges`
async fn list_exchanges(
    State(state): State<AppState>,
    workspace: WorkspaceContext,
    Query(query): Query<ListExchangesQuery>,
) -> ApiResult<impl IntoResponse> {
    let exchanges = repository(&state)
        .list(
            workspace.id(),
            ExchangeFilter {
                budget_period_id: query.budget_period_id,
                currency: query.currency,
            },
        )
        .await?;
    Ok(Json(json!({ "currency_exchanges": exchanges })))
}

/// POST `/currency-exchanges`
async fn create_exchange(
    State(state): State<AppState>,
    workspace: WorkspaceContext,
    Json(request): Json<ExchangeRequest>,
) -> ApiResult<impl IntoResponse> {
    let exchange = repository(&state)
        .create(workspace.id(), request.into())
        .await?;
    Ok((StatusCode::CREATED, Json(exchange)))
}

/// GET `/currency-exchanges/{id}`
async fn get_exchange(
    State(state): State<AppState>,
    workspace: WorkspaceContext,
    Path(id): Path<CurrencyExchangeId>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(repository(&state).get(workspace.id(), id).await?))
}

/// PUT `/currency-exchanges/{id}`
async fn update_exchange(
    State(state): State<AppState>,
    workspace: WorkspaceContext,
    Path(id): Path<CurrencyExchangeId>,
    Json(request): Json<ExchangeRequest>,
) -> ApiResult<impl IntoResponse> {
    let exchange = repository(&state)
        .update(workspace.id(), id, request.into())
        .await?;
    Ok(Json(exchange))
}

/// DELETE `/currency-exchanges/{id}`
async fn delete_exchange(
    State(state): State<AppState>,
    workspace: WorkspaceContext,
    Path(id): Path<CurrencyExchangeId>,
) -> ApiResult<impl IntoResponse> {
    repository(&state).delete(workspace.id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST `/currency-exchanges/import`
async fn import_exchanges(
    State(state): State<AppState>,
    workspace: WorkspaceContext,
    Json(request): Json<ImportExchangesRequest>,
) -> ApiResult<impl IntoResponse> {
    let rows = request.exchanges.into_iter().map(Into::into).collect();
    let imported = repository(&state).import(workspace.id(), rows).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "imported": imported.len(), "currency_exchanges": imported })),
    ))
}
