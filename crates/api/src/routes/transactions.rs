//! Transaction routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::NaiveDate;
use kasa_core::ledger::TransactionType;
use kasa_db::{
    TransactionRepository,
    repositories::{ImportTransactionRow, TransactionFilter, TransactionInput},
};
use kasa_shared::types::{BudgetPeriodId, CategoryId, TransactionId};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use crate::{AppState, error::ApiResult, middleware::WorkspaceContext};

/// Creates the transaction routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/transactions", get(list_transactions).post(create_transaction))
        .route("/transactions/import", post(import_transactions))
        .route(
            "/transactions/{id}",
            get(get_transaction)
                .put(update_transaction)
                .delete(delete_transaction),
        )
}

// ============================================================================
// Request Types
// ============================================================================

/// Request body for creating or replacing a transaction.
#[derive(Debug, Deserialize)]
pub struct TransactionRequest {
    /// Explicit period; resolved from the date when absent.
    pub budget_period_id: Option<BudgetPeriodId>,
    /// Booking date.
    pub date: NaiveDate,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Expense category.
    pub category_id: Option<CategoryId>,
    /// Positive amount.
    pub amount: Decimal,
    /// Currency code.
    pub currency: String,
    /// `income` or `expense`.
    pub transaction_type: TransactionType,
}

impl From<TransactionRequest> for TransactionInput {
    fn from(request: TransactionRequest) -> Self {
        Self {
            budget_period_id: request.budget_period_id,
            date: request.date,
            description: request.description,
            category_id: request.category_id,
            amount: request.amount,
            currency: request.currency,
            transaction_type: request.transaction_type,
        }
    }
}

/// Query parameters for listing transactions.
#[derive(Debug, Deserialize)]
pub struct ListTransactionsQuery {
    /// Only this period.
    pub budget_period_id: Option<BudgetPeriodId>,
    /// Only this type.
    pub transaction_type: Option<TransactionType>,
    /// Only this category.
    pub category_id: Option<CategoryId>,
    /// On or after.
    pub date_from: Option<NaiveDate>,
    /// On or before.
    pub date_to: Option<NaiveDate>,
}

/// One imported row.
#[derive(Debug, Deserialize)]
pub struct ImportRow {
    /// Booking date.
    pub date: NaiveDate,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Category name in the target period.
    pub category: Option<String>,
    /// Positive amount.
    pub amount: Decimal,
    /// Currency code.
    pub currency: String,
    /// `income` or `expense`.
    pub transaction_type: TransactionType,
}

/// Request body for an import.
#[derive(Debug, Deserialize)]
pub struct ImportTransactionsRequest {
    /// Target period.
    pub budget_period_id: BudgetPeriodId,
    /// Rows to import.
    pub transactions: Vec<ImportRow>,
}

fn repository(state: &AppState) -> TransactionRepository {
    TransactionRepository::new((*state.db).clone())
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/transactions`
async fn list_transactions(
    State(state): State<AppState>,
    workspace: WorkspaceContext,
    Query(query): Query<ListTransactionsQuery>,
) -> ApiResult<impl IntoResponse> {
    let transactions = repository(&state)
        .list(
            workspace.id(),
            TransactionFilter {
                budget_period_id: query.budget_period_id,
                transaction_type: query.transaction_type,
                category_id: query.category_id,
                date_from: query.date_from,
                date_to: query.date_to,
            },
        )
        .await?;
    Ok(Json(json!({ "transactions": transactions })))
}

/// POST `/transactions`
async fn create_transaction(
    State(state): State<AppState>,
    workspace: WorkspaceContext,
    Json(request): Json<TransactionRequest>,
) -> ApiResult<impl IntoResponse> {
    let transaction = repository(&state)
        .create(workspace.id(), request.into())
        .await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

/// GET `/transactions/{id}`
async fn get_transaction(
    State(state): State<AppState>,
    workspace: WorkspaceContext,
    Path(id): Path<TransactionId>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(repository(&state).get(workspace.id(), id).await?))
}

/// PUT `/transactions/{id}`
async fn update_transaction(
    State(state): State<AppState>,
    workspace: WorkspaceContext,
    Path(id): Path<TransactionId>,
    Json(request): Json<TransactionRequest>,
) -> ApiResult<impl IntoResponse> {
    let transaction = repository(&state)
        .update(workspace.id(), id, request.into())
        .await?;
    Ok(Json(transaction))
}

/// DELETE `/transactions/{id}`
async fn delete_transaction(
    State(state): State<AppState>,
    workspace: WorkspaceContext,
    Path(id): Path<TransactionId>,
) -> ApiResult<impl IntoResponse> {
    repository(&state).delete(workspace.id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST `/transactions/import`
async fn import_transactions(
    State(state): State<AppState>,
    workspace: WorkspaceContext,
    Json(request): Json<ImportTransactionsRequest>,
) -> ApiResult<impl IntoResponse> {
    let rows = request
        .transactions
        .into_iter()
        .map(|row| ImportTransactionRow {
            date: row.date,
            description: row.description,
            category_name: row.category,
            amount: row.amount,
            currency: row.currency,
            transaction_type: row.transaction_type,
        })
        .collect();
    let imported = repository(&state)
        .import(workspace.id(), request.budget_period_id, rows)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "imported": imported.len(), "transactions": imported })),
    ))
}
