//! API route definitions.

use axum::Router;

use crate::AppState;

pub mod budget_periods;
pub mod currency_exchanges;
pub mod health;
pub mod period_balances;
pub mod planned_transactions;
pub mod reports;
pub mod transactions;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(period_balances::routes())
        .merge(budget_periods::routes())
        .merge(transactions::routes())
        .merge(currency_exchanges::routes())
        .merge(planned_transactions::routes())
        .merge(reports::routes())
}
