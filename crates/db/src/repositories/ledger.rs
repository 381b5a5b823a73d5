//! Incremental balance posting inside a caller's database transaction.
//!
//! Balance rows are locked with `SELECT ... FOR UPDATE` in ascending
//! `(budget_period_id, currency)` order. A missing row is inserted with
//! `ON CONFLICT DO NOTHING` and then locked, so two writers racing to create the same
//! row both end up holding the one that won.

use chrono::Utc;
use kasa_core::ledger::{BalanceKey, BalanceTotals, LedgerError, PostingPlan};
use kasa_shared::types::{BudgetPeriodId, CurrencyCode};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, QueryFilter,
    QuerySelect, Set,
};
use tracing::{debug, error};

use super::error::LedgerRepoError;
use crate::entities::period_balances;

fn zero_row(period_id: BudgetPeriodId, currency: CurrencyCode) -> period_balances::ActiveModel {
    let now = Utc::now().into();
    let mut row = period_balances::ActiveModel {
        budget_period_id: Set(period_id.into_inner()),
        currency: Set(currency.to_string()),
        opening_balance_is_manual: Set(false),
        last_calculated_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    row.set_totals(&BalanceTotals::zero());
    row
}

fn on_key_conflict() -> OnConflict {
    OnConflict::columns([
        period_balances::Column::BudgetPeriodId,
        period_balances::Column::Currency,
    ])
    .do_nothing()
    .to_owned()
}

async fn select_locked<C: ConnectionTrait>(
    conn: &C,
    (period_id, currency): BalanceKey,
) -> Result<Option<period_balances::Model>, LedgerRepoError> {
    Ok(period_balances::Entity::find()
        .filter(period_balances::Column::BudgetPeriodId.eq(period_id.into_inner()))
        .filter(period_balances::Column::Currency.eq(currency.as_str()))
        .lock_exclusive()
        .one(conn)
        .await?)
}

/// Locks the balance row for `key`, creating a zero row first if none exists.
///
/// # Errors
///
/// Returns a database error if the row cannot be created or locked.
pub(crate) async fn lock_balance(
    txn: &DatabaseTransaction,
    key: BalanceKey,
) -> Result<period_balances::Model, LedgerRepoError> {
    if let Some(row) = select_locked(txn, key).await? {
        return Ok(row);
    }

    period_balances::Entity::insert(zero_row(key.0, key.1))
        .on_conflict(on_key_conflict())
        .do_nothing()
        .exec(txn)
        .await?;

    select_locked(txn, key)
        .await?
        .ok_or_else(|| LedgerRepoError::not_found("Period balance", format!("{}/{}", key.0, key.1)))
}

/// Locks an existing balance row by id.
pub(crate) async fn lock_balance_by_id(
    txn: &DatabaseTransaction,
    id: i64,
) -> Result<Option<period_balances::Model>, LedgerRepoError> {
    Ok(period_balances::Entity::find_by_id(id)
        .lock_exclusive()
        .one(txn)
        .await?)
}

/// Writes new totals onto a locked row.
pub(crate) async fn save_totals(
    txn: &DatabaseTransaction,
    row: period_balances::Model,
    totals: &BalanceTotals,
) -> Result<period_balances::Model, LedgerRepoError> {
    let mut active: period_balances::ActiveModel = row.into();
    active.set_totals(totals);
    active.updated_at = Set(Utc::now().into());
    Ok(active.update(txn).await?)
}

/// Applies every posting of `plan`, locking rows in ascending key order.
///
/// Nothing is written for a row whose deltas would break the reconciliation formula;
/// the error aborts the caller's transaction.
///
/// # Errors
///
/// Returns `InvariantViolation` on arithmetic failure, or a database error.
pub(crate) async fn apply_plan(
    txn: &DatabaseTransaction,
    plan: &PostingPlan,
) -> Result<(), LedgerRepoError> {
    for key in plan.lock_order() {
        let row = lock_balance(txn, key).await?;
        let mut totals = row.totals();
        for delta in plan.deltas_for(key) {
            debug!(
                period_id = %key.0,
                currency = %key.1,
                field = delta.field.as_str(),
                amount = %delta.amount,
                "Posting balance delta"
            );
            if let Err(e) = totals.apply(delta) {
                if let LedgerError::InvariantViolation(ref msg) = e {
                    error!(period_id = %key.0, currency = %key.1, %msg, "Balance invariant violated");
                }
                return Err(e.into());
            }
        }
        save_totals(txn, row, &totals).await?;
    }
    Ok(())
}

/// Inserts a zero balance row per currency, leaving existing rows untouched.
pub(crate) async fn create_zero_balances<C: ConnectionTrait>(
    conn: &C,
    period_id: BudgetPeriodId,
    currencies: &[CurrencyCode],
) -> Result<(), LedgerRepoError> {
    if currencies.is_empty() {
        return Ok(());
    }
    period_balances::Entity::insert_many(currencies.iter().map(|c| zero_row(period_id, *c)))
        .on_conflict(on_key_conflict())
        .do_nothing()
        .exec(conn)
        .await?;
    Ok(())
}
