//! Planned transaction execution tests.

#![allow(clippy::uninlined_format_args)]

mod common;

use common::{balance_of, d, period, tenant};
use kasa_core::ledger::LedgerError;
use kasa_core::planned::PlannedStatus;
use kasa_db::entities::sea_orm_active_enums::{PlannedStatus as DbPlannedStatus, TransactionType};
use kasa_db::entities::transactions;
use kasa_db::repositories::{LedgerRepoError, PlannedInput, PlannedTransactionRepository};
use kasa_shared::types::{CategoryId, PlannedTransactionId};
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

fn rent(category_id: Option<CategoryId>) -> PlannedInput {
    PlannedInput {
        budget_period_id: None,
        name: "Rent".to_string(),
        amount: dec!(1200.00),
        currency: "USD".to_string(),
        category_id,
        planned_date: d(2025, 4, 1),
        status: None,
    }
}

#[tokio::test]
async fn test_execute_creates_expense_and_posts_once() {
    let Some(db) = common::connect().await else {
        return;
    };
    let t = tenant(&db).await;
    let april = period(&db, &t, "April", d(2025, 4, 1), d(2025, 4, 30)).await;
    let housing = common::category(&db, april.id, "Housing").await;
    let planned = PlannedTransactionRepository::new(db.clone());
    let expenses_before = balance_of(&db, april.id, "USD").await.total_expenses;

    let created = planned
        .create(t.workspace_id, rent(Some(CategoryId::new(housing.id))))
        .await
        .unwrap();
    assert_eq!(created.budget_period_id, Some(april.id));
    assert_eq!(created.status, DbPlannedStatus::Pending);
    // Planning alone does not post.
    assert_eq!(balance_of(&db, april.id, "USD").await.total_expenses, expenses_before);

    let id = PlannedTransactionId::new(created.id);
    let executed = planned
        .execute(t.workspace_id, id, Some(d(2025, 4, 3)))
        .await
        .unwrap();
    assert_eq!(executed.planned.status, DbPlannedStatus::Done);
    assert_eq!(executed.planned.payment_date, Some(d(2025, 4, 3)));
    assert_eq!(executed.planned.transaction_id, Some(executed.transaction.id));
    assert_eq!(executed.transaction.transaction_type, TransactionType::Expense);
    assert_eq!(executed.transaction.amount, dec!(1200.00));
    assert_eq!(executed.transaction.category_id, Some(housing.id));
    assert_eq!(executed.transaction.description, "Rent");

    let usd = balance_of(&db, april.id, "USD").await;
    assert_eq!(usd.total_expenses, expenses_before + dec!(1200.00));

    let err = planned
        .execute(t.workspace_id, id, Some(d(2025, 4, 4)))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerRepoError::Ledger(LedgerError::AlreadyExecuted)));
    assert_eq!(balance_of(&db, april.id, "USD").await.totals(), usd.totals());

    let count = transactions::Entity::find()
        .filter(transactions::Column::WorkspaceId.eq(t.workspace_id.into_inner()))
        .count(&db)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_execute_without_covering_period_writes_nothing() {
    let Some(db) = common::connect().await else {
        return;
    };
    let t = tenant(&db).await;
    period(&db, &t, "April", d(2025, 4, 1), d(2025, 4, 30)).await;
    let planned = PlannedTransactionRepository::new(db.clone());

    let created = planned.create(t.workspace_id, rent(None)).await.unwrap();
    let err = planned
        .execute(
            t.workspace_id,
            PlannedTransactionId::new(created.id),
            Some(d(2026, 1, 1)),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerRepoError::Ledger(LedgerError::NoPeriodForDate(_))
    ));

    let reloaded = planned
        .get(t.workspace_id, PlannedTransactionId::new(created.id))
        .await
        .unwrap();
    assert_eq!(reloaded.status, DbPlannedStatus::Pending);
    assert_eq!(reloaded.transaction_id, None);
}

#[tokio::test]
async fn test_cancelled_cannot_execute_and_done_is_not_editable() {
    let Some(db) = common::connect().await else {
        return;
    };
    let t = tenant(&db).await;
    period(&db, &t, "April", d(2025, 4, 1), d(2025, 4, 30)).await;
    let planned = PlannedTransactionRepository::new(db.clone());

    let created = planned.create(t.workspace_id, rent(None)).await.unwrap();
    let id = PlannedTransactionId::new(created.id);

    let cancelled = planned
        .update(
            t.workspace_id,
            id,
            PlannedInput {
                status: Some(PlannedStatus::Cancelled),
                ..rent(None)
            },
        )
        .await
        .unwrap();
    assert_eq!(cancelled.status, DbPlannedStatus::Cancelled);

    let err = planned.execute(t.workspace_id, id, None).await.unwrap_err();
    assert!(matches!(err, LedgerRepoError::Ledger(LedgerError::PlannedCancelled)));

    let err = planned
        .update(
            t.workspace_id,
            id,
            PlannedInput {
                status: Some(PlannedStatus::Done),
                ..rent(None)
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerRepoError::Ledger(LedgerError::InvalidStatusTransition { .. })
    ));
}
