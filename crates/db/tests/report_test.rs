//! Report integration tests.

#![allow(clippy::uninlined_format_args)]

mod common;

use chrono::Utc;
use common::{balance_of, category, d, period, period_id, tenant};
use kasa_core::ledger::TransactionType;
use kasa_db::entities::budgets;
use kasa_db::repositories::{
    LedgerRepoError, PeriodBalanceRepository, ReportRepository, TransactionInput,
    TransactionRepository,
};
use kasa_shared::types::{BudgetPeriodId, CategoryId, CurrencyCode, PeriodBalanceId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, DatabaseConnection};

fn reports(db: &DatabaseConnection) -> ReportRepository {
    ReportRepository::new(db.clone(), common::ledger_config().supported_currencies)
}

async fn budget(
    db: &DatabaseConnection,
    period_id: i64,
    category_id: i64,
    currency: &str,
    amount: Decimal,
) {
    let now = Utc::now().into();
    budgets::ActiveModel {
        budget_period_id: Set(period_id),
        category_id: Set(category_id),
        currency: Set(currency.to_string()),
        amount: Set(amount),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap();
}

fn spend(
    date: chrono::NaiveDate,
    category_id: i64,
    amount: Decimal,
    currency: &str,
) -> TransactionInput {
    TransactionInput {
        budget_period_id: None,
        date,
        description: "Shopping".to_string(),
        category_id: Some(CategoryId::new(category_id)),
        amount,
        currency: currency.to_string(),
        transaction_type: TransactionType::Expense,
    }
}

#[tokio::test]
async fn test_budget_summary_compares_budget_with_actual() {
    let Some(db) = common::connect().await else {
        return;
    };
    let t = tenant(&db).await;
    let jan = period(&db, &t, "January", d(2025, 1, 1), d(2025, 1, 31)).await;
    let food = category(&db, jan.id, "Food").await;
    let fun = category(&db, jan.id, "Fun").await;
    budget(&db, jan.id, food.id, "PLN", dec!(800.00)).await;
    budget(&db, jan.id, fun.id, "PLN", dec!(200.00)).await;
    budget(&db, jan.id, food.id, "USD", dec!(50.00)).await;

    let transactions = TransactionRepository::new(db.clone());
    for input in [
        spend(d(2025, 1, 3), food.id, dec!(120.50), "PLN"),
        spend(d(2025, 1, 9), food.id, dec!(79.50), "PLN"),
        spend(d(2025, 1, 10), fun.id, dec!(250.00), "PLN"),
        // Same category, unbudgeted currency: counted nowhere.
        spend(d(2025, 1, 11), fun.id, dec!(9.99), "EUR"),
    ] {
        transactions.create(t.workspace_id, input).await.unwrap();
    }

    let summary = reports(&db)
        .budget_summary(t.workspace_id, period_id(&jan))
        .await
        .unwrap();
    assert_eq!(summary.period.id, jan.id);
    assert_eq!(summary.period.name, "January");

    let pln = &summary.currencies["PLN"];
    assert_eq!(pln.total_budget, dec!(1000.00));
    assert_eq!(pln.total_actual, dec!(450.00));
    let food_line = pln.categories.iter().find(|l| l.category == "Food").unwrap();
    assert_eq!(food_line.actual, dec!(200.00));
    assert_eq!(food_line.difference, dec!(600.00));
    let fun_line = pln.categories.iter().find(|l| l.category == "Fun").unwrap();
    assert_eq!(fun_line.difference, dec!(-50.00));

    let usd = &summary.currencies["USD"];
    assert_eq!(usd.total_actual, Decimal::ZERO);
    assert!(!summary.currencies.contains_key("EUR"));

    assert_eq!(summary.balances["PLN"].expenses, dec!(450.00));
    assert_eq!(summary.balances["PLN"].closing, dec!(-450.00));
    assert_eq!(summary.balances["EUR"].expenses, dec!(9.99));
}

#[tokio::test]
async fn test_budget_summary_hides_foreign_period() {
    let Some(db) = common::connect().await else {
        return;
    };
    let owner = tenant(&db).await;
    let other = tenant(&db).await;
    let jan = period(&db, &owner, "January", d(2025, 1, 1), d(2025, 1, 31)).await;

    let err = reports(&db)
        .budget_summary(other.workspace_id, period_id(&jan))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerRepoError::NotFound(_)));

    let err = reports(&db)
        .budget_summary(owner.workspace_id, BudgetPeriodId::new(i64::MAX))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerRepoError::NotFound(_)));
}

#[tokio::test]
async fn test_current_balances_use_latest_period() {
    let Some(db) = common::connect().await else {
        return;
    };
    let t = tenant(&db).await;
    let jan = period(&db, &t, "January", d(2025, 1, 1), d(2025, 1, 31)).await;
    let feb = period(&db, &t, "February", d(2025, 2, 1), d(2025, 2, 28)).await;
    let balances = PeriodBalanceRepository::new(db.clone(), &common::ledger_config());

    balances
        .update_opening_balance(
            t.workspace_id,
            PeriodBalanceId::new(balance_of(&db, jan.id, "PLN").await.id),
            dec!(300.00),
        )
        .await
        .unwrap();
    balances
        .update_opening_balance(
            t.workspace_id,
            PeriodBalanceId::new(balance_of(&db, feb.id, "PLN").await.id),
            dec!(1250.00),
        )
        .await
        .unwrap();

    // Another workspace's later period must not leak in.
    let other = tenant(&db).await;
    let dec_period = period(&db, &other, "December", d(2025, 12, 1), d(2025, 12, 31)).await;
    balances
        .update_opening_balance(
            other.workspace_id,
            PeriodBalanceId::new(balance_of(&db, dec_period.id, "PLN").await.id),
            dec!(9999.00),
        )
        .await
        .unwrap();

    let current = reports(&db).current_balances(t.workspace_id).await.unwrap();
    let configured = common::ledger_config().supported_currencies;
    assert_eq!(current.len(), configured.len());

    let pln = current
        .iter()
        .find(|c| c.currency == CurrencyCode::parse("PLN").unwrap())
        .unwrap();
    assert_eq!(pln.closing_balance, dec!(1250.00));
    assert_eq!(pln.budget_period_id, Some(feb.id));
    assert!(
        current
            .iter()
            .filter(|c| c.currency.as_str() != "PLN")
            .all(|c| c.closing_balance == Decimal::ZERO)
    );
}

#[tokio::test]
async fn test_current_balances_without_periods_are_zero() {
    let Some(db) = common::connect().await else {
        return;
    };
    let t = tenant(&db).await;

    let current = reports(&db).current_balances(t.workspace_id).await.unwrap();
    assert!(!current.is_empty());
    for balance in current {
        assert_eq!(balance.closing_balance, Decimal::ZERO);
        assert_eq!(balance.budget_period_id, None);
    }
}
