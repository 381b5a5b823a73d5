//! Period balance ledger integration tests.
//!
//! Covers incremental posting, full recalculation, and the chain between periods.

#![allow(clippy::uninlined_format_args)]

mod common;

use common::{assert_reconciled, balance, balance_of, d, period, period_id, tenant};
use kasa_core::ledger::{LedgerError, TransactionType};
use kasa_db::repositories::{
    CurrencyExchangeRepository, ExchangeInput, ImportTransactionRow, LedgerRepoError,
    PeriodBalanceRepository, TransactionInput, TransactionRepository,
};
use kasa_shared::types::{CurrencyExchangeId, PeriodBalanceId, TransactionId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn income(date: chrono::NaiveDate, amount: Decimal, currency: &str) -> TransactionInput {
    TransactionInput {
        budget_period_id: None,
        date,
        description: "Salary".to_string(),
        category_id: None,
        amount,
        currency: currency.to_string(),
        transaction_type: TransactionType::Income,
    }
}

fn expense(date: chrono::NaiveDate, amount: Decimal, currency: &str) -> TransactionInput {
    TransactionInput {
        description: "Groceries".to_string(),
        transaction_type: TransactionType::Expense,
        ..income(date, amount, currency)
    }
}

fn exchange(
    date: chrono::NaiveDate,
    from: (&str, Decimal),
    to: (&str, Decimal),
) -> ExchangeInput {
    ExchangeInput {
        date,
        description: None,
        from_currency: from.0.to_string(),
        from_amount: from.1,
        to_currency: to.0.to_string(),
        to_amount: to.1,
    }
}

#[tokio::test]
async fn test_recalculate_carries_previous_closing_into_zero_opening() {
    let Some(db) = common::connect().await else {
        return;
    };
    let t = tenant(&db).await;
    let jan = period(&db, &t, "January", d(2025, 1, 1), d(2025, 1, 31)).await;
    let feb = period(&db, &t, "February", d(2025, 2, 1), d(2025, 2, 28)).await;
    let transactions = TransactionRepository::new(db.clone());
    let balances = PeriodBalanceRepository::new(db.clone(), &common::ledger_config());

    transactions
        .create(t.workspace_id, income(d(2025, 1, 5), dec!(5000.00), "PLN"))
        .await
        .unwrap();
    transactions
        .create(t.workspace_id, expense(d(2025, 1, 20), dec!(1000.00), "PLN"))
        .await
        .unwrap();
    let jan_pln = balance_of(&db, jan.id, "PLN").await;
    assert_eq!(jan_pln.closing_balance, dec!(4000.00));

    let feb_pln = balances
        .recalculate(t.workspace_id, period_id(&feb), "PLN")
        .await
        .unwrap();
    assert_eq!(feb_pln.opening_balance, dec!(4000.00));
    assert_eq!(feb_pln.closing_balance, dec!(4000.00));
    assert!(feb_pln.last_calculated_at.is_some());
    assert_reconciled(&feb_pln);
}

#[tokio::test]
async fn test_manual_opening_balance_survives_recalculation() {
    let Some(db) = common::connect().await else {
        return;
    };
    let t = tenant(&db).await;
    let jan = period(&db, &t, "January", d(2025, 1, 1), d(2025, 1, 31)).await;
    let feb = period(&db, &t, "February", d(2025, 2, 1), d(2025, 2, 28)).await;
    let transactions = TransactionRepository::new(db.clone());
    let balances = PeriodBalanceRepository::new(db.clone(), &common::ledger_config());

    transactions
        .create(t.workspace_id, income(d(2025, 1, 5), dec!(4000.00), "PLN"))
        .await
        .unwrap();
    assert_eq!(balance_of(&db, jan.id, "PLN").await.closing_balance, dec!(4000.00));

    let feb_pln = balance_of(&db, feb.id, "PLN").await;
    let manual = balances
        .update_opening_balance(t.workspace_id, PeriodBalanceId::new(feb_pln.id), dec!(5000.00))
        .await
        .unwrap();
    assert!(manual.opening_balance_is_manual);
    assert_eq!(manual.closing_balance, dec!(5000.00));

    let rebuilt = balances
        .recalculate(t.workspace_id, period_id(&feb), "PLN")
        .await
        .unwrap();
    assert_eq!(rebuilt.opening_balance, dec!(5000.00));

    // An explicit zero is kept as well.
    balances
        .update_opening_balance(t.workspace_id, PeriodBalanceId::new(feb_pln.id), Decimal::ZERO)
        .await
        .unwrap();
    let rebuilt = balances
        .recalculate(t.workspace_id, period_id(&feb), "PLN")
        .await
        .unwrap();
    assert_eq!(rebuilt.opening_balance, Decimal::ZERO);
    assert_reconciled(&rebuilt);
}

#[tokio::test]
async fn test_negative_opening_balance_is_rejected() {
    let Some(db) = common::connect().await else {
        return;
    };
    let t = tenant(&db).await;
    let jan = period(&db, &t, "January", d(2025, 1, 1), d(2025, 1, 31)).await;
    let row = balance_of(&db, jan.id, "USD").await;

    let err = PeriodBalanceRepository::new(db.clone(), &common::ledger_config())
        .update_opening_balance(t.workspace_id, PeriodBalanceId::new(row.id), dec!(-1))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerRepoError::Ledger(LedgerError::InvalidOpeningBalance(_))
    ));
    assert_eq!(balance_of(&db, jan.id, "USD").await, row);
}

#[tokio::test]
async fn test_recalculation_is_idempotent() {
    let Some(db) = common::connect().await else {
        return;
    };
    let t = tenant(&db).await;
    let jan = period(&db, &t, "January", d(2025, 1, 1), d(2025, 1, 31)).await;
    let transactions = TransactionRepository::new(db.clone());
    let balances = PeriodBalanceRepository::new(db.clone(), &common::ledger_config());

    transactions
        .create(t.workspace_id, income(d(2025, 1, 2), dec!(3000.00), "EUR"))
        .await
        .unwrap();
    transactions
        .create(t.workspace_id, expense(d(2025, 1, 3), dec!(1250.50), "EUR"))
        .await
        .unwrap();

    let first = balances
        .recalculate_all(t.workspace_id, period_id(&jan))
        .await
        .unwrap();
    let second = balances
        .recalculate_all(t.workspace_id, period_id(&jan))
        .await
        .unwrap();
    assert_eq!(first.len(), 4);
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.totals(), b.totals());
        assert_reconciled(b);
    }
    let eur = second.iter().find(|b| b.currency == "EUR").unwrap();
    assert_eq!(eur.closing_balance, dec!(1749.50));

    let checks = balances.verify(t.workspace_id, period_id(&jan)).await.unwrap();
    assert!(checks.iter().all(|c| !c.drift.has_drift()));
}

#[tokio::test]
async fn test_create_then_delete_restores_balance() {
    let Some(db) = common::connect().await else {
        return;
    };
    let t = tenant(&db).await;
    let jan = period(&db, &t, "January", d(2025, 1, 1), d(2025, 1, 31)).await;
    let transactions = TransactionRepository::new(db.clone());

    transactions
        .create(t.workspace_id, income(d(2025, 1, 2), dec!(100.10), "USD"))
        .await
        .unwrap();
    let before = balance_of(&db, jan.id, "USD").await;

    let created = transactions
        .create(t.workspace_id, expense(d(2025, 1, 9), dec!(33.33), "USD"))
        .await
        .unwrap();
    assert_eq!(created.budget_period_id, Some(jan.id));
    let during = balance_of(&db, jan.id, "USD").await;
    assert_eq!(during.total_expenses, before.total_expenses + dec!(33.33));

    transactions
        .delete(t.workspace_id, TransactionId::new(created.id))
        .await
        .unwrap();
    let after = balance_of(&db, jan.id, "USD").await;
    assert_eq!(after.totals(), before.totals());
}

#[tokio::test]
async fn test_update_moves_posting_between_periods() {
    let Some(db) = common::connect().await else {
        return;
    };
    let t = tenant(&db).await;
    let jan = period(&db, &t, "January", d(2025, 1, 1), d(2025, 1, 31)).await;
    let feb = period(&db, &t, "February", d(2025, 2, 1), d(2025, 2, 28)).await;
    let transactions = TransactionRepository::new(db.clone());

    let created = transactions
        .create(t.workspace_id, expense(d(2025, 1, 15), dec!(200.00), "PLN"))
        .await
        .unwrap();
    let id = TransactionId::new(created.id);

    // Repeated identical edits must not drift.
    for _ in 0..3 {
        transactions
            .update(t.workspace_id, id, expense(d(2025, 1, 15), dec!(200.00), "PLN"))
            .await
            .unwrap();
    }
    assert_eq!(balance_of(&db, jan.id, "PLN").await.total_expenses, dec!(200.00));

    let moved = transactions
        .update(t.workspace_id, id, expense(d(2025, 2, 3), dec!(250.00), "EUR"))
        .await
        .unwrap();
    assert_eq!(moved.budget_period_id, Some(feb.id));

    let jan_pln = balance_of(&db, jan.id, "PLN").await;
    let feb_eur = balance_of(&db, feb.id, "EUR").await;
    assert_eq!(jan_pln.total_expenses, Decimal::ZERO);
    assert_eq!(jan_pln.closing_balance, Decimal::ZERO);
    assert_eq!(feb_eur.total_expenses, dec!(250.00));
    assert_eq!(feb_eur.closing_balance, dec!(-250.00));
}

#[tokio::test]
async fn test_exchange_round_trip() {
    let Some(db) = common::connect().await else {
        return;
    };
    let t = tenant(&db).await;
    let p = period(&db, &t, "March", d(2025, 3, 1), d(2025, 3, 31)).await;
    let exchanges = CurrencyExchangeRepository::new(db.clone());
    let usd_before = balance_of(&db, p.id, "USD").await;
    let eur_before = balance_of(&db, p.id, "EUR").await;

    let created = exchanges
        .create(
            t.workspace_id,
            ExchangeInput {
                date: d(2025, 3, 10),
                description: None,
                from_currency: "USD".to_string(),
                from_amount: dec!(100.00),
                to_currency: "EUR".to_string(),
                to_amount: dec!(92.00),
            },
        )
        .await
        .unwrap();
    assert_eq!(created.budget_period_id, Some(p.id));
    assert_eq!(created.exchange_rate, dec!(0.920000));

    let usd = balance_of(&db, p.id, "USD").await;
    let eur = balance_of(&db, p.id, "EUR").await;
    assert_eq!(usd.exchanges_out, dec!(100.00));
    assert_eq!(usd.closing_balance, usd_before.closing_balance - dec!(100.00));
    assert_eq!(eur.exchanges_in, dec!(92.00));
    assert_eq!(eur.closing_balance, eur_before.closing_balance + dec!(92.00));

    exchanges
        .delete(
            t.workspace_id,
            CurrencyExchangeId::new(created.id),
        )
        .await
        .unwrap();
    assert_eq!(balance_of(&db, p.id, "USD").await.totals(), usd_before.totals());
    assert_eq!(balance_of(&db, p.id, "EUR").await.totals(), eur_before.totals());
}

#[tokio::test]
async fn test_unassigned_entry_touches_no_balance() {
    let Some(db) = common::connect().await else {
        return;
    };
    let t = tenant(&db).await;
    let jan = period(&db, &t, "January", d(2025, 1, 1), d(2025, 1, 31)).await;
    let transactions = TransactionRepository::new(db.clone());
    let balances = PeriodBalanceRepository::new(db.clone(), &common::ledger_config());

    let stray = transactions
        .create(t.workspace_id, income(d(2024, 6, 1), dec!(999.00), "UAH"))
        .await
        .unwrap();
    assert_eq!(stray.budget_period_id, None);

    let uah = balance_of(&db, jan.id, "UAH").await;
    assert_eq!(uah.total_income, Decimal::ZERO);

    let rebuilt = balances
        .recalculate(t.workspace_id, period_id(&jan), "UAH")
        .await
        .unwrap();
    assert_eq!(rebuilt.total_income, Decimal::ZERO);
}

#[tokio::test]
async fn test_lazy_balance_row_for_unconfigured_currency() {
    let Some(db) = common::connect().await else {
        return;
    };
    let t = tenant(&db).await;
    let jan = period(&db, &t, "January", d(2025, 1, 1), d(2025, 1, 31)).await;
    assert!(balance(&db, jan.id, "GBP").await.is_none());

    TransactionRepository::new(db.clone())
        .create(t.workspace_id, income(d(2025, 1, 2), dec!(10.00), "GBP"))
        .await
        .unwrap();
    let gbp = balance_of(&db, jan.id, "GBP").await;
    assert_eq!(gbp.total_income, dec!(10.00));
    assert_reconciled(&gbp);
}

#[tokio::test]
async fn test_import_is_all_or_nothing() {
    let Some(db) = common::connect().await else {
        return;
    };
    let t = tenant(&db).await;
    let jan = period(&db, &t, "January", d(2025, 1, 1), d(2025, 1, 31)).await;
    let food = common::category(&db, jan.id, "Food").await;
    let transactions = TransactionRepository::new(db.clone());
    let before = balance_of(&db, jan.id, "PLN").await;

    let row = |amount: Decimal, kind: TransactionType| ImportTransactionRow {
        date: d(2025, 1, 10),
        description: "Imported".to_string(),
        category_name: Some("Food".to_string()),
        amount,
        currency: "PLN".to_string(),
        transaction_type: kind,
    };

    let err = transactions
        .import(
            t.workspace_id,
            period_id(&jan),
            vec![
                row(dec!(10.00), TransactionType::Expense),
                row(dec!(-5.00), TransactionType::Expense),
            ],
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerRepoError::Ledger(LedgerError::NonPositiveAmount { .. })
    ));
    assert_eq!(balance_of(&db, jan.id, "PLN").await.totals(), before.totals());

    let imported = transactions
        .import(
            t.workspace_id,
            period_id(&jan),
            vec![
                row(dec!(10.00), TransactionType::Expense),
                row(dec!(50.00), TransactionType::Income),
            ],
        )
        .await
        .unwrap();
    assert_eq!(imported[0].category_id, Some(food.id));
    assert_eq!(imported[1].category_id, None);

    let after = balance_of(&db, jan.id, "PLN").await;
    assert_eq!(after.total_expenses, dec!(10.00));
    assert_eq!(after.total_income, dec!(50.00));
    assert_reconciled(&after);
}

#[tokio::test]
async fn test_exchange_update_reverts_stored_legs() {
    let Some(db) = common::connect().await else {
        return;
    };
    let t = tenant(&db).await;
    let jan = period(&db, &t, "January", d(2025, 1, 1), d(2025, 1, 31)).await;
    let feb = period(&db, &t, "February", d(2025, 2, 1), d(2025, 2, 28)).await;
    let exchanges = CurrencyExchangeRepository::new(db.clone());

    let created = exchanges
        .create(
            t.workspace_id,
            exchange(d(2025, 1, 10), ("USD", dec!(100.00)), ("EUR", dec!(92.00))),
        )
        .await
        .unwrap();
    assert_eq!(balance_of(&db, jan.id, "USD").await.exchanges_out, dec!(100.00));
    assert_eq!(balance_of(&db, jan.id, "EUR").await.exchanges_in, dec!(92.00));

    let moved = exchanges
        .update(
            t.workspace_id,
            CurrencyExchangeId::new(created.id),
            exchange(d(2025, 2, 5), ("EUR", dec!(10.00)), ("PLN", dec!(43.00))),
        )
        .await
        .unwrap();
    assert_eq!(moved.budget_period_id, Some(feb.id));
    assert_eq!(moved.exchange_rate, dec!(4.300000));

    let jan_usd = balance_of(&db, jan.id, "USD").await;
    let jan_eur = balance_of(&db, jan.id, "EUR").await;
    let feb_eur = balance_of(&db, feb.id, "EUR").await;
    let feb_pln = balance_of(&db, feb.id, "PLN").await;
    assert_eq!(jan_usd.exchanges_out, Decimal::ZERO);
    assert_eq!(jan_usd.closing_balance, Decimal::ZERO);
    assert_eq!(jan_eur.exchanges_in, Decimal::ZERO);
    assert_eq!(jan_eur.closing_balance, Decimal::ZERO);
    assert_eq!(feb_eur.exchanges_out, dec!(10.00));
    assert_eq!(feb_eur.exchanges_in, Decimal::ZERO);
    assert_eq!(feb_eur.closing_balance, dec!(-10.00));
    assert_eq!(feb_pln.exchanges_in, dec!(43.00));
    assert_eq!(feb_pln.closing_balance, dec!(43.00));
    for row in [&jan_usd, &jan_eur, &feb_eur, &feb_pln] {
        assert_reconciled(row);
    }
}

#[tokio::test]
async fn test_sub_cent_amounts_are_rejected_before_posting() {
    let Some(db) = common::connect().await else {
        return;
    };
    let t = tenant(&db).await;
    let jan = period(&db, &t, "January", d(2025, 1, 1), d(2025, 1, 31)).await;
    let transactions = TransactionRepository::new(db.clone());
    let pln_before = balance_of(&db, jan.id, "PLN").await;

    for amount in [dec!(0.005), dec!(0.004)] {
        let err = transactions
            .create(t.workspace_id, income(d(2025, 1, 2), amount, "PLN"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerRepoError::Ledger(LedgerError::TooManyDecimalPlaces { field: "amount", .. })
        ));
    }

    let err = CurrencyExchangeRepository::new(db.clone())
        .create(
            t.workspace_id,
            exchange(d(2025, 1, 3), ("PLN", dec!(10.00)), ("USD", dec!(2.505))),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerRepoError::Ledger(LedgerError::TooManyDecimalPlaces { field: "to_amount", .. })
    ));

    let err = PeriodBalanceRepository::new(db.clone(), &common::ledger_config())
        .update_opening_balance(t.workspace_id, PeriodBalanceId::new(pln_before.id), dec!(10.001))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerRepoError::Ledger(LedgerError::TooManyDecimalPlaces {
            field: "opening_balance",
            ..
        })
    ));

    assert_eq!(balance_of(&db, jan.id, "PLN").await, pln_before);
    assert!(
        transactions
            .list(t.workspace_id, Default::default())
            .await
            .unwrap()
            .is_empty()
    );
}
