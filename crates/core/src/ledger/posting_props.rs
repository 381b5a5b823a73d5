//! Property tests for posting plans applied to balance rows.

use std::collections::BTreeMap;

use kasa_shared::types::{BudgetPeriodId, CurrencyCode};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::balance::BalanceTotals;
use super::posting::{BalanceKey, ExchangeLegs, PostingPlan, TransactionLeg, TransactionType};

type Book = BTreeMap<BalanceKey, BalanceTotals>;

fn apply(book: &mut Book, plan: &PostingPlan) {
    for key in plan.lock_order() {
        let row = book.entry(key).or_insert_with(BalanceTotals::zero);
        for delta in plan.deltas_for(key) {
            row.apply(delta).unwrap();
        }
    }
}

/// Drops rows that are entirely zero so lazily created rows compare equal to absent ones.
fn normalized(book: &Book) -> Book {
    book.iter()
        .filter(|(_, row)| **row != BalanceTotals::zero())
        .map(|(k, v)| (*k, *v))
        .collect()
}

fn currency_strategy() -> impl Strategy<Value = CurrencyCode> {
    prop_oneof![Just("PLN"), Just("USD"), Just("EUR"), Just("UAH")]
        .prop_map(|c| CurrencyCode::parse(c).unwrap())
}

fn period_strategy() -> impl Strategy<Value = Option<BudgetPeriodId>> {
    prop_oneof![Just(None), (1i64..4).prop_map(|id| Some(BudgetPeriodId::new(id)))]
}

fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..5_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

fn transaction_strategy() -> impl Strategy<Value = TransactionLeg> {
    (
        period_strategy(),
        currency_strategy(),
        prop_oneof![Just(TransactionType::Income), Just(TransactionType::Expense)],
        amount_strategy(),
    )
        .prop_map(|(period_id, currency, transaction_type, amount)| TransactionLeg {
            period_id,
            currency,
            transaction_type,
            amount,
        })
}

fn exchange_strategy() -> impl Strategy<Value = ExchangeLegs> {
    (
        period_strategy(),
        currency_strategy(),
        amount_strategy(),
        currency_strategy(),
        amount_strategy(),
    )
        .prop_filter("legs need distinct currencies", |(_, from, _, to, _)| from != to)
        .prop_map(|(period_id, from_currency, from_amount, to_currency, to_amount)| ExchangeLegs {
            period_id,
            from_currency,
            from_amount,
            to_currency,
            to_amount,
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Creating a transaction then deleting it restores every touched row.
    #[test]
    fn prop_transaction_create_delete_is_identity(
        history in prop::collection::vec(transaction_strategy(), 0..10),
        leg in transaction_strategy(),
    ) {
        let mut book = Book::new();
        for h in &history {
            apply(&mut book, &PostingPlan::create(h));
        }
        let before = normalized(&book);

        apply(&mut book, &PostingPlan::create(&leg));
        apply(&mut book, &PostingPlan::delete(&leg));

        prop_assert_eq!(normalized(&book), before);
    }

    /// Creating an exchange then deleting it restores both legs.
    #[test]
    fn prop_exchange_create_delete_is_identity(
        history in prop::collection::vec(exchange_strategy(), 0..10),
        exchange in exchange_strategy(),
    ) {
        let mut book = Book::new();
        for h in &history {
            apply(&mut book, &PostingPlan::create(h));
        }
        let before = normalized(&book);

        apply(&mut book, &PostingPlan::create(&exchange));
        apply(&mut book, &PostingPlan::delete(&exchange));

        prop_assert_eq!(normalized(&book), before);
    }

    /// Any chain of edits ends where creating the final version directly would.
    #[test]
    fn prop_repeated_updates_do_not_drift(
        versions in prop::collection::vec(transaction_strategy(), 1..8),
    ) {
        let mut edited = Book::new();
        apply(&mut edited, &PostingPlan::create(&versions[0]));
        for pair in versions.windows(2) {
            apply(&mut edited, &PostingPlan::update(&pair[0], &pair[1]));
        }

        let mut direct = Book::new();
        if let Some(last) = versions.last() {
            apply(&mut direct, &PostingPlan::create(last));
        }

        prop_assert_eq!(normalized(&edited), normalized(&direct));
        for row in edited.values() {
            prop_assert!(row.verify_invariant().is_ok());
        }
    }

    /// Lock order is sorted and duplicate-free.
    #[test]
    fn prop_lock_order_is_strictly_ascending(
        stored in exchange_strategy(),
        replacement in exchange_strategy(),
    ) {
        let plan = PostingPlan::update(&stored, &replacement);
        let order = plan.lock_order();
        prop_assert!(order.windows(2).all(|w| w[0] < w[1]));
    }
}
