//! Postings: what a ledger entry does to period balances.
//!
//! A transaction produces at most one posting, an exchange at most two. Entries
//! without a budget period produce none. A `PostingPlan` strings postings together
//! for a create, update, or delete and exposes the balance rows it touches in a
//! stable order so callers can lock them without deadlocking.

use std::collections::BTreeSet;

use kasa_shared::types::{BudgetPeriodId, CurrencyCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::balance::{BalanceDelta, BalanceField};

/// Identifies one balance row.
pub type BalanceKey = (BudgetPeriodId, CurrencyCode);

/// Direction of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money received.
    Income,
    /// Money spent.
    Expense,
}

impl TransactionType {
    /// Accumulator this transaction type feeds.
    #[must_use]
    pub const fn field(self) -> BalanceField {
        match self {
            Self::Income => BalanceField::Income,
            Self::Expense => BalanceField::Expense,
        }
    }

    /// Lowercase name as stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            _ => Err(format!("Unknown transaction type: {s}")),
        }
    }
}

/// A single delta aimed at one balance row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Posting {
    /// Owning period of the balance row.
    pub period_id: BudgetPeriodId,
    /// Currency of the balance row.
    pub currency: CurrencyCode,
    /// Change to apply.
    pub delta: BalanceDelta,
}

impl Posting {
    /// Balance row this posting targets.
    #[must_use]
    pub const fn key(&self) -> BalanceKey {
        (self.period_id, self.currency)
    }

    /// Posting that undoes this one.
    #[must_use]
    pub fn inverse(self) -> Self {
        Self {
            delta: self.delta.inverse(),
            ..self
        }
    }
}

/// Anything that contributes to period balances.
pub trait LedgerSource {
    /// Postings that record this entry. Empty when the entry is unassigned.
    fn postings(&self) -> Vec<Posting>;
}

/// The ledger-relevant part of a transaction row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionLeg {
    /// Period the transaction is assigned to, if any.
    pub period_id: Option<BudgetPeriodId>,
    /// Transaction currency.
    pub currency: CurrencyCode,
    /// Income or expense.
    pub transaction_type: TransactionType,
    /// Positive amount.
    pub amount: Decimal,
}

impl LedgerSource for TransactionLeg {
    fn postings(&self) -> Vec<Posting> {
        self.period_id
            .map(|period_id| Posting {
                period_id,
                currency: self.currency,
                delta: BalanceDelta::new(self.transaction_type.field(), self.amount),
            })
            .into_iter()
            .collect()
    }
}

/// The ledger-relevant part of a currency exchange row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeLegs {
    /// Period the exchange is assigned to, if any.
    pub period_id: Option<BudgetPeriodId>,
    /// Currency paid out.
    pub from_currency: CurrencyCode,
    /// Amount paid out.
    pub from_amount: Decimal,
    /// Currency received.
    pub to_currency: CurrencyCode,
    /// Amount received.
    pub to_amount: Decimal,
}

impl LedgerSource for ExchangeLegs {
    fn postings(&self) -> Vec<Posting> {
        let Some(period_id) = self.period_id else {
            return Vec::new();
        };
        vec![
            Posting {
                period_id,
                currency: self.from_currency,
                delta: BalanceDelta::new(BalanceField::ExchangeOut, self.from_amount),
            },
            Posting {
                period_id,
                currency: self.to_currency,
                delta: BalanceDelta::new(BalanceField::ExchangeIn, self.to_amount),
            },
        ]
    }
}

/// Ordered postings for one mutation.
///
/// Postings are applied in order. An update keeps the revert of the stored entry and
/// the application of the new one as separate postings, even when they hit the same row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostingPlan {
    postings: Vec<Posting>,
}

impl PostingPlan {
    /// Postings for a newly created entry.
    #[must_use]
    pub fn create(entry: &impl LedgerSource) -> Self {
        Self {
            postings: entry.postings(),
        }
    }

    /// Reverts the stored entry, then applies its replacement.
    #[must_use]
    pub fn update(stored: &impl LedgerSource, replacement: &impl LedgerSource) -> Self {
        let mut postings: Vec<Posting> =
            stored.postings().into_iter().map(Posting::inverse).collect();
        postings.extend(replacement.postings());
        Self { postings }
    }

    /// Reverts the stored entry.
    #[must_use]
    pub fn delete(stored: &impl LedgerSource) -> Self {
        Self {
            postings: stored.postings().into_iter().map(Posting::inverse).collect(),
        }
    }

    /// Appends the postings of another plan, used by bulk imports.
    pub fn extend(&mut self, other: Self) {
        self.postings.extend(other.postings);
    }

    /// Postings in application order.
    #[must_use]
    pub fn postings(&self) -> &[Posting] {
        &self.postings
    }

    /// True when no balance row is touched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    /// Distinct balance rows touched, ascending by (period, currency).
    ///
    /// Rows must be locked in this order.
    #[must_use]
    pub fn lock_order(&self) -> Vec<BalanceKey> {
        self.postings
            .iter()
            .map(Posting::key)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Postings that target one row, in application order.
    pub fn deltas_for(&self, key: BalanceKey) -> impl Iterator<Item = BalanceDelta> + '_ {
        self.postings
            .iter()
            .filter(move |p| p.key() == key)
            .map(|p| p.delta)
    }
}
