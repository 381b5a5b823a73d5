//! Entry validation before any balance row is touched.
//!
//! Every mutation path builds an [`EntryScope`] from the caller's workspace (the periods
//! and categories it may reference) and runs the proposed entry through one of the
//! functions here. They resolve the budget period, strip or check the category, parse
//! the currency, and produce the postable form of the entry.

use chrono::NaiveDate;
use kasa_shared::types::{BudgetPeriodId, CategoryId, CurrencyCode};
use rust_decimal::Decimal;

use super::error::LedgerError;
use super::exchange::exchange_rate;
use super::posting::{ExchangeLegs, TransactionLeg, TransactionType};
use crate::period::{PeriodSpan, covering_period};

/// A category and the period that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryScope {
    /// Category identity.
    pub id: CategoryId,
    /// Owning period.
    pub period_id: BudgetPeriodId,
}

/// What the caller's workspace allows an entry to reference.
///
/// `periods` holds every workspace period relevant to the entry: the explicitly
/// requested one if it exists in the workspace, otherwise those covering the entry date.
#[derive(Debug, Clone, Default)]
pub struct EntryScope {
    /// Periods visible to the caller.
    pub periods: Vec<PeriodSpan>,
    /// Categories visible to the caller.
    pub categories: Vec<CategoryScope>,
}

impl EntryScope {
    fn resolve_period(
        &self,
        explicit: Option<BudgetPeriodId>,
        date: NaiveDate,
    ) -> Result<Option<BudgetPeriodId>, LedgerError> {
        match explicit {
            Some(id) => self
                .periods
                .iter()
                .any(|p| p.id == id)
                .then_some(Some(id))
                .ok_or(LedgerError::PeriodNotFound(id)),
            None => Ok(covering_period(date, &self.periods).map(|p| p.id)),
        }
    }

    fn check_category(
        &self,
        category_id: Option<CategoryId>,
        period_id: Option<BudgetPeriodId>,
    ) -> Result<Option<CategoryId>, LedgerError> {
        let Some(category_id) = category_id else {
            return Ok(None);
        };
        let owned = self
            .categories
            .iter()
            .any(|c| c.id == category_id && Some(c.period_id) == period_id);
        if owned {
            Ok(Some(category_id))
        } else {
            Err(LedgerError::CategoryNotInPeriod(category_id))
        }
    }
}

/// Decimal places kept by every stored amount.
pub const AMOUNT_SCALE: u32 = 2;

/// Rejects amounts that the balance columns would have to round.
///
/// Postgres rounds each `NUMERIC(15, 2)` column on its own, so an unrounded delta
/// would leave a row that no longer reconciles.
///
/// # Errors
///
/// Returns `TooManyDecimalPlaces` if `amount` is not exact at two decimal places.
pub fn check_scale(field: &'static str, amount: Decimal) -> Result<Decimal, LedgerError> {
    if amount.round_dp(AMOUNT_SCALE) == amount {
        Ok(amount)
    } else {
        Err(LedgerError::TooManyDecimalPlaces { field, amount })
    }
}

fn positive(field: &'static str, amount: Decimal) -> Result<Decimal, LedgerError> {
    if amount > Decimal::ZERO {
        check_scale(field, amount)
    } else {
        Err(LedgerError::NonPositiveAmount { field, amount })
    }
}

/// Parses a submitted currency code.
///
/// # Errors
///
/// Returns `InvalidCurrency` unless `code` is three uppercase ASCII letters.
pub fn parse_currency(code: &str) -> Result<CurrencyCode, LedgerError> {
    CurrencyCode::parse(code).map_err(|_| LedgerError::InvalidCurrency(code.to_string()))
}

fn non_empty(field: &'static str, value: &str) -> Result<(), LedgerError> {
    if value.trim().is_empty() {
        Err(LedgerError::EmptyName(field))
    } else {
        Ok(())
    }
}

/// A transaction as submitted.
#[derive(Debug, Clone)]
pub struct ProposedTransaction {
    /// Explicit period, or `None` to resolve from the date.
    pub period_id: Option<BudgetPeriodId>,
    /// Booking date.
    pub date: NaiveDate,
    /// Optional category; ignored for income.
    pub category_id: Option<CategoryId>,
    /// Amount as submitted.
    pub amount: Decimal,
    /// Currency as submitted.
    pub currency: String,
    /// Income or expense.
    pub transaction_type: TransactionType,
}

/// A transaction ready to persist and post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedTransaction {
    /// Resolved period; `None` means unassigned.
    pub period_id: Option<BudgetPeriodId>,
    /// Category, always `None` for income.
    pub category_id: Option<CategoryId>,
    /// Parsed currency.
    pub currency: CurrencyCode,
    /// Positive amount.
    pub amount: Decimal,
    /// Income or expense.
    pub transaction_type: TransactionType,
}

impl ValidatedTransaction {
    /// Ledger view of this transaction.
    #[must_use]
    pub const fn leg(&self) -> TransactionLeg {
        TransactionLeg {
            period_id: self.period_id,
            currency: self.currency,
            transaction_type: self.transaction_type,
            amount: self.amount,
        }
    }
}

/// Validates a transaction against the caller's scope.
///
/// # Errors
///
/// Returns a validation error, or `PeriodNotFound` for an explicit period outside the scope.
pub fn validate_transaction(
    proposed: &ProposedTransaction,
    scope: &EntryScope,
) -> Result<ValidatedTransaction, LedgerError> {
    let amount = positive("amount", proposed.amount)?;
    let currency = parse_currency(&proposed.currency)?;
    let period_id = scope.resolve_period(proposed.period_id, proposed.date)?;
    let category_id = match proposed.transaction_type {
        TransactionType::Income => None,
        TransactionType::Expense => scope.check_category(proposed.category_id, period_id)?,
    };
    Ok(ValidatedTransaction {
        period_id,
        category_id,
        currency,
        amount,
        transaction_type: proposed.transaction_type,
    })
}

/// A currency exchange as submitted.
#[derive(Debug, Clone)]
pub struct ProposedExchange {
    /// Exchange date; the period is always resolved from it.
    pub date: NaiveDate,
    /// Currency paid out.
    pub from_currency: String,
    /// Amount paid out.
    pub from_amount: Decimal,
    /// Currency received.
    pub to_currency: String,
    /// Amount received.
    pub to_amount: Decimal,
}

/// An exchange ready to persist and post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedExchange {
    /// Resolved legs.
    pub legs: ExchangeLegs,
    /// Derived rate, six decimal places.
    pub exchange_rate: Decimal,
}

/// Validates an exchange and resolves its period from the date.
///
/// # Errors
///
/// Returns a validation error for non-positive amounts, bad codes, or equal currencies.
pub fn validate_exchange(
    proposed: &ProposedExchange,
    scope: &EntryScope,
) -> Result<ValidatedExchange, LedgerError> {
    let from_amount = positive("from_amount", proposed.from_amount)?;
    let to_amount = positive("to_amount", proposed.to_amount)?;
    let from_currency = parse_currency(&proposed.from_currency)?;
    let to_currency = parse_currency(&proposed.to_currency)?;
    if from_currency == to_currency {
        return Err(LedgerError::SameCurrencyExchange);
    }
    let period_id = scope.resolve_period(None, proposed.date)?;
    Ok(ValidatedExchange {
        legs: ExchangeLegs {
            period_id,
            from_currency,
            from_amount,
            to_currency,
            to_amount,
        },
        exchange_rate: exchange_rate(from_amount, to_amount)?,
    })
}

/// A planned transaction as submitted.
#[derive(Debug, Clone)]
pub struct ProposedPlanned {
    /// Explicit period, or `None` to resolve from the planned date.
    pub period_id: Option<BudgetPeriodId>,
    /// Display name.
    pub name: String,
    /// Amount as submitted.
    pub amount: Decimal,
    /// Currency as submitted.
    pub currency: String,
    /// Optional expense category.
    pub category_id: Option<CategoryId>,
    /// Date the payment is planned for.
    pub planned_date: NaiveDate,
}

/// A planned transaction ready to persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedPlanned {
    /// Resolved period; `None` when nothing covers the planned date.
    pub period_id: Option<BudgetPeriodId>,
    /// Checked category.
    pub category_id: Option<CategoryId>,
    /// Parsed currency.
    pub currency: CurrencyCode,
    /// Positive amount.
    pub amount: Decimal,
}

/// Validates a planned transaction. Planned entries are always expenses.
///
/// # Errors
///
/// Returns a validation error, or `PeriodNotFound` for an explicit period outside the scope.
pub fn validate_planned(
    proposed: &ProposedPlanned,
    scope: &EntryScope,
) -> Result<ValidatedPlanned, LedgerError> {
    non_empty("name", &proposed.name)?;
    let amount = positive("amount", proposed.amount)?;
    let currency = parse_currency(&proposed.currency)?;
    let period_id = scope.resolve_period(proposed.period_id, proposed.planned_date)?;
    let category_id = scope.check_category(proposed.category_id, period_id)?;
    Ok(ValidatedPlanned {
        period_id,
        category_id,
        currency,
        amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn january() -> PeriodSpan {
        PeriodSpan {
            id: BudgetPeriodId::new(1),
            start_date: d(2025, 1, 1),
            end_date: d(2025, 1, 31),
        }
    }

    fn scope() -> EntryScope {
        EntryScope {
            periods: vec![january()],
            categories: vec![CategoryScope {
                id: CategoryId::new(10),
                period_id: BudgetPeriodId::new(1),
            }],
        }
    }

    fn expense(date: NaiveDate) -> ProposedTransaction {
        ProposedTransaction {
            period_id: None,
            date,
            category_id: Some(CategoryId::new(10)),
            amount: dec!(25.00),
            currency: "PLN".to_string(),
            transaction_type: TransactionType::Expense,
        }
    }

    #[test]
    fn test_transaction_period_resolved_from_date() {
        let validated = validate_transaction(&expense(d(2025, 1, 15)), &scope()).unwrap();
        assert_eq!(validated.period_id, Some(BudgetPeriodId::new(1)));
        assert_eq!(validated.category_id, Some(CategoryId::new(10)));
    }

    #[test]
    fn test_transaction_outside_every_period_is_unassigned() {
        let mut proposed = expense(d(2025, 6, 1));
        proposed.category_id = None;
        let validated = validate_transaction(&proposed, &EntryScope::default()).unwrap();
        assert_eq!(validated.period_id, None);
        assert!(crate::ledger::PostingPlan::create(&validated.leg()).is_empty());
    }

    #[test]
    fn test_category_on_unassigned_transaction_is_rejected() {
        let proposed = expense(d(2025, 6, 1));
        assert_eq!(
            validate_transaction(&proposed, &EntryScope::default()),
            Err(LedgerError::CategoryNotInPeriod(CategoryId::new(10)))
        );
    }

    #[test]
    fn test_income_category_is_stripped() {
        let mut proposed = expense(d(2025, 1, 15));
        proposed.transaction_type = TransactionType::Income;
        proposed.category_id = Some(CategoryId::new(999));
        let validated = validate_transaction(&proposed, &scope()).unwrap();
        assert_eq!(validated.category_id, None);
    }

    #[test]
    fn test_category_from_other_period_is_rejected() {
        let mut proposed = expense(d(2025, 1, 15));
        proposed.category_id = Some(CategoryId::new(11));
        assert_eq!(
            validate_transaction(&proposed, &scope()),
            Err(LedgerError::CategoryNotInPeriod(CategoryId::new(11)))
        );
    }

    #[test]
    fn test_explicit_period_outside_scope_is_not_found() {
        let mut proposed = expense(d(2025, 1, 15));
        proposed.period_id = Some(BudgetPeriodId::new(77));
        assert_eq!(
            validate_transaction(&proposed, &scope()),
            Err(LedgerError::PeriodNotFound(BudgetPeriodId::new(77)))
        );
    }

    #[rstest]
    #[case(dec!(0))]
    #[case(dec!(-1.00))]
    fn test_non_positive_transaction_amount(#[case] amount: Decimal) {
        let mut proposed = expense(d(2025, 1, 15));
        proposed.amount = amount;
        assert!(matches!(
            validate_transaction(&proposed, &scope()),
            Err(LedgerError::NonPositiveAmount { field: "amount", .. })
        ));
    }

    #[rstest]
    #[case(dec!(0.005))]
    #[case(dec!(0.004))]
    #[case(dec!(10.001))]
    fn test_sub_cent_transaction_amount(#[case] amount: Decimal) {
        let mut proposed = expense(d(2025, 1, 15));
        proposed.amount = amount;
        assert_eq!(
            validate_transaction(&proposed, &scope()),
            Err(LedgerError::TooManyDecimalPlaces {
                field: "amount",
                amount
            })
        );
    }

    #[rstest]
    #[case(dec!(0.01))]
    #[case(dec!(12.5))]
    #[case(dec!(7.000))]
    fn test_amount_exact_at_two_places_is_accepted(#[case] amount: Decimal) {
        let mut proposed = expense(d(2025, 1, 15));
        proposed.amount = amount;
        assert_eq!(validate_transaction(&proposed, &scope()).unwrap().amount, amount);
    }

    #[rstest]
    #[case("pln")]
    #[case("PL")]
    #[case("PLNX")]
    fn test_malformed_currency(#[case] code: &str) {
        let mut proposed = expense(d(2025, 1, 15));
        proposed.currency = code.to_string();
        assert_eq!(
            validate_transaction(&proposed, &scope()),
            Err(LedgerError::InvalidCurrency(code.to_string()))
        );
    }

    fn exchange() -> ProposedExchange {
        ProposedExchange {
            date: d(2025, 1, 20),
            from_currency: "USD".to_string(),
            from_amount: dec!(100.00),
            to_currency: "EUR".to_string(),
            to_amount: dec!(92.00),
        }
    }

    #[test]
    fn test_exchange_resolves_period_and_rate() {
        let validated = validate_exchange(&exchange(), &scope()).unwrap();
        assert_eq!(validated.legs.period_id, Some(BudgetPeriodId::new(1)));
        assert_eq!(validated.exchange_rate, dec!(0.92));
    }

    #[test]
    fn test_exchange_same_currency_rejected() {
        let mut proposed = exchange();
        proposed.to_currency = "USD".to_string();
        assert_eq!(
            validate_exchange(&proposed, &scope()),
            Err(LedgerError::SameCurrencyExchange)
        );
    }

    #[test]
    fn test_exchange_zero_amount_rejected() {
        let mut proposed = exchange();
        proposed.to_amount = Decimal::ZERO;
        assert!(matches!(
            validate_exchange(&proposed, &scope()),
            Err(LedgerError::NonPositiveAmount { field: "to_amount", .. })
        ));
    }

    #[rstest]
    #[case(dec!(100.005), dec!(92.00), "from_amount")]
    #[case(dec!(100.00), dec!(92.0001), "to_amount")]
    fn test_exchange_sub_cent_amount_rejected(
        #[case] from_amount: Decimal,
        #[case] to_amount: Decimal,
        #[case] field: &str,
    ) {
        let mut proposed = exchange();
        proposed.from_amount = from_amount;
        proposed.to_amount = to_amount;
        assert!(matches!(
            validate_exchange(&proposed, &scope()),
            Err(LedgerError::TooManyDecimalPlaces { field: f, .. }) if f == field
        ));
    }

    #[test]
    fn test_planned_sub_cent_amount_rejected() {
        let proposed = ProposedPlanned {
            period_id: None,
            name: "Rent".to_string(),
            amount: dec!(1200.005),
            currency: "USD".to_string(),
            category_id: None,
            planned_date: d(2025, 1, 5),
        };
        assert!(matches!(
            validate_planned(&proposed, &scope()),
            Err(LedgerError::TooManyDecimalPlaces { field: "amount", .. })
        ));
    }

    #[test]
    fn test_planned_requires_name() {
        let proposed = ProposedPlanned {
            period_id: None,
            name: "  ".to_string(),
            amount: dec!(1200.00),
            currency: "USD".to_string(),
            category_id: None,
            planned_date: d(2025, 1, 5),
        };
        assert_eq!(
            validate_planned(&proposed, &scope()),
            Err(LedgerError::EmptyName("name"))
        );
    }

    #[test]
    fn test_planned_resolves_period_from_planned_date() {
        let proposed = ProposedPlanned {
            period_id: None,
            name: "Rent".to_string(),
            amount: dec!(1200.00),
            currency: "USD".to_string(),
            category_id: Some(CategoryId::new(10)),
            planned_date: d(2025, 1, 5),
        };
        let validated = validate_planned(&proposed, &scope()).unwrap();
        assert_eq!(validated.period_id, Some(BudgetPeriodId::new(1)));
        assert_eq!(validated.category_id, Some(CategoryId::new(10)));
    }
}
