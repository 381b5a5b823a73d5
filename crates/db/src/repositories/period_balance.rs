//! Period balance repository: reads, manual opening balances, and full recalculation.

use std::collections::BTreeSet;

use chrono::Utc;
use kasa_core::ledger::{
    BalanceDrift, LedgerError, OpeningBalance, PeriodAggregates, Recalculator, check_scale,
    parse_currency,
};
use kasa_shared::config::LedgerConfig;
use kasa_shared::types::{BudgetPeriodId, CurrencyCode, PeriodBalanceId, WorkspaceId};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, JoinType, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select, Set,
    TransactionTrait,
};
use serde::Serialize;
use tracing::info;

use super::error::LedgerRepoError;
use super::ledger::{lock_balance, lock_balance_by_id};
use super::scope::{find_period, previous_span};
use crate::entities::sea_orm_active_enums::TransactionType;
use crate::entities::{
    budget_accounts, budget_periods, currency_exchanges, period_balances, transactions,
};

/// Filter for listing balances.
#[derive(Debug, Clone, Default)]
pub struct BalanceFilter {
    /// Only rows of this period.
    pub budget_period_id: Option<BudgetPeriodId>,
    /// Only rows in this currency.
    pub currency: Option<String>,
}

/// A stored balance row with its drift report.
#[derive(Debug, Clone, Serialize)]
pub struct BalanceCheck {
    /// The row as stored.
    pub balance: period_balances::Model,
    /// Comparison against a fresh aggregation.
    #[serde(flatten)]
    pub drift: BalanceDrift,
}

/// Period balance repository.
#[derive(Debug, Clone)]
pub struct PeriodBalanceRepository {
    db: DatabaseConnection,
    currencies: Vec<CurrencyCode>,
}

fn balances_in(workspace_id: WorkspaceId) -> Select<period_balances::Entity> {
    period_balances::Entity::find()
        .inner_join(budget_periods::Entity)
        .join(
            JoinType::InnerJoin,
            budget_periods::Relation::BudgetAccounts.def(),
        )
        .filter(budget_accounts::Column::WorkspaceId.eq(workspace_id.into_inner()))
}

async fn sum_of<C, E>(conn: &C, select: Select<E>, column: E::Column) -> Result<Decimal, LedgerRepoError>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let total: Option<Option<Decimal>> = select
        .select_only()
        .column_as(Expr::col(column).sum(), "total")
        .into_tuple()
        .one(conn)
        .await?;
    Ok(total.flatten().unwrap_or(Decimal::ZERO))
}

/// Sums every assigned entry of `(period_id, currency)`.
pub(crate) async fn aggregate<C: ConnectionTrait>(
    conn: &C,
    period_id: BudgetPeriodId,
    currency: CurrencyCode,
) -> Result<PeriodAggregates, LedgerRepoError> {
    let period = period_id.into_inner();
    let code = currency.as_str();

    let by_type = |kind: TransactionType| {
        transactions::Entity::find()
            .filter(transactions::Column::BudgetPeriodId.eq(period))
            .filter(transactions::Column::Currency.eq(code))
            .filter(transactions::Column::TransactionType.eq(kind))
    };
    let total_income = sum_of(conn, by_type(TransactionType::Income), transactions::Column::Amount).await?;
    let total_expenses =
        sum_of(conn, by_type(TransactionType::Expense), transactions::Column::Amount).await?;

    let exchanges_in = sum_of(
        conn,
        currency_exchanges::Entity::find()
            .filter(currency_exchanges::Column::BudgetPeriodId.eq(period))
            .filter(currency_exchanges::Column::ToCurrency.eq(code)),
        currency_exchanges::Column::ToAmount,
    )
    .await?;
    let exchanges_out = sum_of(
        conn,
        currency_exchanges::Entity::find()
            .filter(currency_exchanges::Column::BudgetPeriodId.eq(period))
            .filter(currency_exchanges::Column::FromCurrency.eq(code)),
        currency_exchanges::Column::FromAmount,
    )
    .await?;

    Ok(PeriodAggregates {
        total_income,
        total_expenses,
        exchanges_in,
        exchanges_out,
    })
}

impl PeriodBalanceRepository {
    /// Creates a new period balance repository.
    #[must_use]
    pub fn new(db: DatabaseConnection, ledger: &LedgerConfig) -> Self {
        Self {
            db,
            currencies: ledger.supported_currencies.clone(),
        }
    }

    /// Lists balances of the workspace, ordered by period then currency.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCurrency` for a malformed currency filter, or a database error.
    pub async fn list(
        &self,
        workspace_id: WorkspaceId,
        filter: BalanceFilter,
    ) -> Result<Vec<period_balances::Model>, LedgerRepoError> {
        let mut query = balances_in(workspace_id);
        if let Some(period_id) = filter.budget_period_id {
            query = query.filter(period_balances::Column::BudgetPeriodId.eq(period_id.into_inner()));
        }
        if let Some(currency) = filter.currency.as_deref() {
            let currency = parse_currency(currency)?;
            query = query.filter(period_balances::Column::Currency.eq(currency.as_str()));
        }
        Ok(query
            .order_by_asc(period_balances::Column::BudgetPeriodId)
            .order_by_asc(period_balances::Column::Currency)
            .all(&self.db)
            .await?)
    }

    /// Gets one balance of the workspace.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the row is missing or belongs to another workspace.
    pub async fn get(
        &self,
        workspace_id: WorkspaceId,
        id: PeriodBalanceId,
    ) -> Result<period_balances::Model, LedgerRepoError> {
        balances_in(workspace_id)
            .filter(period_balances::Column::Id.eq(id.into_inner()))
            .one(&self.db)
            .await?
            .ok_or_else(|| LedgerRepoError::not_found("Period balance", id))
    }

    /// Sets a manual opening balance and recomputes the closing balance.
    ///
    /// Accumulators are left as they are. The row is flagged manual so that later
    /// recalculations keep the value, including an explicit zero.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOpeningBalance` for a negative amount, `TooManyDecimalPlaces` for
    /// sub-cent precision, or `NotFound`.
    pub async fn update_opening_balance(
        &self,
        workspace_id: WorkspaceId,
        id: PeriodBalanceId,
        opening_balance: Decimal,
    ) -> Result<period_balances::Model, LedgerRepoError> {
        if opening_balance < Decimal::ZERO {
            return Err(LedgerError::InvalidOpeningBalance(opening_balance).into());
        }
        check_scale("opening_balance", opening_balance)?;
        self.get(workspace_id, id).await?;

        let txn = self.db.begin().await?;
        let row = lock_balance_by_id(&txn, id.into_inner())
            .await?
            .ok_or_else(|| LedgerRepoError::not_found("Period balance", id))?;

        let mut totals = row.totals();
        totals.set_opening(opening_balance)?;

        let mut active: period_balances::ActiveModel = row.into();
        active.set_totals(&totals);
        active.opening_balance_is_manual = Set(true);
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await?;
        txn.commit().await?;

        info!(
            balance_id = updated.id,
            period_id = updated.budget_period_id,
            currency = %updated.currency,
            opening_balance = %updated.opening_balance,
            "Opening balance set manually"
        );
        Ok(updated)
    }

    /// Rebuilds one balance from the period's entries and its predecessor.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a period outside the workspace, or `InvalidCurrency`.
    pub async fn recalculate(
        &self,
        workspace_id: WorkspaceId,
        period_id: BudgetPeriodId,
        currency: &str,
    ) -> Result<period_balances::Model, LedgerRepoError> {
        let currency = parse_currency(currency)?;
        let period = find_period(&self.db, workspace_id, period_id).await?;

        let txn = self.db.begin().await?;
        let balance = rebuild(&txn, &period, currency).await?;
        txn.commit().await?;

        info!(
            period_id = %period_id,
            currency = %currency,
            closing_balance = %balance.closing_balance,
            "Period balance recalculated"
        );
        Ok(balance)
    }

    /// Rebuilds every configured currency, plus any currency the period already has
    /// a row for, in one database transaction.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a period outside the workspace.
    pub async fn recalculate_all(
        &self,
        workspace_id: WorkspaceId,
        period_id: BudgetPeriodId,
    ) -> Result<Vec<period_balances::Model>, LedgerRepoError> {
        let period = find_period(&self.db, workspace_id, period_id).await?;

        let txn = self.db.begin().await?;
        let mut currencies: BTreeSet<CurrencyCode> = self.currencies.iter().copied().collect();
        let existing = period_balances::Entity::find()
            .filter(period_balances::Column::BudgetPeriodId.eq(period.id))
            .all(&txn)
            .await?;
        for row in &existing {
            currencies.insert(parse_currency(row.currency.trim())?);
        }

        let mut balances = Vec::with_capacity(currencies.len());
        for currency in currencies {
            balances.push(rebuild(&txn, &period, currency).await?);
        }
        txn.commit().await?;

        info!(period_id = %period_id, count = balances.len(), "Period balances recalculated");
        Ok(balances)
    }

    /// Compares each stored balance of a period with a fresh aggregation.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a period outside the workspace.
    pub async fn verify(
        &self,
        workspace_id: WorkspaceId,
        period_id: BudgetPeriodId,
    ) -> Result<Vec<BalanceCheck>, LedgerRepoError> {
        let period = find_period(&self.db, workspace_id, period_id).await?;
        let rows = period_balances::Entity::find()
            .filter(period_balances::Column::BudgetPeriodId.eq(period.id))
            .order_by_asc(period_balances::Column::Currency)
            .all(&self.db)
            .await?;

        let mut checks = Vec::with_capacity(rows.len());
        for balance in rows {
            let currency = parse_currency(balance.currency.trim())?;
            let fresh = aggregate(&self.db, period_id, currency).await?;
            let drift = Recalculator::drift(&balance.totals(), &fresh);
            checks.push(BalanceCheck { balance, drift });
        }
        Ok(checks)
    }
}

async fn rebuild(
    txn: &DatabaseTransaction,
    period: &budget_periods::Model,
    currency: CurrencyCode,
) -> Result<period_balances::Model, LedgerRepoError> {
    let period_id = BudgetPeriodId::new(period.id);
    let row = lock_balance(txn, (period_id, currency)).await?;

    let carried_over = match previous_span(txn, period).await? {
        Some(previous) => period_balances::Entity::find()
            .filter(period_balances::Column::BudgetPeriodId.eq(previous.id.into_inner()))
            .filter(period_balances::Column::Currency.eq(currency.as_str()))
            .one(txn)
            .await?
            .map(|b| b.closing_balance),
        None => None,
    };

    let aggregates = aggregate(txn, period_id, currency).await?;
    let stored = OpeningBalance {
        amount: row.opening_balance,
        is_manual: row.opening_balance_is_manual,
    };
    let totals = Recalculator::rebuild(stored, carried_over, aggregates)?;

    let mut active: period_balances::ActiveModel = row.into();
    active.set_totals(&totals);
    let now = Utc::now().into();
    active.last_calculated_at = Set(Some(now));
    active.updated_at = Set(now);
    Ok(active.update(txn).await?)
}
