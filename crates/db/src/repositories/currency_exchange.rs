//! Currency exchange repository.
//!
//! An exchange posts two legs: `exchanges_out` on the source currency and
//! `exchanges_in` on the target currency, both in the period covering its date.

use chrono::{NaiveDate, Utc};
use kasa_core::ledger::{
    ExchangeLegs, PostingPlan, ProposedExchange, ValidatedExchange, parse_currency,
    validate_exchange,
};
use kasa_shared::types::{BudgetPeriodId, CurrencyExchangeId, WorkspaceId};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{info, warn};

use super::error::LedgerRepoError;
use super::ledger::apply_plan;
use super::scope::entry_scope;
use crate::entities::currency_exchanges;

/// Input for creating, replacing, or importing an exchange.
#[derive(Debug, Clone)]
pub struct ExchangeInput {
    /// Exchange date; selects the period.
    pub date: NaiveDate,
    /// Optional description.
    pub description: Option<String>,
    /// Currency paid out.
    pub from_currency: String,
    /// Amount paid out.
    pub from_amount: Decimal,
    /// Currency received.
    pub to_currency: String,
    /// Amount received.
    pub to_amount: Decimal,
}

impl ExchangeInput {
    fn proposed(&self) -> ProposedExchange {
        ProposedExchange {
            date: self.date,
            from_currency: self.from_currency.clone(),
            from_amount: self.from_amount,
            to_currency: self.to_currency.clone(),
            to_amount: self.to_amount,
        }
    }
}

/// Filter for listing exchanges.
#[derive(Debug, Clone, Default)]
pub struct ExchangeFilter {
    /// Only this period.
    pub budget_period_id: Option<BudgetPeriodId>,
    /// Exchanges with this currency on either side.
    pub currency: Option<String>,
}

/// Currency exchange repository.
#[derive(Debug, Clone)]
pub struct CurrencyExchangeRepository {
    db: DatabaseConnection,
}

fn stored_legs(row: &currency_exchanges::Model) -> Result<ExchangeLegs, LedgerRepoError> {
    Ok(ExchangeLegs {
        period_id: row.budget_period_id.map(BudgetPeriodId::new),
        from_currency: parse_currency(row.from_currency.trim())?,
        from_amount: row.from_amount,
        to_currency: parse_currency(row.to_currency.trim())?,
        to_amount: row.to_amount,
    })
}

async fn validate(
    txn: &DatabaseTransaction,
    workspace_id: WorkspaceId,
    input: &ExchangeInput,
) -> Result<ValidatedExchange, LedgerRepoError> {
    let scope = entry_scope(txn, workspace_id, None, input.date, None).await?;
    Ok(validate_exchange(&input.proposed(), &scope)?)
}

async fn insert_row(
    txn: &DatabaseTransaction,
    workspace_id: WorkspaceId,
    input: ExchangeInput,
    exchange: &ValidatedExchange,
) -> Result<currency_exchanges::Model, LedgerRepoError> {
    let legs = exchange.legs;
    let now = Utc::now().into();
    let row = currency_exchanges::ActiveModel {
        workspace_id: Set(workspace_id.into_inner()),
        budget_period_id: Set(legs.period_id.map(BudgetPeriodId::into_inner)),
        date: Set(input.date),
        description: Set(input.description),
        from_currency: Set(legs.from_currency.to_string()),
        from_amount: Set(legs.from_amount),
        to_currency: Set(legs.to_currency.to_string()),
        to_amount: Set(legs.to_amount),
        exchange_rate: Set(exchange.exchange_rate),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(txn)
    .await?;

    if row.budget_period_id.is_none() {
        warn!(exchange_id = row.id, date = %row.date, "Currency exchange stored without a budget period");
    }
    Ok(row)
}

impl CurrencyExchangeRepository {
    /// Creates a new currency exchange repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn lock(
        txn: &DatabaseTransaction,
        workspace_id: WorkspaceId,
        id: CurrencyExchangeId,
    ) -> Result<currency_exchanges::Model, LedgerRepoError> {
        currency_exchanges::Entity::find_by_id(id.into_inner())
            .filter(currency_exchanges::Column::WorkspaceId.eq(workspace_id.into_inner()))
            .lock_exclusive()
            .one(txn)
            .await?
            .ok_or_else(|| LedgerRepoError::not_found("Currency exchange", id))
    }

    /// Creates an exchange and posts both legs.
    ///
    /// # Errors
    ///
    /// Returns a validation error or a database error.
    pub async fn create(
        &self,
        workspace_id: WorkspaceId,
        input: ExchangeInput,
    ) -> Result<currency_exchanges::Model, LedgerRepoError> {
        let txn = self.db.begin().await?;
        let exchange = validate(&txn, workspace_id, &input).await?;
        let row = insert_row(&txn, workspace_id, input, &exchange).await?;
        apply_plan(&txn, &PostingPlan::create(&exchange.legs)).await?;
        txn.commit().await?;

        info!(
            exchange_id = row.id,
            period_id = ?row.budget_period_id,
            from = %row.from_currency,
            to = %row.to_currency,
            "Currency exchange created"
        );
        Ok(row)
    }

    /// Gets an exchange of the workspace.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if missing or in another workspace.
    pub async fn get(
        &self,
        workspace_id: WorkspaceId,
        id: CurrencyExchangeId,
    ) -> Result<currency_exchanges::Model, LedgerRepoError> {
        currency_exchanges::Entity::find_by_id(id.into_inner())
            .filter(currency_exchanges::Column::WorkspaceId.eq(workspace_id.into_inner()))
            .one(&self.db)
            .await?
            .ok_or_else(|| LedgerRepoError::not_found("Currency exchange", id))
    }

    /// Lists exchanges, newest first.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCurrency` for a malformed filter, or a database error.
    pub async fn list(
        &self,
        workspace_id: WorkspaceId,
        filter: ExchangeFilter,
    ) -> Result<Vec<currency_exchanges::Model>, LedgerRepoError> {
        let mut query = currency_exchanges::Entity::find()
            .filter(currency_exchanges::Column::WorkspaceId.eq(workspace_id.into_inner()));
        if let Some(period_id) = filter.budget_period_id {
            query = query
                .filter(currency_exchanges::Column::BudgetPeriodId.eq(period_id.into_inner()));
        }
        if let Some(currency) = filter.currency.as_deref() {
            let code = parse_currency(currency)?;
            query = query.filter(
                Condition::any()
                    .add(currency_exchanges::Column::FromCurrency.eq(code.as_str()))
                    .add(currency_exchanges::Column::ToCurrency.eq(code.as_str())),
            );
        }
        Ok(query
            .order_by_desc(currency_exchanges::Column::Date)
            .order_by_desc(currency_exchanges::Column::Id)
            .all(&self.db)
            .await?)
    }

    /// Replaces an exchange, reverting both stored legs before posting the new ones.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, a validation error, or a database error.
    pub async fn update(
        &self,
        workspace_id: WorkspaceId,
        id: CurrencyExchangeId,
        input: ExchangeInput,
    ) -> Result<currency_exchanges::Model, LedgerRepoError> {
        let txn = self.db.begin().await?;
        let stored = Self::lock(&txn, workspace_id, id).await?;
        let exchange = validate(&txn, workspace_id, &input).await?;
        let plan = PostingPlan::update(&stored_legs(&stored)?, &exchange.legs);

        let legs = exchange.legs;
        let mut active: currency_exchanges::ActiveModel = stored.into();
        active.budget_period_id = Set(legs.period_id.map(BudgetPeriodId::into_inner));
        active.date = Set(input.date);
        active.description = Set(input.description);
        active.from_currency = Set(legs.from_currency.to_string());
        active.from_amount = Set(legs.from_amount);
        active.to_currency = Set(legs.to_currency.to_string());
        active.to_amount = Set(legs.to_amount);
        active.exchange_rate = Set(exchange.exchange_rate);
        active.updated_at = Set(Utc::now().into());
        let row = active.update(&txn).await?;

        apply_plan(&txn, &plan).await?;
        txn.commit().await?;

        info!(exchange_id = row.id, period_id = ?row.budget_period_id, "Currency exchange updated");
        Ok(row)
    }

    /// Deletes an exchange and reverts both legs.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or a database error.
    pub async fn delete(
        &self,
        workspace_id: WorkspaceId,
        id: CurrencyExchangeId,
    ) -> Result<(), LedgerRepoError> {
        let txn = self.db.begin().await?;
        let stored = Self::lock(&txn, workspace_id, id).await?;
        let plan = PostingPlan::delete(&stored_legs(&stored)?);

        currency_exchanges::Entity::delete_by_id(stored.id)
            .exec(&txn)
            .await?;
        apply_plan(&txn, &plan).await?;
        txn.commit().await?;

        info!(exchange_id = stored.id, "Currency exchange deleted");
        Ok(())
    }

    /// Imports exchanges, each placed in the period covering its date. All or nothing.
    ///
    /// # Errors
    ///
    /// Returns the first row's validation error, or a database error.
    pub async fn import(
        &self,
        workspace_id: WorkspaceId,
        rows: Vec<ExchangeInput>,
    ) -> Result<Vec<currency_exchanges::Model>, LedgerRepoError> {
        let txn = self.db.begin().await?;
        let mut plan = PostingPlan::default();
        let mut imported = Vec::with_capacity(rows.len());
        for row in rows {
            let exchange = validate(&txn, workspace_id, &row).await?;
            plan.extend(PostingPlan::create(&exchange.legs));
            imported.push(insert_row(&txn, workspace_id, row, &exchange).await?);
        }
        apply_plan(&txn, &plan).await?;
        txn.commit().await?;

        info!(count = imported.len(), "Currency exchanges imported");
        Ok(imported)
    }
}
