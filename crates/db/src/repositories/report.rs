//! Read-only reports over the period ledger.
//!
//! Nothing here writes. Budget actuals come from a grouped `SUM` over expense
//! transactions; balances are read straight from the stored ledger rows.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use kasa_shared::types::{BudgetPeriodId, CurrencyCode, WorkspaceId};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, JoinType, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait,
};
use serde::Serialize;

use super::error::LedgerRepoError;
use super::scope::find_period;
use crate::entities::sea_orm_active_enums::TransactionType;
use crate::entities::{
    budget_accounts, budget_periods, budgets, categories, period_balances, transactions,
};

/// Period header of a budget summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryPeriod {
    /// Period ID.
    pub id: i64,
    /// Period name.
    pub name: String,
    /// First day.
    pub start_date: NaiveDate,
    /// Last day, inclusive.
    pub end_date: NaiveDate,
}

/// One budget line compared with what was actually spent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetLine {
    /// Budget ID.
    pub id: i64,
    /// Budgeted category.
    pub category_id: i64,
    /// Category name.
    pub category: String,
    /// Budget currency.
    pub currency: String,
    /// Planned amount.
    pub budget: Decimal,
    /// Sum of expenses booked to the category in this currency.
    pub actual: Decimal,
    /// `budget - actual`; negative when overspent.
    pub difference: Decimal,
}

/// Budget lines of one currency with their totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CurrencySummary {
    /// Sum of budgets.
    pub total_budget: Decimal,
    /// Sum of actual expenses over budgeted categories.
    pub total_actual: Decimal,
    /// Individual budget lines.
    pub categories: Vec<BudgetLine>,
}

/// Stored ledger figures of one currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrencyBalances {
    /// Opening balance.
    pub opening: Decimal,
    /// Total income.
    pub income: Decimal,
    /// Total expenses.
    pub expenses: Decimal,
    /// Exchanged into this currency.
    pub exchanges_in: Decimal,
    /// Exchanged out of this currency.
    pub exchanges_out: Decimal,
    /// Closing balance.
    pub closing: Decimal,
}

impl From<&period_balances::Model> for CurrencyBalances {
    fn from(row: &period_balances::Model) -> Self {
        Self {
            opening: row.opening_balance,
            income: row.total_income,
            expenses: row.total_expenses,
            exchanges_in: row.exchanges_in,
            exchanges_out: row.exchanges_out,
            closing: row.closing_balance,
        }
    }
}

/// Budget against actual spending for one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetSummary {
    /// The summarized period.
    pub period: SummaryPeriod,
    /// Budget lines grouped by currency.
    pub currencies: BTreeMap<String, CurrencySummary>,
    /// Ledger rows of the period keyed by currency.
    pub balances: BTreeMap<String, CurrencyBalances>,
}

/// Latest known closing balance of one currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentBalance {
    /// Currency.
    pub currency: CurrencyCode,
    /// Closing balance of the latest period, zero when no period has a row.
    pub closing_balance: Decimal,
    /// Period the figure comes from.
    pub budget_period_id: Option<i64>,
}

/// Report repository.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    db: DatabaseConnection,
    currencies: Vec<CurrencyCode>,
}

impl ReportRepository {
    /// Creates a new report repository reporting on `currencies`.
    #[must_use]
    pub const fn new(db: DatabaseConnection, currencies: Vec<CurrencyCode>) -> Self {
        Self { db, currencies }
    }

    /// Compares every budget of a period with the expenses booked against it.
    ///
    /// Only expenses in the budget's own category and currency count towards its
    /// actual. The period's ledger rows are attached as they are stored.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the period is outside the workspace, or a database error.
    pub async fn budget_summary(
        &self,
        workspace_id: WorkspaceId,
        period_id: BudgetPeriodId,
    ) -> Result<BudgetSummary, LedgerRepoError> {
        let period = find_period(&self.db, workspace_id, period_id).await?;

        let actuals: HashMap<(i64, String), Decimal> = transactions::Entity::find()
            .select_only()
            .column(transactions::Column::CategoryId)
            .column(transactions::Column::Currency)
            .column_as(Expr::col(transactions::Column::Amount).sum(), "actual")
            .filter(transactions::Column::BudgetPeriodId.eq(period.id))
            .filter(transactions::Column::TransactionType.eq(TransactionType::Expense))
            .filter(transactions::Column::CategoryId.is_not_null())
            .group_by(transactions::Column::CategoryId)
            .group_by(transactions::Column::Currency)
            .into_tuple::<(Option<i64>, String, Option<Decimal>)>()
            .all(&self.db)
            .await?
            .into_iter()
            .filter_map(|(category, currency, total)| {
                Some(((category?, currency), total.unwrap_or(Decimal::ZERO)))
            })
            .collect();

        let lines = budgets::Entity::find()
            .find_also_related(categories::Entity)
            .filter(budgets::Column::BudgetPeriodId.eq(period.id))
            .order_by_asc(budgets::Column::Currency)
            .order_by_asc(budgets::Column::Id)
            .all(&self.db)
            .await?;

        let mut currencies: BTreeMap<String, CurrencySummary> = BTreeMap::new();
        for (budget, category) in lines {
            let actual = actuals
                .get(&(budget.category_id, budget.currency.clone()))
                .copied()
                .unwrap_or(Decimal::ZERO);
            let summary = currencies.entry(budget.currency.clone()).or_default();
            summary.total_budget += budget.amount;
            summary.total_actual += actual;
            summary.categories.push(BudgetLine {
                id: budget.id,
                category_id: budget.category_id,
                category: category.map(|c| c.name).unwrap_or_default(),
                currency: budget.currency,
                budget: budget.amount,
                actual,
                difference: budget.amount - actual,
            });
        }

        let balances = period_balances::Entity::find()
            .filter(period_balances::Column::BudgetPeriodId.eq(period.id))
            .all(&self.db)
            .await?
            .iter()
            .map(|row| (row.currency.clone(), CurrencyBalances::from(row)))
            .collect();

        Ok(BudgetSummary {
            period: SummaryPeriod {
                id: period.id,
                name: period.name,
                start_date: period.start_date,
                end_date: period.end_date,
            },
            currencies,
            balances,
        })
    }

    /// Closing balance per reported currency, taken from the workspace period with
    /// the latest end date that has a row in that currency.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn current_balances(
        &self,
        workspace_id: WorkspaceId,
    ) -> Result<Vec<CurrentBalance>, LedgerRepoError> {
        let mut result = Vec::with_capacity(self.currencies.len());
        for currency in &self.currencies {
            let latest = period_balances::Entity::find()
                .inner_join(budget_periods::Entity)
                .join(
                    JoinType::InnerJoin,
                    budget_periods::Relation::BudgetAccounts.def(),
                )
                .filter(budget_accounts::Column::WorkspaceId.eq(workspace_id.into_inner()))
                .filter(period_balances::Column::Currency.eq(currency.as_str()))
                .order_by_desc(budget_periods::Column::EndDate)
                .order_by_desc(budget_periods::Column::Id)
                .one(&self.db)
                .await?;

            result.push(CurrentBalance {
                currency: *currency,
                closing_balance: latest
                    .as_ref()
                    .map_or(Decimal::ZERO, |row| row.closing_balance),
                budget_period_id: latest.map(|row| row.budget_period_id),
            });
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    #[test]
    fn test_balances_copy_stored_row() {
        let now = Utc::now().into();
        let row = period_balances::Model {
            id: 1,
            budget_period_id: 2,
            currency: "PLN".to_string(),
            opening_balance: dec!(100.00),
            opening_balance_is_manual: false,
            total_income: dec!(50.00),
            total_expenses: dec!(30.00),
            exchanges_in: dec!(5.00),
            exchanges_out: dec!(10.00),
            closing_balance: dec!(115.00),
            last_calculated_at: None,
            created_at: now,
            updated_at: now,
        };
        let balances = CurrencyBalances::from(&row);
        assert_eq!(balances.opening, dec!(100.00));
        assert_eq!(balances.closing, dec!(115.00));
        assert_eq!(balances.exchanges_out, dec!(10.00));
    }
}
