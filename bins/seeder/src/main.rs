//! Database seeder for Kasa development and testing.
//!
//! Seeds a demo workspace with one budget account, two chained monthly periods,
//! a few categories, and entries posted through the ledger repositories, then
//! recalculates the second period so its opening balance carries over.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use kasa_core::ledger::TransactionType;
use kasa_db::entities::{budget_accounts, categories, workspaces};
use kasa_db::repositories::{
    BudgetPeriodRepository, CopyBudgetPeriod, CreateBudgetPeriod, CurrencyExchangeRepository,
    ExchangeInput, PeriodBalanceRepository, PlannedInput, PlannedTransactionRepository,
    TransactionInput, TransactionRepository,
};
use kasa_shared::AppConfig;
use kasa_shared::types::{BudgetAccountId, BudgetPeriodId, CategoryId, WorkspaceId};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

/// Name of the seeded workspace; seeding is skipped if it exists.
const DEMO_WORKSPACE: &str = "Demo household";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    println!("Connecting to database...");
    let db = kasa_db::connect_with(&config.database)
        .await
        .context("Failed to connect to database")?;

    if workspaces::Entity::find()
        .filter(workspaces::Column::Name.eq(DEMO_WORKSPACE))
        .one(&db)
        .await?
        .is_some()
    {
        println!("Demo workspace already exists, skipping");
        return Ok(());
    }

    println!("Seeding workspace and budget account...");
    let (workspace_id, account_id) = seed_workspace(&db).await?;

    println!("Seeding January period...");
    let periods = BudgetPeriodRepository::new(db.clone(), &config.ledger);
    let january = periods
        .create(
            workspace_id,
            CreateBudgetPeriod {
                budget_account_id: account_id,
                name: "January 2025".to_string(),
                start_date: date(2025, 1, 1)?,
                end_date: date(2025, 1, 31)?,
                weeks: Some(5),
            },
        )
        .await?;
    let january_id = BudgetPeriodId::new(january.id);

    let groceries = seed_category(&db, january.id, "Groceries").await?;
    seed_category(&db, january.id, "Housing").await?;

    println!("Seeding entries...");
    seed_entries(&db, workspace_id, groceries).await?;

    println!("Copying into February...");
    let february = periods
        .copy(
            workspace_id,
            january_id,
            CopyBudgetPeriod {
                name: "February 2025".to_string(),
                start_date: date(2025, 2, 1)?,
                end_date: date(2025, 2, 28)?,
                weeks: Some(4),
            },
        )
        .await?;

    println!("Recalculating February...");
    let balances = PeriodBalanceRepository::new(db.clone(), &config.ledger)
        .recalculate_all(workspace_id, BudgetPeriodId::new(february.id))
        .await?;
    for balance in balances {
        println!(
            "  {} opening {} closing {}",
            balance.currency, balance.opening_balance, balance.closing_balance
        );
    }

    println!("Seeding complete! Workspace id: {}", workspace_id);
    Ok(())
}

fn date(y: i32, m: u32, d: u32) -> anyhow::Result<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d).with_context(|| format!("invalid date {y}-{m}-{d}"))
}

/// Seeds the demo workspace and its budget account.
async fn seed_workspace(db: &DatabaseConnection) -> anyhow::Result<(WorkspaceId, BudgetAccountId)> {
    let now = Utc::now().into();
    let workspace = workspaces::ActiveModel {
        name: Set(DEMO_WORKSPACE.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    let account = budget_accounts::ActiveModel {
        workspace_id: Set(workspace.id),
        name: Set("Family budget".to_string()),
        description: Set(Some("Seeded for local development".to_string())),
        default_currency: Set("PLN".to_string()),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    Ok((
        WorkspaceId::new(workspace.id),
        BudgetAccountId::new(account.id),
    ))
}

/// Seeds one category in a period.
async fn seed_category(
    db: &DatabaseConnection,
    period_id: i64,
    name: &str,
) -> anyhow::Result<CategoryId> {
    let now = Utc::now().into();
    let category = categories::ActiveModel {
        budget_period_id: Set(period_id),
        name: Set(name.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(CategoryId::new(category.id))
}

/// Seeds January income, expenses, an exchange, and a planned payment.
async fn seed_entries(
    db: &DatabaseConnection,
    workspace_id: WorkspaceId,
    groceries: CategoryId,
) -> anyhow::Result<()> {
    let transactions = TransactionRepository::new(db.clone());
    transactions
        .create(
            workspace_id,
            TransactionInput {
                budget_period_id: None,
                date: date(2025, 1, 2)?,
                description: "Salary".to_string(),
                category_id: None,
                amount: Decimal::new(850_000, 2),
                currency: "PLN".to_string(),
                transaction_type: TransactionType::Income,
            },
        )
        .await?;
    transactions
        .create(
            workspace_id,
            TransactionInput {
                budget_period_id: None,
                date: date(2025, 1, 11)?,
                description: "Weekly shopping".to_string(),
                category_id: Some(groceries),
                amount: Decimal::new(42_350, 2),
                currency: "PLN".to_string(),
                transaction_type: TransactionType::Expense,
            },
        )
        .await?;

    CurrencyExchangeRepository::new(db.clone())
        .create(
            workspace_id,
            ExchangeInput {
                date: date(2025, 1, 15)?,
                description: Some("Holiday cash".to_string()),
                from_currency: "PLN".to_string(),
                from_amount: Decimal::new(100_000, 2),
                to_currency: "EUR".to_string(),
                to_amount: Decimal::new(23_400, 2),
            },
        )
        .await?;

    PlannedTransactionRepository::new(db.clone())
        .create(
            workspace_id,
            PlannedInput {
                budget_period_id: None,
                name: "Rent".to_string(),
                amount: Decimal::new(250_000, 2),
                currency: "PLN".to_string(),
                category_id: None,
                planned_date: date(2025, 1, 10)?,
                status: None,
            },
        )
        .await?;
    Ok(())
}
