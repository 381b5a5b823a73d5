//! Initial database migration.
//!
//! Creates the tenant hierarchy, ledger entry tables, and the period balance ledger.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: TENANT HIERARCHY
        // ============================================================
        db.execute_unprepared(WORKSPACES_SQL).await?;
        db.execute_unprepared(BUDGET_ACCOUNTS_SQL).await?;
        db.execute_unprepared(BUDGET_PERIODS_SQL).await?;
        db.execute_unprepared(CATEGORIES_SQL).await?;
        db.execute_unprepared(BUDGETS_SQL).await?;

        // ============================================================
        // PART 3: LEDGER ENTRY SOURCES
        // ============================================================
        db.execute_unprepared(TRANSACTIONS_SQL).await?;
        db.execute_unprepared(CURRENCY_EXCHANGES_SQL).await?;
        db.execute_unprepared(PLANNED_TRANSACTIONS_SQL).await?;

        // ============================================================
        // PART 4: PERIOD BALANCE LEDGER
        // ============================================================
        db.execute_unprepared(PERIOD_BALANCES_SQL).await?;

        // ============================================================
        // PART 5: TRIGGERS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
CREATE TYPE transaction_type AS ENUM ('income', 'expense');

CREATE TYPE planned_status AS ENUM ('pending', 'done', 'cancelled');
";

const WORKSPACES_SQL: &str = r"
CREATE TABLE workspaces (
    id BIGSERIAL PRIMARY KEY,
    name VARCHAR(100) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const BUDGET_ACCOUNTS_SQL: &str = r"
CREATE TABLE budget_accounts (
    id BIGSERIAL PRIMARY KEY,
    workspace_id BIGINT NOT NULL REFERENCES workspaces(id) ON DELETE CASCADE,
    name VARCHAR(100) NOT NULL,
    description TEXT,
    default_currency VARCHAR(3) NOT NULL DEFAULT 'PLN'
        CHECK (default_currency ~ '^[A-Z]{3}$'),
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (workspace_id, name)
);

CREATE INDEX idx_budget_accounts_workspace ON budget_accounts(workspace_id);
";

const BUDGET_PERIODS_SQL: &str = r"
CREATE TABLE budget_periods (
    id BIGSERIAL PRIMARY KEY,
    budget_account_id BIGINT NOT NULL REFERENCES budget_accounts(id) ON DELETE CASCADE,
    name VARCHAR(100) NOT NULL,
    start_date DATE NOT NULL,
    end_date DATE NOT NULL,
    weeks INTEGER CHECK (weeks IS NULL OR weeks > 0),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CHECK (end_date >= start_date)
);

CREATE INDEX idx_budget_periods_account_end ON budget_periods(budget_account_id, end_date);
CREATE INDEX idx_budget_periods_dates ON budget_periods(start_date, end_date);
";

const CATEGORIES_SQL: &str = r"
CREATE TABLE categories (
    id BIGSERIAL PRIMARY KEY,
    budget_period_id BIGINT NOT NULL REFERENCES budget_periods(id) ON DELETE CASCADE,
    name VARCHAR(100) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (budget_period_id, name)
);
";

const BUDGETS_SQL: &str = r"
CREATE TABLE budgets (
    id BIGSERIAL PRIMARY KEY,
    budget_period_id BIGINT NOT NULL REFERENCES budget_periods(id) ON DELETE CASCADE,
    category_id BIGINT NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
    currency VARCHAR(3) NOT NULL CHECK (currency ~ '^[A-Z]{3}$'),
    amount NUMERIC(15, 2) NOT NULL CHECK (amount >= 0),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (budget_period_id, category_id, currency)
);
";

const TRANSACTIONS_SQL: &str = r"
CREATE TABLE transactions (
    id BIGSERIAL PRIMARY KEY,
    workspace_id BIGINT NOT NULL REFERENCES workspaces(id) ON DELETE CASCADE,
    budget_period_id BIGINT REFERENCES budget_periods(id) ON DELETE SET NULL,
    date DATE NOT NULL,
    description VARCHAR(255) NOT NULL,
    category_id BIGINT REFERENCES categories(id) ON DELETE SET NULL,
    amount NUMERIC(15, 2) NOT NULL CHECK (amount > 0),
    currency VARCHAR(3) NOT NULL CHECK (currency ~ '^[A-Z]{3}$'),
    transaction_type transaction_type NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CHECK (transaction_type = 'expense' OR category_id IS NULL)
);

CREATE INDEX idx_transactions_workspace_date ON transactions(workspace_id, date);
CREATE INDEX idx_transactions_period_currency ON transactions(budget_period_id, currency, transaction_type);
";

const CURRENCY_EXCHANGES_SQL: &str = r"
CREATE TABLE currency_exchanges (
    id BIGSERIAL PRIMARY KEY,
    workspace_id BIGINT NOT NULL REFERENCES workspaces(id) ON DELETE CASCADE,
    budget_period_id BIGINT REFERENCES budget_periods(id) ON DELETE SET NULL,
    date DATE NOT NULL,
    description VARCHAR(255),
    from_currency VARCHAR(3) NOT NULL CHECK (from_currency ~ '^[A-Z]{3}$'),
    from_amount NUMERIC(15, 2) NOT NULL CHECK (from_amount > 0),
    to_currency VARCHAR(3) NOT NULL CHECK (to_currency ~ '^[A-Z]{3}$'),
    to_amount NUMERIC(15, 2) NOT NULL CHECK (to_amount > 0),
    exchange_rate NUMERIC(15, 6) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CHECK (from_currency <> to_currency)
);

CREATE INDEX idx_exchanges_workspace_date ON currency_exchanges(workspace_id, date);
CREATE INDEX idx_exchanges_period_from ON currency_exchanges(budget_period_id, from_currency);
CREATE INDEX idx_exchanges_period_to ON currency_exchanges(budget_period_id, to_currency);
";

const PLANNED_TRANSACTIONS_SQL: &str = r"
CREATE TABLE planned_transactions (
    id BIGSERIAL PRIMARY KEY,
    workspace_id BIGINT NOT NULL REFERENCES workspaces(id) ON DELETE CASCADE,
    budget_period_id BIGINT REFERENCES budget_periods(id) ON DELETE SET NULL,
    name VARCHAR(200) NOT NULL,
    amount NUMERIC(15, 2) NOT NULL CHECK (amount > 0),
    currency VARCHAR(3) NOT NULL CHECK (currency ~ '^[A-Z]{3}$'),
    category_id BIGINT REFERENCES categories(id) ON DELETE SET NULL,
    planned_date DATE NOT NULL,
    payment_date DATE,
    status planned_status NOT NULL DEFAULT 'pending',
    transaction_id BIGINT UNIQUE REFERENCES transactions(id) ON DELETE SET NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_planned_workspace_date ON planned_transactions(workspace_id, planned_date);
CREATE INDEX idx_planned_period_status ON planned_transactions(budget_period_id, status);
";

const PERIOD_BALANCES_SQL: &str = r"
CREATE TABLE period_balances (
    id BIGSERIAL PRIMARY KEY,
    budget_period_id BIGINT NOT NULL REFERENCES budget_periods(id) ON DELETE CASCADE,
    currency VARCHAR(3) NOT NULL CHECK (currency ~ '^[A-Z]{3}$'),
    opening_balance NUMERIC(15, 2) NOT NULL DEFAULT 0,
    opening_balance_is_manual BOOLEAN NOT NULL DEFAULT FALSE,
    total_income NUMERIC(15, 2) NOT NULL DEFAULT 0,
    total_expenses NUMERIC(15, 2) NOT NULL DEFAULT 0,
    exchanges_in NUMERIC(15, 2) NOT NULL DEFAULT 0,
    exchanges_out NUMERIC(15, 2) NOT NULL DEFAULT 0,
    closing_balance NUMERIC(15, 2) NOT NULL DEFAULT 0,
    last_calculated_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (budget_period_id, currency),
    CONSTRAINT chk_period_balance_reconciles CHECK (
        closing_balance = opening_balance + total_income - total_expenses
                          + exchanges_in - exchanges_out
    )
);
";

const TRIGGERS_SQL: &str = r"
-- ============================================================
-- FUNCTION: touch_updated_at
-- Keeps updated_at current on every row update
-- ============================================================
CREATE OR REPLACE FUNCTION touch_updated_at()
RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at = now();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_workspaces_updated_at BEFORE UPDATE ON workspaces
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
CREATE TRIGGER trg_budget_accounts_updated_at BEFORE UPDATE ON budget_accounts
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
CREATE TRIGGER trg_budget_periods_updated_at BEFORE UPDATE ON budget_periods
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
CREATE TRIGGER trg_categories_updated_at BEFORE UPDATE ON categories
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
CREATE TRIGGER trg_budgets_updated_at BEFORE UPDATE ON budgets
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
CREATE TRIGGER trg_transactions_updated_at BEFORE UPDATE ON transactions
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
CREATE TRIGGER trg_currency_exchanges_updated_at BEFORE UPDATE ON currency_exchanges
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
CREATE TRIGGER trg_planned_transactions_updated_at BEFORE UPDATE ON planned_transactions
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
CREATE TRIGGER trg_period_balances_updated_at BEFORE UPDATE ON period_balances
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
";

const DROP_ALL_SQL: &str = r"
-- ============================================================
-- DROP ALL: Rollback migration
-- Order matters due to foreign key constraints
-- ============================================================

DROP TABLE IF EXISTS period_balances CASCADE;
DROP TABLE IF EXISTS planned_transactions CASCADE;
DROP TABLE IF EXISTS currency_exchanges CASCADE;
DROP TABLE IF EXISTS transactions CASCADE;
DROP TABLE IF EXISTS budgets CASCADE;
DROP TABLE IF EXISTS categories CASCADE;
DROP TABLE IF EXISTS budget_periods CASCADE;
DROP TABLE IF EXISTS budget_accounts CASCADE;
DROP TABLE IF EXISTS workspaces CASCADE;

DROP FUNCTION IF EXISTS touch_updated_at();

DROP TYPE IF EXISTS planned_status;
DROP TYPE IF EXISTS transaction_type;
";
