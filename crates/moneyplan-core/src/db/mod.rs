//! Database access layer with connection pooling and migrations
//!
//! This module is organized by domain:
//! - `users` - Account creation and lookup
//! - `entries` - Income and expense CRUD
//! - `analyses` - Month analysis snapshots and their entry links
//! - `budget_plans` - Budget plans and their items
//! - `audit` - Audit log and row counts
//!
//! Row-level helpers take a plain `&Connection` so the same query serves both
//! the pooled [`Database`] methods and the transaction-scoped [`StoreTx`].

use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Transaction, TransactionBehavior};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::models::{
    BudgetPlan, BudgetPlanItem, Entry, EntryKind, MonthAnalysis, NewBudgetPlan,
    NewBudgetPlanItem, NewMonthAnalysis, User,
};
use crate::store::{RecordStore, TransactionalStore};

mod analyses;
mod audit;
mod budget_plans;
mod entries;
mod users;

pub use audit::AuditEntry;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Environment variable for database encryption key
pub const DB_KEY_ENV: &str = "MONEYPLAN_DB_KEY";

/// Derive an encryption key from a passphrase using Argon2
///
/// Uses a fixed application salt so the same passphrase always produces the same key,
/// regardless of database path. This allows moving/renaming/restoring the database freely.
fn derive_key(passphrase: &str) -> Result<String> {
    use argon2::{password_hash::SaltString, Argon2, PasswordHasher};

    // Changing this would invalidate all existing encrypted databases
    const APP_SALT: &[u8; 16] = b"moneyplan-salt-1";

    let salt = SaltString::encode_b64(APP_SALT)
        .map_err(|e| Error::Encryption(format!("Failed to create salt: {}", e)))?;

    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(passphrase.as_bytes(), &salt)
        .map_err(|e| Error::Encryption(format!("Failed to derive key: {}", e)))?;

    let hash_str = hash
        .hash
        .ok_or_else(|| Error::Encryption("No hash output".to_string()))?;
    Ok(hex::encode(hash_str.as_bytes()))
}

/// Parse a SQLite datetime string into a DateTime<Utc>
pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    // SQLite stores as "YYYY-MM-DD HH:MM:SS" format
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.and_utc())
        .unwrap_or_else(|_| Utc::now())
}

/// Read a date column written with `NaiveDate::to_string()`
///
/// Years past 9999 are stored with a sign (`+10000-01-15`).
pub(crate) fn date_column(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let s: String = row.get(idx)?;
    s.parse::<NaiveDate>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Pool tuning
#[derive(Debug, Clone)]
pub struct DatabaseOptions {
    /// Maximum pooled connections
    pub pool_size: u32,
    /// How long a connection waits for the write lock
    pub busy_timeout: Duration,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self {
            pool_size: 10,
            busy_timeout: Duration::from_secs(5),
        }
    }
}

/// Database wrapper with connection pooling
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Create a new unencrypted database connection pool
    pub fn new_unencrypted(path: &str) -> Result<Self> {
        Self::open(path, None, &DatabaseOptions::default())
    }

    /// Open a database with explicit key and pool options
    pub fn open(path: &str, passphrase: Option<&str>, options: &DatabaseOptions) -> Result<Self> {
        let key_pragma = passphrase
            .map(derive_key)
            .transpose()?
            .map(|key| format!("PRAGMA key = 'x\"{}\"';", key));
        let busy_timeout = options.busy_timeout;

        // Runs on every new pooled connection; the key must come first
        let manager = SqliteConnectionManager::file(path).with_init(move |conn| {
            if let Some(pragma) = &key_pragma {
                conn.execute_batch(pragma)?;
            }
            conn.busy_timeout(busy_timeout)?;
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            Ok(())
        });

        let pool = Pool::builder().max_size(options.pool_size).build(manager)?;

        let db = Self { pool };
        db.run_migrations()?;

        debug!(path, encrypted = passphrase.is_some(), "Database opened");
        Ok(db)
    }

    /// Create a throwaway database (for testing)
    ///
    /// Uses a temporary file rather than `:memory:` so every pooled
    /// connection sees the same data.
    pub fn in_memory() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "moneyplan_test_{}_{}.db",
            std::process::id(),
            id
        ));
        let path = path.to_string_lossy().into_owned();

        let _ = std::fs::remove_file(&path);

        Self::new_unencrypted(&path)
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- WAL mode: readers don't block the single writer
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;

            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE TABLE IF NOT EXISTS incomes (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id),
                title TEXT NOT NULL,
                amount REAL NOT NULL,
                date DATE NOT NULL,              -- chrono's NaiveDate display form
                year INTEGER NOT NULL,           -- calendar key, copied from date
                month INTEGER NOT NULL,
                recurring INTEGER NOT NULL DEFAULT 0,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_incomes_user_month ON incomes(user_id, year, month);

            CREATE TABLE IF NOT EXISTS expenses (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id),
                title TEXT NOT NULL,
                amount REAL NOT NULL,
                date DATE NOT NULL,              -- chrono's NaiveDate display form
                year INTEGER NOT NULL,           -- calendar key, copied from date
                month INTEGER NOT NULL,
                recurring INTEGER NOT NULL DEFAULT 0,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_expenses_user_month ON expenses(user_id, year, month);

            -- AUTOINCREMENT: a replaced analysis never hands its id to the new one
            CREATE TABLE IF NOT EXISTS month_analyses (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id),
                year INTEGER NOT NULL,
                month INTEGER NOT NULL,
                summary_amount REAL NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(user_id, year, month)
            );

            CREATE TABLE IF NOT EXISTS month_analysis_incomes (
                analysis_id INTEGER NOT NULL REFERENCES month_analyses(id),
                income_id INTEGER NOT NULL REFERENCES incomes(id),
                PRIMARY KEY (analysis_id, income_id)
            );

            CREATE INDEX IF NOT EXISTS idx_analysis_incomes_income ON month_analysis_incomes(income_id);

            CREATE TABLE IF NOT EXISTS month_analysis_expenses (
                analysis_id INTEGER NOT NULL REFERENCES month_analyses(id),
                expense_id INTEGER NOT NULL REFERENCES expenses(id),
                PRIMARY KEY (analysis_id, expense_id)
            );

            CREATE INDEX IF NOT EXISTS idx_analysis_expenses_expense ON month_analysis_expenses(expense_id);

            -- One plan per user
            CREATE TABLE IF NOT EXISTS budget_plans (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL UNIQUE REFERENCES users(id),
                summary_amount REAL NOT NULL DEFAULT 0,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            -- No ON DELETE CASCADE: items are removed explicitly before their plan
            CREATE TABLE IF NOT EXISTS budget_plan_items (
                id INTEGER PRIMARY KEY,
                budget_plan_id INTEGER NOT NULL REFERENCES budget_plans(id),
                title TEXT NOT NULL,
                amount REAL NOT NULL,
                is_income INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_budget_plan_items_plan ON budget_plan_items(budget_plan_id);

            CREATE TABLE IF NOT EXISTS audit_log (
                id INTEGER PRIMARY KEY,
                timestamp DATETIME DEFAULT CURRENT_TIMESTAMP,
                action TEXT NOT NULL,
                entity_type TEXT,
                entity_id INTEGER,
                details TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_audit_timestamp ON audit_log(timestamp);
            "#,
        )?;

        info!("Database schema initialized");
        Ok(())
    }

    fn run_in<T, F>(&self, behavior: TransactionBehavior, f: F) -> Result<T>
    where
        F: FnOnce(&dyn RecordStore) -> Result<T>,
    {
        let mut conn = self.conn()?;
        let store = StoreTx {
            tx: conn.transaction_with_behavior(behavior)?,
        };

        match f(&store) {
            Ok(value) => {
                store.tx.commit()?;
                Ok(value)
            }
            Err(e) => {
                warn!("Rolling back transaction: {}", e);
                let _ = store.tx.rollback();
                Err(e)
            }
        }
    }
}

impl TransactionalStore for Database {
    fn with_transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn RecordStore) -> Result<T>,
    {
        self.run_in(TransactionBehavior::Immediate, f)
    }

    fn with_snapshot<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn RecordStore) -> Result<T>,
    {
        self.run_in(TransactionBehavior::Deferred, f)
    }
}

/// Record store bound to one open transaction
pub struct StoreTx<'conn> {
    tx: Transaction<'conn>,
}

impl RecordStore for StoreTx<'_> {
    fn find_user(&self, user_id: i64) -> Result<Option<User>> {
        users::find_user(&self.tx, user_id)
    }

    fn list_entries(
        &self,
        kind: EntryKind,
        user_id: i64,
        year: Option<i32>,
        month: Option<u32>,
    ) -> Result<Vec<Entry>> {
        entries::list_entries(&self.tx, kind, user_id, year, month)
    }

    fn find_month_analysis(&self, id: i64) -> Result<Option<MonthAnalysis>> {
        analyses::find_month_analysis(&self.tx, id)
    }

    fn find_month_analyses_by_key(
        &self,
        user_id: i64,
        year: i32,
        month: u32,
    ) -> Result<Vec<MonthAnalysis>> {
        analyses::find_month_analyses_by_key(&self.tx, user_id, year, month)
    }

    fn list_month_analyses(&self, user_id: i64) -> Result<Vec<MonthAnalysis>> {
        analyses::list_month_analyses(&self.tx, user_id)
    }

    fn delete_month_analyses(&self, analyses: &[MonthAnalysis]) -> Result<()> {
        analyses::delete_month_analyses(&self.tx, analyses)
    }

    fn insert_month_analysis(&self, analysis: NewMonthAnalysis) -> Result<MonthAnalysis> {
        analyses::insert_month_analysis(&self.tx, analysis)
    }

    fn find_budget_plan(&self, id: i64) -> Result<Option<BudgetPlan>> {
        budget_plans::find_budget_plan(&self.tx, id)
    }

    fn find_budget_plan_by_user(&self, user_id: i64) -> Result<Option<BudgetPlan>> {
        budget_plans::find_budget_plan_by_user(&self.tx, user_id)
    }

    fn delete_budget_plan_items(&self, items: &[BudgetPlanItem]) -> Result<()> {
        budget_plans::delete_budget_plan_items(&self.tx, items)
    }

    fn delete_budget_plan(&self, plan: &BudgetPlan) -> Result<()> {
        budget_plans::delete_budget_plan(&self.tx, plan)
    }

    fn insert_budget_plan(&self, user_id: i64, plan: &NewBudgetPlan) -> Result<BudgetPlan> {
        budget_plans::insert_budget_plan(&self.tx, user_id, plan)
    }

    fn insert_budget_plan_item(
        &self,
        budget_plan_id: i64,
        item: &NewBudgetPlanItem,
    ) -> Result<BudgetPlanItem> {
        budget_plans::insert_budget_plan_item(&self.tx, budget_plan_id, item)
    }

    fn record_audit(
        &self,
        action: &str,
        entity_type: &str,
        entity_id: Option<i64>,
        details: Option<&str>,
    ) -> Result<i64> {
        audit::insert_audit(&self.tx, action, entity_type, entity_id, details)
    }
}
