//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// MoneyPlan - Track incomes and expenses, analyse months, plan budgets
#[derive(Parser)]
#[command(name = "moneyplan")]
#[command(about = "Self-hosted personal finance tracker", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path (overrides `database_path` from the settings file)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Settings file (defaults to ~/.local/share/moneyplan/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended for production)
    ///
    /// By default, the database is encrypted using SQLCipher.
    /// Set MONEYPLAN_DB_KEY environment variable with your passphrase.
    /// Use --no-encrypt only for development or testing.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    /// Print results as JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Show database status and row counts
    Status,

    /// Manage users
    Users {
        #[command(subcommand)]
        action: Option<UsersAction>,
    },

    /// Record and manage incomes
    Income {
        #[command(subcommand)]
        action: EntryAction,
    },

    /// Record and manage expenses
    Expense {
        #[command(subcommand)]
        action: EntryAction,
    },

    /// Monthly analysis (income minus expenses for one month)
    Analysis {
        #[command(subcommand)]
        action: AnalysisAction,
    },

    /// Budget plan (one per user, replaced on every save)
    Budget {
        #[command(subcommand)]
        action: BudgetAction,
    },

    /// Show recent audit log entries
    Audit {
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: i64,
    },
}

#[derive(Subcommand)]
pub enum UsersAction {
    /// List all users
    List,

    /// Create a user
    Add {
        /// Username (2-50 characters)
        username: String,
    },

    /// Show one user by id or username
    Show {
        /// User id or username
        user: String,
    },
}

#[derive(Subcommand)]
pub enum EntryAction {
    /// Record a new entry
    Add {
        /// Owning user id
        #[arg(short, long)]
        user: i64,
        /// Title (2-50 characters)
        title: String,
        /// Amount (1 to 10,000,000)
        amount: f64,
        /// Date (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<String>,
        /// Mark as repeating monthly
        #[arg(long)]
        recurring: bool,
    },

    /// List a user's entries
    List {
        /// Owning user id
        #[arg(short, long)]
        user: i64,
        /// Only this month (YYYY-MM)
        #[arg(short, long)]
        month: Option<String>,
    },

    /// Show one entry
    Show {
        id: i64,
    },

    /// Replace an entry's fields
    Edit {
        id: i64,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New amount
        #[arg(long)]
        amount: Option<f64>,
        /// New date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
        /// New recurring flag
        #[arg(long)]
        recurring: Option<bool>,
    },

    /// Delete an entry
    Delete {
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum AnalysisAction {
    /// Compute (or recompute) the analysis for a month
    Create {
        /// User id
        #[arg(short, long)]
        user: i64,
        /// Month (YYYY-MM)
        month: String,
    },

    /// Show a stored analysis
    Show {
        /// User id
        #[arg(short, long)]
        user: i64,
        /// Month (YYYY-MM)
        month: String,
    },

    /// List a user's stored analyses
    List {
        /// User id
        #[arg(short, long)]
        user: i64,
    },
}

#[derive(Subcommand)]
pub enum BudgetAction {
    /// Save a budget plan, replacing the user's previous one
    Set {
        /// User id
        #[arg(short, long)]
        user: i64,
        /// Income line as "Title=amount" (repeatable)
        #[arg(long = "income")]
        incomes: Vec<String>,
        /// Expense line as "Title=amount" (repeatable)
        #[arg(long = "expense")]
        expenses: Vec<String>,
        /// Plan total (defaults to incomes minus expenses)
        #[arg(long, allow_hyphen_values = true)]
        summary: Option<f64>,
    },

    /// Show the user's budget plan
    Show {
        /// User id
        #[arg(short, long)]
        user: i64,
    },
}
