//! MoneyPlan CLI - Personal finance tracker
//!
//! Usage:
//!   moneyplan init                                  Initialize database
//!   moneyplan users add alice                       Create a user
//!   moneyplan income add -u 1 Salary 3000           Record an income
//!   moneyplan analysis create -u 1 2023-01          Analyse a month
//!   moneyplan budget set -u 1 --income Salary=3000  Replace the budget plan

mod cli;
mod commands;


use anyhow::{Context, Result};
use clap::Parser;
use moneyplan_core::models::EntryKind;
use moneyplan_core::Settings;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > log_level setting
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new(&settings.log_level)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let db_path = cli
        .db
        .clone()
        .unwrap_or_else(|| settings.database_path.clone());
    let out = commands::Output { json: cli.json };

    match cli.command {
        Commands::Init => commands::cmd_init(&db_path, &settings, cli.no_encrypt),
        Commands::Status => commands::cmd_status(&db_path, &settings, cli.no_encrypt),
        Commands::Users { action } => {
            let db = commands::open_db(&db_path, &settings, cli.no_encrypt)?;
            match action {
                None | Some(UsersAction::List) => commands::cmd_users_list(&db, out),
                Some(UsersAction::Add { username }) => {
                    commands::cmd_users_add(&db, &username, out)
                }
                Some(UsersAction::Show { user }) => commands::cmd_users_show(&db, &user, out),
            }
        }
        Commands::Income { action } => {
            let db = commands::open_db(&db_path, &settings, cli.no_encrypt)?;
            run_entry_action(&db, EntryKind::Income, action, out)
        }
        Commands::Expense { action } => {
            let db = commands::open_db(&db_path, &settings, cli.no_encrypt)?;
            run_entry_action(&db, EntryKind::Expense, action, out)
        }
        Commands::Analysis { action } => {
            let db = commands::open_db(&db_path, &settings, cli.no_encrypt)?;
            match action {
                AnalysisAction::Create { user, month } => {
                    let (year, month) = commands::parse_month(&month)?;
                    commands::cmd_analysis_create(&db, user, year, month, out)
                }
                AnalysisAction::Show { user, month } => {
                    let (year, month) = commands::parse_month(&month)?;
                    commands::cmd_analysis_show(&db, user, year, month, out)
                }
                AnalysisAction::List { user } => commands::cmd_analysis_list(&db, user, out),
            }
        }
        Commands::Budget { action } => {
            let db = commands::open_db(&db_path, &settings, cli.no_encrypt)?;
            match action {
                BudgetAction::Set {
                    user,
                    incomes,
                    expenses,
                    summary,
                } => commands::cmd_budget_set(&db, user, &incomes, &expenses, summary, out),
                BudgetAction::Show { user } => commands::cmd_budget_show(&db, user, out),
            }
        }
        Commands::Audit { limit } => {
            let db = commands::open_db(&db_path, &settings, cli.no_encrypt)?;
            commands::cmd_audit(&db, limit, out)
        }
    }
}

fn run_entry_action(
    db: &moneyplan_core::Database,
    kind: EntryKind,
    action: EntryAction,
    out: commands::Output,
) -> Result<()> {
    match action {
        EntryAction::Add {
            user,
            title,
            amount,
            date,
            recurring,
        } => commands::cmd_entry_add(
            db,
            kind,
            user,
            &title,
            amount,
            date.as_deref(),
            recurring,
            out,
        ),
        EntryAction::List { user, month } => {
            let month = month.as_deref().map(commands::parse_month).transpose()?;
            commands::cmd_entry_list(db, kind, user, month, out)
        }
        EntryAction::Show { id } => commands::cmd_entry_show(db, kind, id, out),
        EntryAction::Edit {
            id,
            title,
            amount,
            date,
            recurring,
        } => commands::cmd_entry_edit(
            db,
            kind,
            id,
            commands::EntryChanges {
                title,
                amount,
                date,
                recurring,
            },
            out,
        ),
        EntryAction::Delete { id } => commands::cmd_entry_delete(db, kind, id, out),
    }
}
