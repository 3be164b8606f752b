//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Core commands (init, status) and shared utilities (open_db)
//! - `users` - User management commands (list, add, show)
//! - `entries` - Income and expense commands (add, list, show, edit, delete)
//! - `analysis` - Monthly analysis commands (create, show, list)
//! - `budget` - Budget plan commands (set, show)
//! - `audit` - Audit log listing

pub mod analysis;
pub mod audit;
pub mod budget;
pub mod core;
pub mod entries;
pub mod users;

// Re-export command functions for main.rs
pub use analysis::*;
pub use audit::*;
pub use budget::*;
pub use core::*;
pub use entries::*;
pub use users::*;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use moneyplan_core::models::Outcome;
use serde::Serialize;

/// How command results are printed
#[derive(Debug, Clone, Copy, Default)]
pub struct Output {
    pub json: bool,
}

impl Output {
    /// Print `value` as pretty JSON, or run `human` for the table form
    pub fn emit<T: Serialize>(&self, value: &T, human: impl FnOnce()) -> Result<()> {
        if self.json {
            let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
            println!("{}", json);
        } else {
            human();
        }
        Ok(())
    }
}

/// Unwrap an engine outcome, turning a rejection into a CLI error
pub fn accept<T>(outcome: Outcome<T>, what: &str) -> Result<T> {
    match outcome {
        Outcome::Ok(value) => Ok(value),
        Outcome::Rejected(status) => bail!("{} rejected: {} ({})", what, status, status.as_str()),
    }
}

/// Parse "YYYY-MM" into (year, month)
pub fn parse_month(s: &str) -> Result<(i32, u32)> {
    let (year, month) = s
        .split_once('-')
        .with_context(|| format!("Invalid month '{}', expected YYYY-MM", s))?;
    let year: i32 = year
        .parse()
        .with_context(|| format!("Invalid year in '{}'", s))?;
    let month: u32 = month
        .parse()
        .with_context(|| format!("Invalid month in '{}'", s))?;
    Ok((year, month))
}

/// Parse "YYYY-MM-DD"
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
