//! MoneyPlan Core Library
//!
//! Shared functionality for the MoneyPlan personal finance tracker:
//! - Database access and migrations (users, incomes, expenses)
//! - Monthly analysis engine (one replaceable snapshot per user and month)
//! - Budget plan engine (one replaceable plan per user)
//! - Title and amount validation
//! - Settings file loading

pub mod analysis;
pub mod budget;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod store;
pub mod validation;

pub use analysis::AnalysisEngine;
pub use budget::BudgetPlanEngine;
pub use config::Settings;
pub use db::{AuditEntry, Database, DatabaseOptions};
pub use error::{Error, Result};
pub use models::{Outcome, Status};
pub use store::{RecordStore, TransactionalStore};
