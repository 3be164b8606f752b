//! Monthly analysis engine
//!
//! Builds a snapshot of one user's incomes and expenses for a calendar month
//! and keeps at most one such snapshot per (user, year, month). Recomputing a
//! month deletes the old snapshot before inserting the new one, all inside a
//! single store transaction.

use tracing::{debug, info};

use crate::error::Result;
use crate::models::{Entry, MonthAnalysis, NewMonthAnalysis, Outcome, Status};
use crate::store::TransactionalStore;

/// Sum of incomes minus sum of expenses
pub fn summary_amount(incomes: &[Entry], expenses: &[Entry]) -> f64 {
    let incoming: f64 = incomes.iter().map(|e| e.amount).sum();
    let outgoing: f64 = expenses.iter().map(|e| e.amount).sum();
    incoming - outgoing
}

pub struct AnalysisEngine<'a, S: TransactionalStore> {
    store: &'a S,
}

impl<'a, S: TransactionalStore> AnalysisEngine<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Compute and store the analysis for `month`/`year`, replacing any earlier one
    ///
    /// Rejections:
    /// - `NotFound` when the user does not exist (nothing is touched)
    /// - `NoDataToMakeAnalysis` when the month has no entries; a stale
    ///   analysis for the key is still removed
    pub fn create_month_analysis(
        &self,
        month: u32,
        year: i32,
        user_id: i64,
    ) -> Result<Outcome<MonthAnalysis>> {
        self.store.with_transaction(|store| {
            if store.find_user(user_id)?.is_none() {
                debug!("Analysis requested for unknown user {}", user_id);
                return Ok(Outcome::Rejected(Status::NotFound));
            }

            let stale = store.find_month_analyses_by_key(user_id, year, month)?;
            if !stale.is_empty() {
                store.delete_month_analyses(&stale)?;
                debug!(
                    "Removed {} stale analysis row(s) for user {} {}-{:02}",
                    stale.len(),
                    user_id,
                    year,
                    month
                );
            }

            let incomes = store.list_incomes(user_id, Some(year), Some(month))?;
            let expenses = store.list_expenses(user_id, Some(year), Some(month))?;
            let no_data = incomes.is_empty() && expenses.is_empty();

            // Without data the stale rows are dropped, not replaced
            let action = if no_data {
                "month_analysis.deleted"
            } else {
                "month_analysis.replaced"
            };
            for old in &stale {
                store.record_audit(
                    action,
                    "month_analysis",
                    Some(old.id),
                    Some(&format!("{}-{:02}", year, month)),
                )?;
            }

            if no_data {
                info!(
                    "No entries for user {} in {}-{:02}, analysis not created",
                    user_id, year, month
                );
                return Ok(Outcome::Rejected(Status::NoDataToMakeAnalysis));
            }

            let summary = summary_amount(&incomes, &expenses);
            let analysis = store.insert_month_analysis(NewMonthAnalysis {
                user_id,
                year,
                month,
                incomes,
                expenses,
                summary_amount: summary,
            })?;
            store.record_audit(
                "month_analysis.created",
                "month_analysis",
                Some(analysis.id),
                Some(&format!("{}-{:02} summary {:.2}", year, month, summary)),
            )?;

            info!(
                "Created analysis {} for user {} {}-{:02}: {} incomes, {} expenses, summary {:.2}",
                analysis.id,
                user_id,
                year,
                month,
                analysis.incomes.len(),
                analysis.expenses.len(),
                summary
            );
            Ok(Outcome::Ok(analysis))
        })
    }

    /// Look up an analysis by id, with its entries
    pub fn get_month_analysis(&self, id: i64) -> Result<Option<MonthAnalysis>> {
        self.store.with_snapshot(|store| store.find_month_analysis(id))
    }

    /// Look up the analysis for a user's month
    ///
    /// Returns None for an unknown user even if rows for the key exist.
    pub fn get_month_analysis_by_month(
        &self,
        month: u32,
        year: i32,
        user_id: i64,
    ) -> Result<Option<MonthAnalysis>> {
        self.store.with_snapshot(|store| {
            if store.find_user(user_id)?.is_none() {
                return Ok(None);
            }
            Ok(store
                .find_month_analyses_by_key(user_id, year, month)?
                .into_iter()
                .next())
        })
    }

    /// All analyses for a user, oldest month first
    pub fn list_month_analyses(&self, user_id: i64) -> Result<Vec<MonthAnalysis>> {
        self.store
            .with_snapshot(|store| store.list_month_analyses(user_id))
    }
}
