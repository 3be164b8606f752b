//! Record store seam used by the engines
//!
//! The engines never reach for a global connection. They are handed a
//! [`TransactionalStore`] and do all their reads and writes through the
//! [`RecordStore`] it lends them for the length of one transaction.

use crate::error::Result;
use crate::models::{
    BudgetPlan, BudgetPlanItem, Entry, EntryKind, MonthAnalysis, NewBudgetPlan,
    NewBudgetPlanItem, NewMonthAnalysis, User,
};

/// Per-entity lookups and writes available inside a transaction
pub trait RecordStore {
    fn find_user(&self, user_id: i64) -> Result<Option<User>>;

    /// Entries owned by a user, optionally narrowed to a year and month
    fn list_entries(
        &self,
        kind: EntryKind,
        user_id: i64,
        year: Option<i32>,
        month: Option<u32>,
    ) -> Result<Vec<Entry>>;

    fn list_incomes(&self, user_id: i64, year: Option<i32>, month: Option<u32>) -> Result<Vec<Entry>> {
        self.list_entries(EntryKind::Income, user_id, year, month)
    }

    fn list_expenses(&self, user_id: i64, year: Option<i32>, month: Option<u32>) -> Result<Vec<Entry>> {
        self.list_entries(EntryKind::Expense, user_id, year, month)
    }

    fn find_month_analysis(&self, id: i64) -> Result<Option<MonthAnalysis>>;

    fn find_month_analyses_by_key(
        &self,
        user_id: i64,
        year: i32,
        month: u32,
    ) -> Result<Vec<MonthAnalysis>>;

    fn list_month_analyses(&self, user_id: i64) -> Result<Vec<MonthAnalysis>>;

    fn delete_month_analyses(&self, analyses: &[MonthAnalysis]) -> Result<()>;

    fn insert_month_analysis(&self, analysis: NewMonthAnalysis) -> Result<MonthAnalysis>;

    fn find_budget_plan(&self, id: i64) -> Result<Option<BudgetPlan>>;

    /// The user's plan with its items
    fn find_budget_plan_by_user(&self, user_id: i64) -> Result<Option<BudgetPlan>>;

    fn delete_budget_plan_items(&self, items: &[BudgetPlanItem]) -> Result<()>;

    /// Delete the plan row only; its items must already be gone
    fn delete_budget_plan(&self, plan: &BudgetPlan) -> Result<()>;

    /// Insert an empty plan for the user
    fn insert_budget_plan(&self, user_id: i64, plan: &NewBudgetPlan) -> Result<BudgetPlan>;

    fn insert_budget_plan_item(
        &self,
        budget_plan_id: i64,
        item: &NewBudgetPlanItem,
    ) -> Result<BudgetPlanItem>;

    fn record_audit(
        &self,
        action: &str,
        entity_type: &str,
        entity_id: Option<i64>,
        details: Option<&str>,
    ) -> Result<i64>;
}

/// A store that can run a unit of work atomically
pub trait TransactionalStore {
    /// Run `f` in a write transaction
    ///
    /// Commits when `f` returns `Ok` (a rejected outcome still commits) and
    /// rolls back when it returns `Err`. The write lock is taken before `f`
    /// runs, so concurrent writers are serialized.
    fn with_transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn RecordStore) -> Result<T>;

    /// Run `f` against a consistent read snapshot
    fn with_snapshot<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn RecordStore) -> Result<T>;
}
