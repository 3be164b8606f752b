//! Budget plan replacement engine
//!
//! A user owns at most one plan. Saving a plan validates every line first,
//! then removes the previous plan (items, then the plan row) and inserts the
//! new one, all in one store transaction.

use tracing::{debug, info};

use crate::error::Result;
use crate::models::{BudgetPlan, NewBudgetPlan, NewBudgetPlanItem, Outcome, Status};
use crate::store::TransactionalStore;
use crate::validation::check_lines;

pub struct BudgetPlanEngine<'a, S: TransactionalStore> {
    store: &'a S,
}

impl<'a, S: TransactionalStore> BudgetPlanEngine<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Replace the user's budget plan with `plan` and `items`
    ///
    /// Rejections (`NotFound`, `InvalidAmountOfCharacters`, `InvalidAmount`)
    /// happen before any write, so an existing plan is left as it was.
    pub fn create_budget_plan(
        &self,
        plan: NewBudgetPlan,
        items: Vec<NewBudgetPlanItem>,
        user_id: i64,
    ) -> Result<Outcome<BudgetPlan>> {
        self.store.with_transaction(|store| {
            if store.find_user(user_id)?.is_none() {
                debug!("Budget plan requested for unknown user {}", user_id);
                return Ok(Outcome::Rejected(Status::NotFound));
            }

            if let Err(status) = check_lines(
                items
                    .iter()
                    .map(|item| (item.title.as_str(), item.amount)),
            ) {
                info!("Budget plan for user {} rejected: {}", user_id, status);
                return Ok(Outcome::Rejected(status));
            }

            if let Some(previous) = store.find_budget_plan_by_user(user_id)? {
                store.delete_budget_plan_items(&previous.items)?;
                store.delete_budget_plan(&previous)?;
                store.record_audit(
                    "budget_plan.replaced",
                    "budget_plan",
                    Some(previous.id),
                    Some(&format!("{} item(s) removed", previous.items.len())),
                )?;
                debug!(
                    "Removed budget plan {} ({} items) for user {}",
                    previous.id,
                    previous.items.len(),
                    user_id
                );
            }

            let mut created = store.insert_budget_plan(user_id, &plan)?;
            for item in &items {
                let stored = store.insert_budget_plan_item(created.id, item)?;
                created.items.push(stored);
            }
            store.record_audit(
                "budget_plan.created",
                "budget_plan",
                Some(created.id),
                Some(&format!("{} item(s)", created.items.len())),
            )?;

            info!(
                "Created budget plan {} for user {} with {} items",
                created.id,
                user_id,
                created.items.len()
            );
            Ok(Outcome::Ok(created))
        })
    }

    /// Look up a plan by id, with its items
    pub fn get_budget_plan(&self, id: i64) -> Result<Option<BudgetPlan>> {
        self.store.with_snapshot(|store| store.find_budget_plan(id))
    }

    /// Look up a user's plan, with its items
    pub fn get_user_budget_plan(&self, user_id: i64) -> Result<Option<BudgetPlan>> {
        self.store
            .with_snapshot(|store| store.find_budget_plan_by_user(user_id))
    }
}
