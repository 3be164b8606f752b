//! Budget plan command implementations

use anyhow::{Context, Result};
use moneyplan_core::db::Database;
use moneyplan_core::models::{
    net_of_items, BudgetPlan, BudgetPlanItem, NewBudgetPlan, NewBudgetPlanItem,
};
use moneyplan_core::BudgetPlanEngine;

use super::{accept, truncate, Output};

/// Parse a "Title=amount" budget line
pub fn parse_item(line: &str, is_income: bool) -> Result<NewBudgetPlanItem> {
    let (title, amount) = line
        .rsplit_once('=')
        .with_context(|| format!("Invalid budget line '{}', expected Title=amount", line))?;
    let amount: f64 = amount
        .trim()
        .parse()
        .with_context(|| format!("Invalid amount in budget line '{}'", line))?;

    Ok(NewBudgetPlanItem {
        title: title.trim().to_string(),
        amount,
        is_income,
    })
}

/// One table row; the kind column fits "expense"
pub fn item_row(item: &BudgetPlanItem) -> String {
    format!(
        "   {:<7}  {:<30}  {:>12.2}",
        if item.is_income { "income" } else { "expense" },
        truncate(&item.title, 30),
        item.signed_amount()
    )
}

fn print_plan(plan: &BudgetPlan) {
    println!();
    println!("📋 Budget plan #{} for user {}", plan.id, plan.user_id);
    println!("   ─────────────────────────────────────────────────────────────");
    for item in &plan.items {
        println!("{}", item_row(item));
    }
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Net of items: {:.2}", plan.net_of_items());
    println!("   Summary: {:.2}", plan.summary_amount);
    println!();
}

pub fn cmd_budget_set(
    db: &Database,
    user_id: i64,
    incomes: &[String],
    expenses: &[String],
    summary: Option<f64>,
    out: Output,
) -> Result<()> {
    let items = incomes
        .iter()
        .map(|s| parse_item(s, true))
        .chain(expenses.iter().map(|s| parse_item(s, false)))
        .collect::<Result<Vec<_>>>()?;

    let plan = NewBudgetPlan {
        summary_amount: summary.unwrap_or_else(|| net_of_items(&items)),
    };

    let engine = BudgetPlanEngine::new(db);
    let created = accept(engine.create_budget_plan(plan, items, user_id)?, "Budget plan")?;

    out.emit(&created, || {
        println!(
            "✅ Saved budget plan #{} with {} line(s)",
            created.id,
            created.items.len()
        );
        print_plan(&created);
    })
}

pub fn cmd_budget_show(db: &Database, user_id: i64, out: Output) -> Result<()> {
    let engine = BudgetPlanEngine::new(db);
    let plan = engine
        .get_user_budget_plan(user_id)?
        .with_context(|| format!("No budget plan for user {}", user_id))?;

    out.emit(&plan, || print_plan(&plan))
}
