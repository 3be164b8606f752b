//! Budget plan storage

use rusqlite::{params, Connection, OptionalExtension};

use super::parse_datetime;
use crate::error::{Error, Result};
use crate::models::{BudgetPlan, BudgetPlanItem, NewBudgetPlan, NewBudgetPlanItem};

const PLAN_COLUMNS: &str = "id, user_id, summary_amount, created_at";

fn plan_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<BudgetPlan> {
    let created_at_str: String = row.get(3)?;
    Ok(BudgetPlan {
        id: row.get(0)?,
        user_id: row.get(1)?,
        items: Vec::new(),
        summary_amount: row.get(2)?,
        created_at: parse_datetime(&created_at_str),
    })
}

fn plan_items(conn: &Connection, budget_plan_id: i64) -> Result<Vec<BudgetPlanItem>> {
    let mut stmt = conn.prepare(
        "SELECT id, budget_plan_id, title, amount, is_income FROM budget_plan_items WHERE budget_plan_id = ? ORDER BY id",
    )?;

    let items = stmt
        .query_map(params![budget_plan_id], |row| {
            Ok(BudgetPlanItem {
                id: row.get(0)?,
                budget_plan_id: row.get(1)?,
                title: row.get(2)?,
                amount: row.get(3)?,
                is_income: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(items)
}

fn find_plan_where(
    conn: &Connection,
    column: &str,
    value: i64,
) -> Result<Option<BudgetPlan>> {
    let plan = conn
        .query_row(
            &format!(
                "SELECT {} FROM budget_plans WHERE {} = ?",
                PLAN_COLUMNS, column
            ),
            params![value],
            plan_from_row,
        )
        .optional()?;

    match plan {
        Some(mut plan) => {
            plan.items = plan_items(conn, plan.id)?;
            Ok(Some(plan))
        }
        None => Ok(None),
    }
}

pub(crate) fn find_budget_plan(conn: &Connection, id: i64) -> Result<Option<BudgetPlan>> {
    find_plan_where(conn, "id", id)
}

pub(crate) fn find_budget_plan_by_user(conn: &Connection, user_id: i64) -> Result<Option<BudgetPlan>> {
    find_plan_where(conn, "user_id", user_id)
}

pub(crate) fn delete_budget_plan_items(conn: &Connection, items: &[BudgetPlanItem]) -> Result<()> {
    let mut stmt = conn.prepare("DELETE FROM budget_plan_items WHERE id = ?")?;
    for item in items {
        stmt.execute(params![item.id])?;
    }
    Ok(())
}

/// Fails on the foreign key if any item still references the plan
pub(crate) fn delete_budget_plan(conn: &Connection, plan: &BudgetPlan) -> Result<()> {
    conn.execute("DELETE FROM budget_plans WHERE id = ?", params![plan.id])?;
    Ok(())
}

pub(crate) fn insert_budget_plan(
    conn: &Connection,
    user_id: i64,
    plan: &NewBudgetPlan,
) -> Result<BudgetPlan> {
    conn.execute(
        "INSERT INTO budget_plans (user_id, summary_amount) VALUES (?, ?)",
        params![user_id, plan.summary_amount],
    )?;
    let id = conn.last_insert_rowid();

    find_budget_plan(conn, id)?.ok_or_else(|| Error::NotFound(format!("budget plan {}", id)))
}

pub(crate) fn insert_budget_plan_item(
    conn: &Connection,
    budget_plan_id: i64,
    item: &NewBudgetPlanItem,
) -> Result<BudgetPlanItem> {
    conn.execute(
        "INSERT INTO budget_plan_items (budget_plan_id, title, amount, is_income) VALUES (?, ?, ?, ?)",
        params![budget_plan_id, item.title, item.amount, item.is_income],
    )?;

    Ok(BudgetPlanItem {
        id: conn.last_insert_rowid(),
        budget_plan_id,
        title: item.title.clone(),
        amount: item.amount,
        is_income: item.is_income,
    })
}
