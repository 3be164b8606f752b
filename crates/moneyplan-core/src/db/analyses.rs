//! Month analysis storage
//!
//! An analysis row carries the key and the summary; the entries it was
//! computed from live in the `month_analysis_incomes` and
//! `month_analysis_expenses` link tables.

use rusqlite::{params, Connection, OptionalExtension};

use super::entries::entry_from_row;
use super::parse_datetime;
use crate::error::{Error, Result};
use crate::models::{Entry, EntryKind, MonthAnalysis, NewMonthAnalysis};

const ANALYSIS_COLUMNS: &str = "id, user_id, year, month, summary_amount, created_at";

/// Analysis row without its entries
fn analysis_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MonthAnalysis> {
    let created_at_str: String = row.get(5)?;
    Ok(MonthAnalysis {
        id: row.get(0)?,
        user_id: row.get(1)?,
        year: row.get(2)?,
        month: row.get(3)?,
        incomes: Vec::new(),
        expenses: Vec::new(),
        summary_amount: row.get(4)?,
        created_at: parse_datetime(&created_at_str),
    })
}

fn linked_entries(conn: &Connection, kind: EntryKind, analysis_id: i64) -> Result<Vec<Entry>> {
    let sql = format!(
        r#"
        SELECT e.id, e.user_id, e.title, e.amount, e.date, e.recurring, e.created_at
        FROM {table} e
        JOIN {link} l ON l.{column} = e.id
        WHERE l.analysis_id = ?
        ORDER BY e.year, e.month, e.date, e.id
        "#,
        table = kind.table(),
        link = kind.link_table(),
        column = kind.link_column(),
    );

    let mut stmt = conn.prepare(&sql)?;
    let entries = stmt
        .query_map(params![analysis_id], |row| entry_from_row(kind, row))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(entries)
}

fn with_entries(conn: &Connection, mut analysis: MonthAnalysis) -> Result<MonthAnalysis> {
    analysis.incomes = linked_entries(conn, EntryKind::Income, analysis.id)?;
    analysis.expenses = linked_entries(conn, EntryKind::Expense, analysis.id)?;
    Ok(analysis)
}

fn query_analyses(
    conn: &Connection,
    filter: &str,
    query_params: &[&dyn rusqlite::ToSql],
) -> Result<Vec<MonthAnalysis>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM month_analyses WHERE {} ORDER BY year, month, id",
        ANALYSIS_COLUMNS, filter
    ))?;
    let rows = stmt
        .query_map(query_params, analysis_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|analysis| with_entries(conn, analysis))
        .collect()
}

pub(crate) fn find_month_analysis(conn: &Connection, id: i64) -> Result<Option<MonthAnalysis>> {
    let analysis = conn
        .query_row(
            &format!(
                "SELECT {} FROM month_analyses WHERE id = ?",
                ANALYSIS_COLUMNS
            ),
            params![id],
            analysis_from_row,
        )
        .optional()?;

    analysis
        .map(|analysis| with_entries(conn, analysis))
        .transpose()
}

pub(crate) fn find_month_analyses_by_key(
    conn: &Connection,
    user_id: i64,
    year: i32,
    month: u32,
) -> Result<Vec<MonthAnalysis>> {
    query_analyses(
        conn,
        "user_id = ? AND year = ? AND month = ?",
        params![user_id, year, month],
    )
}

pub(crate) fn list_month_analyses(conn: &Connection, user_id: i64) -> Result<Vec<MonthAnalysis>> {
    query_analyses(conn, "user_id = ?", params![user_id])
}

/// Delete analyses together with their entry links (links first)
pub(crate) fn delete_month_analyses(conn: &Connection, analyses: &[MonthAnalysis]) -> Result<()> {
    for analysis in analyses {
        conn.execute(
            "DELETE FROM month_analysis_incomes WHERE analysis_id = ?",
            params![analysis.id],
        )?;
        conn.execute(
            "DELETE FROM month_analysis_expenses WHERE analysis_id = ?",
            params![analysis.id],
        )?;
        conn.execute(
            "DELETE FROM month_analyses WHERE id = ?",
            params![analysis.id],
        )?;
    }
    Ok(())
}

pub(crate) fn insert_month_analysis(
    conn: &Connection,
    analysis: NewMonthAnalysis,
) -> Result<MonthAnalysis> {
    conn.execute(
        "INSERT INTO month_analyses (user_id, year, month, summary_amount) VALUES (?, ?, ?, ?)",
        params![
            analysis.user_id,
            analysis.year,
            analysis.month,
            analysis.summary_amount
        ],
    )?;
    let id = conn.last_insert_rowid();

    for income in &analysis.incomes {
        conn.execute(
            "INSERT INTO month_analysis_incomes (analysis_id, income_id) VALUES (?, ?)",
            params![id, income.id],
        )?;
    }
    for expense in &analysis.expenses {
        conn.execute(
            "INSERT INTO month_analysis_expenses (analysis_id, expense_id) VALUES (?, ?)",
            params![id, expense.id],
        )?;
    }

    let created_at_str: String = conn.query_row(
        "SELECT created_at FROM month_analyses WHERE id = ?",
        params![id],
        |row| row.get(0),
    )
    .optional()?
    .ok_or_else(|| Error::NotFound(format!("month analysis {}", id)))?;

    Ok(MonthAnalysis {
        id,
        user_id: analysis.user_id,
        year: analysis.year,
        month: analysis.month,
        incomes: analysis.incomes,
        expenses: analysis.expenses,
        summary_amount: analysis.summary_amount,
        created_at: parse_datetime(&created_at_str),
    })
}
