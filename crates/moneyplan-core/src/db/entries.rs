//! Income and expense operations
//!
//! Both kinds share one schema shape, so every query is written once and
//! pointed at the right table through [`EntryKind`].

use chrono::Datelike;
use rusqlite::{params, Connection, OptionalExtension, ToSql};
use tracing::{debug, info};

use super::users::find_user;
use super::{date_column, parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{Entry, EntryKind, NewEntry, Outcome, Status};
use crate::validation::check_line;

const ENTRY_COLUMNS: &str = "id, user_id, title, amount, date, recurring, created_at";

pub(crate) fn entry_from_row(kind: EntryKind, row: &rusqlite::Row<'_>) -> rusqlite::Result<Entry> {
    let created_at_str: String = row.get(6)?;
    Ok(Entry {
        id: row.get(0)?,
        user_id: row.get(1)?,
        kind,
        title: row.get(2)?,
        amount: row.get(3)?,
        date: date_column(row, 4)?,
        recurring: row.get(5)?,
        created_at: parse_datetime(&created_at_str),
    })
}

pub(crate) fn find_entry(conn: &Connection, kind: EntryKind, id: i64) -> Result<Option<Entry>> {
    let entry = conn
        .query_row(
            &format!(
                "SELECT {} FROM {} WHERE id = ?",
                ENTRY_COLUMNS,
                kind.table()
            ),
            params![id],
            |row| entry_from_row(kind, row),
        )
        .optional()?;
    Ok(entry)
}

/// Entries owned by a user, optionally narrowed to a calendar year and month
///
/// Filters on the stored `year`/`month` columns, so any year chrono can
/// represent matches and a month outside 1-12 matches nothing.
pub(crate) fn list_entries(
    conn: &Connection,
    kind: EntryKind,
    user_id: i64,
    year: Option<i32>,
    month: Option<u32>,
) -> Result<Vec<Entry>> {
    let mut sql = format!(
        "SELECT {} FROM {} WHERE user_id = ?",
        ENTRY_COLUMNS,
        kind.table()
    );
    let mut query_params: Vec<Box<dyn ToSql>> = vec![Box::new(user_id)];

    if let Some(year) = year {
        sql.push_str(" AND year = ?");
        query_params.push(Box::new(year));
    }
    if let Some(month) = month {
        sql.push_str(" AND month = ?");
        query_params.push(Box::new(month));
    }
    sql.push_str(" ORDER BY year, month, date, id");

    let param_refs: Vec<&dyn ToSql> = query_params.iter().map(|p| p.as_ref()).collect();
    let mut stmt = conn.prepare(&sql)?;
    let entries = stmt
        .query_map(param_refs.as_slice(), |row| entry_from_row(kind, row))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(entries)
}

impl Database {
    /// Record an income or expense for a user
    pub fn add_entry(&self, kind: EntryKind, user_id: i64, entry: &NewEntry) -> Result<Outcome<Entry>> {
        let conn = self.conn()?;

        if find_user(&conn, user_id)?.is_none() {
            return Ok(Outcome::Rejected(Status::NotFound));
        }
        if let Err(status) = check_line(&entry.title, entry.amount) {
            debug!(%kind, ?status, "Entry rejected");
            return Ok(Outcome::Rejected(status));
        }

        conn.execute(
            &format!(
                "INSERT INTO {} (user_id, title, amount, date, year, month, recurring) VALUES (?, ?, ?, ?, ?, ?, ?)",
                kind.table()
            ),
            params![
                user_id,
                entry.title,
                entry.amount,
                entry.date.to_string(),
                entry.date.year(),
                entry.date.month(),
                entry.recurring
            ],
        )?;
        let id = conn.last_insert_rowid();
        info!(%kind, id, user_id, "Entry recorded");

        find_entry(&conn, kind, id)?
            .map(Outcome::Ok)
            .ok_or_else(|| Error::NotFound(format!("{} {}", kind, id)))
    }

    /// Get an income or expense by ID
    pub fn get_entry(&self, kind: EntryKind, id: i64) -> Result<Option<Entry>> {
        let conn = self.conn()?;
        find_entry(&conn, kind, id)
    }

    /// All entries of a kind for a user, oldest first
    pub fn list_user_entries(&self, kind: EntryKind, user_id: i64) -> Result<Vec<Entry>> {
        let conn = self.conn()?;
        list_entries(&conn, kind, user_id, None, None)
    }

    /// Entries of a kind for a user in one calendar month
    pub fn list_user_entries_by_month(
        &self,
        kind: EntryKind,
        user_id: i64,
        year: i32,
        month: u32,
    ) -> Result<Vec<Entry>> {
        let conn = self.conn()?;
        list_entries(&conn, kind, user_id, Some(year), Some(month))
    }

    /// Replace the editable fields of an entry
    ///
    /// Stored analyses keep the summary computed when they were created.
    pub fn edit_entry(&self, kind: EntryKind, id: i64, entry: &NewEntry) -> Result<Outcome<Entry>> {
        let conn = self.conn()?;

        if find_entry(&conn, kind, id)?.is_none() {
            return Ok(Outcome::Rejected(Status::NotFound));
        }
        if let Err(status) = check_line(&entry.title, entry.amount) {
            return Ok(Outcome::Rejected(status));
        }

        conn.execute(
            &format!(
                "UPDATE {} SET title = ?, amount = ?, date = ?, year = ?, month = ?, recurring = ? WHERE id = ?",
                kind.table()
            ),
            params![
                entry.title,
                entry.amount,
                entry.date.to_string(),
                entry.date.year(),
                entry.date.month(),
                entry.recurring,
                id
            ],
        )?;
        info!(%kind, id, "Entry updated");

        find_entry(&conn, kind, id)?
            .map(Outcome::Ok)
            .ok_or_else(|| Error::NotFound(format!("{} {}", kind, id)))
    }

    /// Delete an entry, detaching it from any stored analyses first
    ///
    /// Returns the deleted entry, or None if it did not exist.
    pub fn delete_entry(&self, kind: EntryKind, id: i64) -> Result<Option<Entry>> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let Some(entry) = find_entry(&tx, kind, id)? else {
            return Ok(None);
        };

        tx.execute(
            &format!(
                "DELETE FROM {} WHERE {} = ?",
                kind.link_table(),
                kind.link_column()
            ),
            params![id],
        )?;
        tx.execute(
            &format!("DELETE FROM {} WHERE id = ?", kind.table()),
            params![id],
        )?;
        tx.commit()?;

        info!(%kind, id, "Entry deleted");
        Ok(Some(entry))
    }
}
