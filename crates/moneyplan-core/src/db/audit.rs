//! Audit log and status counts

use rusqlite::{params, Connection};

use super::Database;
use crate::error::Result;
use crate::models::Stats;

/// Audit log entry
#[derive(Debug, Clone, serde::Serialize)]
pub struct AuditEntry {
    pub id: i64,
    pub timestamp: String,
    pub action: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<i64>,
    pub details: Option<String>,
}

pub(crate) fn insert_audit(
    conn: &Connection,
    action: &str,
    entity_type: &str,
    entity_id: Option<i64>,
    details: Option<&str>,
) -> Result<i64> {
    conn.execute(
        r#"
        INSERT INTO audit_log (action, entity_type, entity_id, details)
        VALUES (?, ?, ?, ?)
        "#,
        params![action, entity_type, entity_id, details],
    )?;

    Ok(conn.last_insert_rowid())
}

impl Database {
    /// List audit log entries, newest first
    pub fn list_audit_log(&self, limit: i64) -> Result<Vec<AuditEntry>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, timestamp, action, entity_type, entity_id, details
            FROM audit_log
            ORDER BY timestamp DESC, id DESC
            LIMIT ?
            "#,
        )?;

        let entries = stmt
            .query_map(params![limit], |row| {
                Ok(AuditEntry {
                    id: row.get(0)?,
                    timestamp: row.get(1)?,
                    action: row.get(2)?,
                    entity_type: row.get(3)?,
                    entity_id: row.get(4)?,
                    details: row.get(5)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Row counts per table
    pub fn get_stats(&self) -> Result<Stats> {
        let conn = self.conn()?;
        let count = |table: &str| -> Result<i64> {
            Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get(0)
            })?)
        };

        Ok(Stats {
            users: count("users")?,
            incomes: count("incomes")?,
            expenses: count("expenses")?,
            month_analyses: count("month_analyses")?,
            budget_plans: count("budget_plans")?,
        })
    }
}
