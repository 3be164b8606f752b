//! Audit log command

use anyhow::Result;
use moneyplan_core::db::Database;

use super::Output;

pub fn cmd_audit(db: &Database, limit: i64, out: Output) -> Result<()> {
    let entries = db.list_audit_log(limit)?;

    out.emit(&entries, || {
        if entries.is_empty() {
            println!("Audit log is empty.");
            return;
        }

        println!();
        println!("📜 Audit log");
        println!("   ─────────────────────────────────────────────────────────────");
        for entry in &entries {
            let target = match entry.entity_id {
                Some(id) => format!("{} #{}", entry.entity_type.as_deref().unwrap_or("-"), id),
                None => entry.entity_type.clone().unwrap_or_else(|| "-".to_string()),
            };
            println!(
                "   {}  {:<24}  {:<20}  {}",
                entry.timestamp,
                entry.action,
                target,
                entry.details.as_deref().unwrap_or("")
            );
        }
        println!();
    })
}
