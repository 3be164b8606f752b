//! Income and expense command implementations

use anyhow::{Context, Result};
use chrono::Local;
use moneyplan_core::db::Database;
use moneyplan_core::models::{Entry, EntryKind, NewEntry};

use super::{accept, parse_date, truncate, Output};

/// Fields given to `edit`; anything left out keeps its current value
#[derive(Debug, Default)]
pub struct EntryChanges {
    pub title: Option<String>,
    pub amount: Option<f64>,
    pub date: Option<String>,
    pub recurring: Option<bool>,
}

fn label(kind: EntryKind) -> &'static str {
    match kind {
        EntryKind::Income => "Income",
        EntryKind::Expense => "Expense",
    }
}

fn print_entries(kind: EntryKind, entries: &[Entry]) {
    let icon = match kind {
        EntryKind::Income => "💰",
        EntryKind::Expense => "💸",
    };

    println!();
    println!("{} {}s", icon, label(kind));
    println!("   ─────────────────────────────────────────────────────────────");
    println!(
        "   {:>5}  {:<10}  {:<30}  {:>12}",
        "ID", "Date", "Title", "Amount"
    );
    for entry in entries {
        println!(
            "   {:>5}  {:<10}  {:<30}  {:>12.2}{}",
            entry.id,
            entry.date.format("%Y-%m-%d"),
            truncate(&entry.title, 30),
            entry.amount,
            if entry.recurring { "  ↻" } else { "" }
        );
    }

    let total: f64 = entries.iter().map(|e| e.amount).sum();
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   {:>5}  {:<10}  {:<30}  {:>12.2}", "", "", "Total", total);
    println!();
}

#[allow(clippy::too_many_arguments)]
pub fn cmd_entry_add(
    db: &Database,
    kind: EntryKind,
    user_id: i64,
    title: &str,
    amount: f64,
    date: Option<&str>,
    recurring: bool,
    out: Output,
) -> Result<()> {
    let date = match date {
        Some(d) => parse_date(d)?,
        None => Local::now().date_naive(),
    };

    let new_entry = NewEntry::new(title, amount, date).recurring(recurring);
    let entry = accept(db.add_entry(kind, user_id, &new_entry)?, label(kind))?;

    out.emit(&entry, || {
        println!(
            "✅ Recorded {} '{}' of {:.2} on {} (ID: {})",
            kind,
            entry.title,
            entry.amount,
            entry.date.format("%Y-%m-%d"),
            entry.id
        );
    })
}

pub fn cmd_entry_list(
    db: &Database,
    kind: EntryKind,
    user_id: i64,
    month: Option<(i32, u32)>,
    out: Output,
) -> Result<()> {
    let entries = match month {
        Some((year, month)) => db.list_user_entries_by_month(kind, user_id, year, month)?,
        None => db.list_user_entries(kind, user_id)?,
    };

    out.emit(&entries, || {
        if entries.is_empty() {
            println!("No {}s found for user {}.", kind, user_id);
        } else {
            print_entries(kind, &entries);
        }
    })
}

fn load_entry(db: &Database, kind: EntryKind, id: i64) -> Result<Entry> {
    db.get_entry(kind, id)?
        .with_context(|| format!("{} not found: {}", label(kind), id))
}

pub fn cmd_entry_show(db: &Database, kind: EntryKind, id: i64, out: Output) -> Result<()> {
    let entry = load_entry(db, kind, id)?;

    out.emit(&entry, || {
        println!();
        println!("{} #{}: {}", label(kind), entry.id, entry.title);
        println!("   User: {}", entry.user_id);
        println!("   Amount: {:.2}", entry.amount);
        println!("   Date: {}", entry.date.format("%Y-%m-%d"));
        println!("   Recurring: {}", if entry.recurring { "yes" } else { "no" });
        println!();
    })
}

pub fn cmd_entry_edit(
    db: &Database,
    kind: EntryKind,
    id: i64,
    changes: EntryChanges,
    out: Output,
) -> Result<()> {
    let current = load_entry(db, kind, id)?;

    let date = match changes.date.as_deref() {
        Some(d) => parse_date(d)?,
        None => current.date,
    };
    let updated = NewEntry {
        title: changes.title.unwrap_or(current.title),
        amount: changes.amount.unwrap_or(current.amount),
        date,
        recurring: changes.recurring.unwrap_or(current.recurring),
    };

    let entry = accept(db.edit_entry(kind, id, &updated)?, label(kind))?;

    out.emit(&entry, || {
        println!("✅ Updated {} #{}", kind, entry.id);
    })
}

pub fn cmd_entry_delete(db: &Database, kind: EntryKind, id: i64, out: Output) -> Result<()> {
    let deleted = db
        .delete_entry(kind, id)?
        .with_context(|| format!("{} not found: {}", label(kind), id))?;

    out.emit(&deleted, || {
        println!("🗑️  Deleted {} #{} ({})", kind, deleted.id, deleted.title);
    })
}
