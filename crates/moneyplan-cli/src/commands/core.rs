//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `cmd_init` - Initialize the database
//! - `cmd_status` - Show database location, encryption and row counts

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use moneyplan_core::db::{Database, DB_KEY_ENV};
use moneyplan_core::Settings;

/// Open database with encryption by default, or unencrypted if --no-encrypt
pub fn open_db(db_path: &Path, settings: &Settings, no_encrypt: bool) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .with_context(|| format!("Database path is not valid UTF-8: {}", db_path.display()))?;
    let options = settings.database_options();

    if no_encrypt {
        Database::open(path_str, None, &options).context("Failed to open database (unencrypted)")
    } else {
        let Ok(key) = std::env::var(DB_KEY_ENV) else {
            bail!(
                "Database encryption required. Set {} or use --no-encrypt for an unencrypted database.",
                DB_KEY_ENV
            );
        };
        Database::open(path_str, Some(&key), &options).context("Failed to open database")
    }
}

pub fn cmd_init(db_path: &Path, settings: &Settings, no_encrypt: bool) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    open_db(db_path, settings, no_encrypt)?;

    if no_encrypt {
        println!("   ⚠️  Encryption: DISABLED (--no-encrypt)");
    } else {
        println!("   🔒 Encryption: ENABLED");
    }

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Create a user: moneyplan users add <name>");
    println!("  2. Record entries: moneyplan income add -u <id> Salary 3000");
    println!("  3. Analyse a month: moneyplan analysis create -u <id> 2024-01");

    Ok(())
}

pub fn cmd_status(db_path: &Path, settings: &Settings, no_encrypt: bool) -> Result<()> {
    println!();
    println!("📊 MoneyPlan Status");
    println!("   ─────────────────────────────────────────────────────────────");

    println!("   Database: {}", db_path.display());

    if db_path.exists() {
        if let Ok(metadata) = fs::metadata(db_path) {
            let size_kb = metadata.len() as f64 / 1024.0;
            if size_kb < 1024.0 {
                println!("   Size: {:.1} KB", size_kb);
            } else {
                println!("   Size: {:.1} MB", size_kb / 1024.0);
            }
        }
    } else {
        println!("   Size: (database not initialized)");
    }

    let has_key = std::env::var(DB_KEY_ENV).is_ok();
    if no_encrypt {
        println!("   ⚠️  Encryption: DISABLED (--no-encrypt)");
    } else if has_key {
        println!("   🔒 Encryption: ENABLED ({}=***)", DB_KEY_ENV);
    } else {
        println!("   ❌ Encryption: REQUIRED but {} not set", DB_KEY_ENV);
    }

    if db_path.exists() {
        match open_db(db_path, settings, no_encrypt) {
            Ok(db) => {
                if let Ok(stats) = db.get_stats() {
                    println!();
                    println!("   Users: {}", stats.users);
                    println!("   Incomes: {}", stats.incomes);
                    println!("   Expenses: {}", stats.expenses);
                    println!("   Month analyses: {}", stats.month_analyses);
                    println!("   Budget plans: {}", stats.budget_plans);
                }
            }
            Err(e) => {
                println!();
                println!("   ❌ Error opening database: {:#}", e);
                if !no_encrypt && !has_key {
                    println!("      Set {} or use --no-encrypt", DB_KEY_ENV);
                } else if has_key {
                    println!("      (Check if {} is correct)", DB_KEY_ENV);
                }
            }
        }
    }

    println!();
    Ok(())
}
