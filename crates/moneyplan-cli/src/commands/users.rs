//! User command implementations

use anyhow::{Context, Result};
use moneyplan_core::db::Database;
use moneyplan_core::models::User;

use super::{accept, truncate, Output};

pub fn cmd_users_list(db: &Database, out: Output) -> Result<()> {
    let users = db.list_users()?;

    out.emit(&users, || {
        if users.is_empty() {
            println!("No users yet. Create one with 'moneyplan users add <name>'.");
            return;
        }

        println!();
        println!("👤 Users");
        println!("   ─────────────────────────────────────────────────────────────");
        println!("   {:>5}  {:<30}  {}", "ID", "Username", "Created");
        for user in &users {
            println!(
                "   {:>5}  {:<30}  {}",
                user.id,
                truncate(&user.username, 30),
                user.created_at.format("%Y-%m-%d")
            );
        }
        println!();
    })
}

pub fn cmd_users_add(db: &Database, username: &str, out: Output) -> Result<()> {
    let user = accept(db.create_user(username)?, "User")?;

    out.emit(&user, || {
        println!("✅ Created user '{}' (ID: {})", user.username, user.id);
    })
}

/// Resolve a user by numeric id or by username
pub fn resolve_user(db: &Database, user: &str) -> Result<User> {
    let found = match user.parse::<i64>() {
        Ok(id) => db.get_user(id)?,
        Err(_) => db.get_user_by_username(user)?,
    };
    found.with_context(|| format!("User not found: {}", user))
}

pub fn cmd_users_show(db: &Database, user: &str, out: Output) -> Result<()> {
    let user = resolve_user(db, user)?;

    out.emit(&user, || {
        println!();
        println!("👤 {} (ID: {})", user.username, user.id);
        println!("   Created: {}", user.created_at.format("%Y-%m-%d %H:%M"));
        println!();
    })
}
