//! User operations

use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::{Outcome, Status, User};
use crate::validation::is_valid_title;

const USER_COLUMNS: &str = "id, username, created_at";

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let created_at_str: String = row.get(2)?;
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        created_at: parse_datetime(&created_at_str),
    })
}

pub(crate) fn find_user(conn: &Connection, id: i64) -> Result<Option<User>> {
    let user = conn
        .query_row(
            &format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS),
            params![id],
            user_from_row,
        )
        .optional()?;
    Ok(user)
}

impl Database {
    /// Register a user; usernames are unique and follow the title length rule
    pub fn create_user(&self, username: &str) -> Result<Outcome<User>> {
        let username = username.trim();
        if !is_valid_title(username) {
            return Ok(Outcome::Rejected(Status::InvalidAmountOfCharacters));
        }

        let conn = self.conn()?;

        let taken: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?)",
            params![username],
            |row| row.get(0),
        )?;
        if taken {
            return Ok(Outcome::Rejected(Status::UsernameAlreadyExists));
        }

        conn.execute("INSERT INTO users (username) VALUES (?)", params![username])?;
        let id = conn.last_insert_rowid();
        info!(user_id = id, "User created");

        match find_user(&conn, id)? {
            Some(user) => Ok(Outcome::Ok(user)),
            None => Err(crate::error::Error::NotFound(format!("user {}", id))),
        }
    }

    /// Get a user by ID
    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        let conn = self.conn()?;
        find_user(&conn, id)
    }

    /// Get a user by username
    pub fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE username = ?", USER_COLUMNS),
                params![username.trim()],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    /// List all users
    pub fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM users ORDER BY username",
            USER_COLUMNS
        ))?;

        let users = stmt
            .query_map([], user_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(users)
    }
}
