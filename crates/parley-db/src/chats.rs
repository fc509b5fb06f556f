use chrono::{DateTime, Utc};
use parley_types::models::Chat;
use parley_types::{ChatId, UserId};
use rusqlite::{Connection, OptionalExtension, Row};

use crate::{Result, time};

pub fn insert(
    conn: &Connection,
    name: &str,
    creator_id: UserId,
    is_group: bool,
    created_at: &DateTime<Utc>,
) -> Result<ChatId> {
    conn.execute(
        "INSERT INTO chats (name, creator_id, is_group, created_at) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![name, creator_id, is_group, time::encode(created_at)],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Patch the mutable fields. `None` keeps the stored value.
/// Returns the number of rows affected (0 when the chat does not exist).
pub fn update(
    conn: &Connection,
    id: ChatId,
    name: Option<&str>,
    avatar_url: Option<&str>,
) -> Result<usize> {
    let rows = conn.execute(
        "UPDATE chats
         SET name = COALESCE(?2, name),
             avatar_url = COALESCE(?3, avatar_url)
         WHERE id = ?1",
        rusqlite::params![id, name, avatar_url],
    )?;
    Ok(rows)
}

pub fn exists(conn: &Connection, id: ChatId) -> Result<bool> {
    let found = conn
        .query_row("SELECT 1 FROM chats WHERE id = ?1", [id], |_| Ok(()))
        .optional()?;
    Ok(found.is_some())
}

pub fn find_by_id(conn: &Connection, id: ChatId) -> Result<Option<Chat>> {
    let chat = conn
        .query_row(
            "SELECT id, name, creator_id, is_group, avatar_url, created_at FROM chats WHERE id = ?1",
            [id],
            chat_from_row,
        )
        .optional()?;
    Ok(chat)
}

/// Maps columns `id, name, creator_id, is_group, avatar_url, created_at`
/// starting at index 0.
pub(crate) fn chat_from_row(row: &Row<'_>) -> rusqlite::Result<Chat> {
    Ok(Chat {
        id: row.get(0)?,
        name: row.get(1)?,
        creator_id: row.get(2)?,
        is_group: row.get(3)?,
        avatar_url: row.get(4)?,
        created_at: time::column(row, 5)?,
    })
}
