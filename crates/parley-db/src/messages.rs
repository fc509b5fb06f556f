use chrono::{DateTime, Utc};
use parley_types::models::MessageRecord;
use parley_types::{ChatId, MessageId, UserId};
use rusqlite::{Connection, OptionalExtension, Row};

use crate::{Result, time};

pub fn insert(
    conn: &Connection,
    chat_id: ChatId,
    sender_id: UserId,
    content: &str,
    created_at: &DateTime<Utc>,
) -> Result<MessageId> {
    conn.execute(
        "INSERT INTO messages (chat_id, sender_id, content, created_at) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![chat_id, sender_id, content, time::encode(created_at)],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Replace content and timestamp. Returns rows affected.
pub fn update(
    conn: &Connection,
    id: MessageId,
    content: &str,
    created_at: &DateTime<Utc>,
) -> Result<usize> {
    let rows = conn.execute(
        "UPDATE messages SET content = ?2, created_at = ?3 WHERE id = ?1",
        rusqlite::params![id, content, time::encode(created_at)],
    )?;
    Ok(rows)
}

pub fn delete(conn: &Connection, id: MessageId) -> Result<usize> {
    let rows = conn.execute("DELETE FROM messages WHERE id = ?1", [id])?;
    Ok(rows)
}

pub fn find_by_id(conn: &Connection, id: MessageId) -> Result<Option<MessageRecord>> {
    let record = conn
        .query_row(
            "SELECT id, chat_id, sender_id, content, created_at FROM messages WHERE id = ?1",
            [id],
            message_from_row,
        )
        .optional()?;
    Ok(record)
}

/// All messages of a chat, oldest first; `id` breaks timestamp ties.
pub fn list_by_chat(conn: &Connection, chat_id: ChatId) -> Result<Vec<MessageRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, chat_id, sender_id, content, created_at
         FROM messages
         WHERE chat_id = ?1
         ORDER BY created_at ASC, id ASC",
    )?;

    let rows = stmt
        .query_map([chat_id], message_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<MessageRecord> {
    Ok(MessageRecord {
        id: row.get(0)?,
        chat_id: row.get(1)?,
        sender_id: row.get(2)?,
        content: row.get(3)?,
        created_at: time::column(row, 4)?,
    })
}
