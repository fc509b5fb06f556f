use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use parley_types::models::{ChatSummary, LastMessage};
use parley_types::{ChatId, UserId};
use rusqlite::Connection;

use crate::chats::chat_from_row;
use crate::{Result, time};

/// Insert the membership unless it already exists.
/// Returns `true` when a row was written.
pub fn insert_if_absent(
    conn: &Connection,
    chat_id: ChatId,
    user_id: UserId,
    joined_at: &DateTime<Utc>,
) -> Result<bool> {
    let rows = conn.execute(
        "INSERT OR IGNORE INTO memberships (chat_id, user_id, joined_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![chat_id, user_id, time::encode(joined_at)],
    )?;
    Ok(rows > 0)
}

pub fn list_user_ids(conn: &Connection, chat_id: ChatId) -> Result<BTreeSet<UserId>> {
    let mut stmt = conn.prepare("SELECT user_id FROM memberships WHERE chat_id = ?1")?;
    let ids = stmt
        .query_map([chat_id], |row| row.get(0))?
        .collect::<std::result::Result<BTreeSet<_>, _>>()?;
    Ok(ids)
}

/// Every chat `user_id` belongs to, each with its latest message, ordered by
/// `coalesce(last message time, joined_at)` descending. Chats without
/// messages are ranked by when the user joined them.
pub fn list_chat_summaries(conn: &Connection, user_id: UserId) -> Result<Vec<ChatSummary>> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.name, c.creator_id, c.is_group, c.avatar_url, c.created_at,
                m.joined_at,
                lm.id, lm.sender_id, lm.content, lm.created_at
         FROM memberships m
         JOIN chats c ON c.id = m.chat_id
         LEFT JOIN messages lm ON lm.id = (
             SELECT id FROM messages
             WHERE chat_id = c.id
             ORDER BY created_at DESC, id DESC
             LIMIT 1
         )
         WHERE m.user_id = ?1
         ORDER BY COALESCE(lm.created_at, m.joined_at) DESC, c.id DESC",
    )?;

    let rows = stmt
        .query_map([user_id], |row| {
            let last_message = match row.get::<_, Option<i64>>(7)? {
                Some(id) => Some(LastMessage {
                    id,
                    sender_id: row.get(8)?,
                    content: row.get(9)?,
                    created_at: time::column(row, 10)?,
                }),
                None => None,
            };

            Ok(ChatSummary {
                chat: chat_from_row(row)?,
                joined_at: time::column(row, 6)?,
                last_message,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}
