use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ChatId, MessageId, UserId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub id: ChatId,
    pub name: String,
    pub creator_id: UserId,
    pub is_group: bool,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Preview of the most recent message in a chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastMessage {
    pub id: MessageId,
    pub sender_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// One row of a user's chat list: the chat, when the user joined it,
/// and the latest message if there is one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSummary {
    #[serde(flatten)]
    pub chat: Chat,
    pub joined_at: DateTime<Utc>,
    pub last_message: Option<LastMessage>,
}

/// A persisted message as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: MessageId,
    pub chat_id: ChatId,
    pub sender_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A message together with its sender's display name, as clients see it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageView {
    pub id: MessageId,
    pub chat_id: ChatId,
    pub sender_id: UserId,
    pub sender_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl MessageView {
    pub fn new(record: MessageRecord, sender_name: String) -> Self {
        Self {
            id: record.id,
            chat_id: record.chat_id,
            sender_id: record.sender_id,
            sender_name,
            content: record.content,
            created_at: record.created_at,
        }
    }
}
