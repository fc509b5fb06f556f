use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{ChatSummary, MessageView};
use crate::{ChatId, MessageId, UserId};

/// Events pushed FROM server TO client over the live socket.
///
/// Serialized as `{"type": "<name>", ...fields}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Session registered; sent once right after the upgrade
    Ready { user_id: UserId },

    /// The recipient's own chat list, most recently active first
    ChatsUpdate { chats: Vec<ChatSummary> },

    ChatJoined { chat_id: ChatId },

    ChatLeft { chat_id: ChatId },

    /// A new message was posted in one of the recipient's chats
    Message { message: MessageView },

    MessageEdit {
        id: MessageId,
        chat_id: ChatId,
        sender_id: UserId,
        content: String,
        created_at: DateTime<Utc>,
    },

    MessageDelete {
        id: MessageId,
        chat_id: ChatId,
        sender_id: UserId,
    },

    /// A command from this session was rejected
    Error { message: String },
}

impl ServerEvent {
    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ready { .. } => "ready",
            Self::ChatsUpdate { .. } => "chats_update",
            Self::ChatJoined { .. } => "chat_joined",
            Self::ChatLeft { .. } => "chat_left",
            Self::Message { .. } => "message",
            Self::MessageEdit { .. } => "message_edit",
            Self::MessageDelete { .. } => "message_delete",
            Self::Error { .. } => "error",
        }
    }
}

/// Commands sent FROM client TO server over the live socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Ask for a fresh `chats_update`
    RequestUpdate,

    JoinChat { chat_id: ChatId },

    LeaveChat { chat_id: ChatId },

    /// Post a message; the sender is the session's user
    SendMessage { chat_id: ChatId, content: String },

    /// Any type this server does not know about
    #[serde(other)]
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_decode_from_flat_json() {
        let cmd: ClientCommand = serde_json::from_str(r#"{"type":"join_chat","chat_id":7}"#).unwrap();
        assert_eq!(cmd, ClientCommand::JoinChat { chat_id: 7 });

        let cmd: ClientCommand = serde_json::from_str(r#"{"type":"request_update"}"#).unwrap();
        assert_eq!(cmd, ClientCommand::RequestUpdate);

        let cmd: ClientCommand =
            serde_json::from_str(r#"{"type":"send_message","chat_id":2,"content":"hi"}"#).unwrap();
        assert_eq!(
            cmd,
            ClientCommand::SendMessage {
                chat_id: 2,
                content: "hi".into()
            }
        );
    }

    #[test]
    fn unknown_command_type_is_not_an_error() {
        let cmd: ClientCommand =
            serde_json::from_str(r#"{"type":"typing","chat_id":2}"#).unwrap();
        assert_eq!(cmd, ClientCommand::Unknown);
    }

    #[test]
    fn malformed_command_fails_to_decode() {
        assert!(serde_json::from_str::<ClientCommand>(r#"{"type":"join_chat"}"#).is_err());
        assert!(serde_json::from_str::<ClientCommand>("not json").is_err());
    }

    #[test]
    fn delete_event_carries_normative_fields() {
        let event = ServerEvent::MessageDelete {
            id: 10,
            chat_id: 3,
            sender_id: 1,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "message_delete", "id": 10, "chat_id": 3, "sender_id": 1})
        );
    }
}
