use serde::{Deserialize, Serialize};

use crate::{ChatId, MessageId, UserId};

// -- JWT Claims --

/// JWT claims shared by the HTTP middleware and the gateway upgrade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: UserId,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user_id: UserId,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    pub user_id: UserId,
}

// -- Chats --

#[derive(Debug, Deserialize)]
pub struct CreateChatRequest {
    pub name: String,
    #[serde(default)]
    pub is_group: bool,
    #[serde(default)]
    pub participant_ids: Vec<UserId>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateChatResponse {
    pub chat_id: ChatId,
}

/// Patch request: omitted or null fields keep their stored value.
#[derive(Debug, Deserialize)]
pub struct UpdateChatRequest {
    pub chat_id: ChatId,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

// -- Messages --

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub chat_id: ChatId,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct EditMessageQuery {
    pub message_id: MessageId,
    pub new_content: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteMessageQuery {
    pub message_id: MessageId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}
