use axum::{Extension, Json, extract::State};

use parley_types::api::{CreateChatRequest, CreateChatResponse, SuccessResponse, UpdateChatRequest};
use parley_types::models::ChatSummary;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::AuthUser;

/// The caller becomes the creator and a member of the new chat.
pub async fn create_chat(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateChatRequest>,
) -> Result<Json<CreateChatResponse>, ApiError> {
    let chat_id = state
        .services
        .chats
        .create_chat(&req.name, user.user_id, req.is_group, &req.participant_ids)
        .await?;
    Ok(Json(CreateChatResponse { chat_id }))
}

pub async fn update_chat(
    State(state): State<AppState>,
    Json(req): Json<UpdateChatRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state
        .services
        .chats
        .update_chat(req.chat_id, req.name, req.avatar_url)
        .await?;
    Ok(Json(SuccessResponse::ok()))
}

pub async fn list_chats(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<ChatSummary>>, ApiError> {
    let chats = state.services.chats.list_chats(user.user_id).await?;
    Ok(Json(chats))
}
