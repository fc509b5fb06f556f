use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};

use parley_types::ChatId;
use parley_types::api::{DeleteMessageQuery, EditMessageQuery, SendMessageRequest, SuccessResponse};
use parley_types::models::MessageView;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::AuthUser;

/// HTTP form of the socket `send_message` command. The sender is the caller.
pub async fn send_message(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<MessageView>, ApiError> {
    let message = state
        .services
        .messages
        .send_message(req.chat_id, user.user_id, &req.content)
        .await?;
    Ok(Json(message))
}

pub async fn edit_message(
    State(state): State<AppState>,
    Query(query): Query<EditMessageQuery>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state
        .services
        .messages
        .edit_message(query.message_id, &query.new_content)
        .await?;
    Ok(Json(SuccessResponse::ok()))
}

pub async fn delete_message(
    State(state): State<AppState>,
    Query(query): Query<DeleteMessageQuery>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state.services.messages.delete_message(query.message_id).await?;
    Ok(Json(SuccessResponse::ok()))
}

pub async fn get_messages(
    State(state): State<AppState>,
    Path(chat_id): Path<ChatId>,
) -> Result<Json<Vec<MessageView>>, ApiError> {
    let messages = state.services.messages.get_messages(chat_id).await?;
    Ok(Json(messages))
}
