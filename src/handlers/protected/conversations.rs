// handlers/protected/conversations.rs - /api/conversations handlers

use axum::extract::{Path, State};
use serde::Deserialize;
use tracing::info;

use crate::api::ApiJson;
use crate::auth;
use crate::database::models::{Conversation, Message, NewMessage, SenderType};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateConversation {
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMessage {
    #[serde(default)]
    pub content: String,
    pub sender_type: SenderType,
}

/// GET /api/conversations - most recently updated first
pub async fn conversations_get(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
) -> ApiResult<Vec<Conversation>> {
    Ok(ApiResponse::ok(
        state.resources.list_conversations(principal.id).await?,
    ))
}

/// POST /api/conversations - the user's first conversation also sends the ZenBot welcome
pub async fn conversation_post(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    ApiJson(payload): ApiJson<CreateConversation>,
) -> ApiResult<Conversation> {
    let title = payload.title.trim();
    if title.is_empty() {
        return Err(ApiError::bad_request("title is required"));
    }

    let first = state.resources.count_conversations(principal.id).await? == 0;
    let conversation = state
        .resources
        .create_conversation(principal.id, title, state.clock.now())
        .await?;
    info!("User {} opened conversation {}", principal.id, conversation.id);

    if first {
        state.notifications.first_chat(principal.id).await?;
    }
    Ok(ApiResponse::created(conversation))
}

/// GET /api/conversations/:id
pub async fn conversation_get(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Conversation> {
    let conversation = auth::guard(&principal, state.resources.find_conversation(id).await?)?;
    Ok(ApiResponse::ok(conversation))
}

/// DELETE /api/conversations/:id - messages go with it
pub async fn conversation_delete(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    let conversation = auth::guard(&principal, state.resources.find_conversation(id).await?)?;
    state.resources.delete_conversation(conversation.id).await?;
    Ok(ApiResponse::no_content())
}

/// GET /api/conversations/:id/messages - oldest first
pub async fn messages_get(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Vec<Message>> {
    let conversation = auth::guard(&principal, state.resources.find_conversation(id).await?)?;
    Ok(ApiResponse::ok(
        state.resources.list_messages(conversation.id).await?,
    ))
}

/// POST /api/conversations/:id/messages
pub async fn message_post(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(id): Path<i64>,
    ApiJson(payload): ApiJson<CreateMessage>,
) -> ApiResult<Message> {
    let conversation = auth::guard(&principal, state.resources.find_conversation(id).await?)?;
    if payload.content.trim().is_empty() {
        return Err(ApiError::bad_request("content is required"));
    }

    let now = state.clock.now();
    let message = state
        .resources
        .add_message(NewMessage {
            conversation_id: conversation.id,
            content: payload.content,
            sender: payload.sender_type,
            sent_at: now,
        })
        .await?;
    state.resources.touch_conversation(conversation.id, now).await?;

    Ok(ApiResponse::created(message))
}
