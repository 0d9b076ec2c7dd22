// handlers/protected/chat.rs - /api/chat handlers

use axum::extract::State;
use serde::Deserialize;

use super::load_account;
use crate::api::ApiJson;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::services::ChatAnswer;
use crate::state::AppState;

// The conversation listings under /api/chat share the handlers in
// `conversations`; see `app::chat_routes`.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatQuery {
    #[serde(default)]
    pub query: String,
    pub conversation_id: Option<i64>,
}

/// POST /api/chat/query - ask the assistant, optionally inside an existing conversation
pub async fn query_post(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    ApiJson(payload): ApiJson<ChatQuery>,
) -> ApiResult<ChatAnswer> {
    let user = load_account(&state, &principal).await?;
    let answer = state
        .chat
        .query(&user, &payload.query, payload.conversation_id)
        .await?;
    Ok(ApiResponse::ok(answer))
}
