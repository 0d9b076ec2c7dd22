// handlers/protected/emotions.rs - /api/emotions handlers

use axum::extract::{Path, Query, State};
use serde::Deserialize;
use tracing::{debug, info};

use crate::api::ApiJson;
use crate::auth;
use crate::database::models::{EmotionLog, EmotionSource, NewEmotionLog};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::services::progress;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmotionLog {
    #[serde(default)]
    pub emotion_type: String,
    pub intensity: Option<i32>,
    pub activities: Option<String>,
    pub note: Option<String>,
    #[serde(default)]
    pub source: EmotionSource,
    pub confidence: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionFilter {
    pub emotion_type: Option<String>,
}

/// Text used in the "Mood Logged" notification.
fn mood_label(emotion_type: &str, source: EmotionSource) -> String {
    match source {
        EmotionSource::FaceAnalysis => format!("Mood detected via camera: {}", emotion_type),
        EmotionSource::Manual => emotion_type.to_string(),
    }
}

/// POST /api/emotions - log a mood
///
/// Emits "Mood Logged", and a streak notification whenever the streak bucket
/// moves up to 7, 14 or 30.
pub async fn emotion_post(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    ApiJson(payload): ApiJson<CreateEmotionLog>,
) -> ApiResult<EmotionLog> {
    let emotion_type = payload.emotion_type.trim().to_string();
    if emotion_type.is_empty() {
        return Err(ApiError::bad_request("emotionType is required"));
    }

    let before = state.resources.count_emotion_logs(principal.id).await?;
    let log = state
        .resources
        .create_emotion_log(NewEmotionLog {
            user_id: principal.id,
            emotion_type: emotion_type.clone(),
            intensity: payload.intensity,
            activities: payload.activities,
            note: payload.note,
            source: payload.source,
            confidence: payload.confidence,
            recorded_at: state.clock.now(),
        })
        .await?;
    info!("User {} logged mood {}", principal.id, log.id);

    state
        .notifications
        .mood_logged(principal.id, &mood_label(&emotion_type, payload.source))
        .await?;

    let (old_streak, new_streak) = (progress::streak(before)?, progress::streak(before + 1)?);
    if new_streak > old_streak && matches!(new_streak, 7 | 14 | 30) {
        debug!("User {} reached a {}-day streak", principal.id, new_streak);
        state.notifications.streak(principal.id, new_streak).await?;
    }

    Ok(ApiResponse::ok(log))
}

/// GET /api/emotions[?emotionType=X] - newest first
pub async fn emotions_get(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Query(filter): Query<EmotionFilter>,
) -> ApiResult<Vec<EmotionLog>> {
    let logs = state
        .resources
        .list_emotion_logs(principal.id, filter.emotion_type.as_deref())
        .await?;
    Ok(ApiResponse::ok(logs))
}

/// GET /api/emotions/:id
pub async fn emotion_get(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<EmotionLog> {
    let log = auth::guard(&principal, state.resources.find_emotion_log(id).await?)?;
    Ok(ApiResponse::ok(log))
}

/// DELETE /api/emotions/:id
pub async fn emotion_delete(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    let log = auth::guard(&principal, state.resources.find_emotion_log(id).await?)?;
    state.resources.delete_emotion_log(log.id).await?;
    Ok(ApiResponse::no_content())
}
