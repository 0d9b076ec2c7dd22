// handlers/protected/progress.rs - GET /api/progress

use axum::extract::State;

use super::load_account;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::services::progress::{self, ActivityCounters, ProgressReport};
use crate::state::AppState;

/// GET /api/progress - streak, wellness score and achievements for the caller
pub async fn progress_get(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
) -> ApiResult<ProgressReport> {
    let user = load_account(&state, &principal).await?;

    let counters = ActivityCounters {
        mood_logs: state.resources.count_emotion_logs(user.id).await?,
        conversations: state.resources.count_conversations(user.id).await?,
        messages: state.resources.count_messages(user.id).await?,
        account_age_days: progress::account_age_days(user.created_at, state.clock.now()),
    };

    Ok(ApiResponse::ok(progress::build_report(&user, counters)?))
}
