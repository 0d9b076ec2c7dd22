// handlers/protected/notifications.rs - /api/notifications handlers

use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::api::ApiJson;
use crate::auth;
use crate::database::models::{Notification, NotificationCategory};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::services::NotificationEvent;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub count: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateNotification {
    pub title: Option<String>,
    pub message: Option<String>,
    #[serde(rename = "type")]
    pub category: Option<String>,
}

/// Client-reported activity that should leave a notification behind.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ActivityEvent {
    DailyReminder,
    MeditationCompleted { name: String, minutes: u32 },
    WellnessTip { text: String },
    GamePlayed { name: String },
    FeatureUpdate { name: String },
}

impl From<ActivityEvent> for NotificationEvent {
    fn from(event: ActivityEvent) -> Self {
        match event {
            ActivityEvent::DailyReminder => NotificationEvent::DailyReminder,
            ActivityEvent::MeditationCompleted { name, minutes } => {
                NotificationEvent::MeditationCompleted { name, minutes }
            }
            ActivityEvent::WellnessTip { text } => NotificationEvent::WellnessTip { text },
            ActivityEvent::GamePlayed { name } => NotificationEvent::GamePlayed { name },
            ActivityEvent::FeatureUpdate { name } => NotificationEvent::FeatureUpdate { name },
        }
    }
}

/// GET /api/notifications - newest first
pub async fn notifications_get(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
) -> ApiResult<Vec<Notification>> {
    Ok(ApiResponse::ok(
        state.resources.list_notifications(principal.id).await?,
    ))
}

/// GET /api/notifications/unread-count
pub async fn unread_count_get(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
) -> ApiResult<UnreadCount> {
    let count = state
        .resources
        .count_unread_notifications(principal.id)
        .await?;
    Ok(ApiResponse::ok(UnreadCount { count }))
}

/// PUT /api/notifications/:id/read
pub async fn read_put(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Notification> {
    let notification = auth::guard(&principal, state.resources.find_notification(id).await?)?;
    let updated = state
        .resources
        .mark_notification_read(notification.id)
        .await?;
    Ok(ApiResponse::ok(updated))
}

/// PUT /api/notifications/read-all
pub async fn read_all_put(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
) -> ApiResult<Value> {
    let updated = state
        .resources
        .mark_all_notifications_read(principal.id)
        .await?;
    Ok(ApiResponse::ok(json!({
        "message": "All notifications marked as read",
        "updated": updated
    })))
}

/// DELETE /api/notifications/:id
pub async fn notification_delete(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    let notification = auth::guard(&principal, state.resources.find_notification(id).await?)?;
    state.resources.delete_notification(notification.id).await?;
    Ok(ApiResponse::no_content())
}

/// DELETE /api/notifications/clear-all
pub async fn clear_all_delete(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
) -> ApiResult<Value> {
    let removed = state.resources.clear_notifications(principal.id).await?;
    Ok(ApiResponse::ok(json!({
        "message": "All notifications cleared",
        "removed": removed
    })))
}

/// POST /api/notifications - `type` defaults to "tip"
pub async fn notification_post(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    ApiJson(payload): ApiJson<CreateNotification>,
) -> ApiResult<Notification> {
    let (Some(title), Some(message)) = (payload.title, payload.message) else {
        return Err(ApiError::bad_request("title and message are required"));
    };
    let category = payload
        .category
        .unwrap_or_else(|| NotificationCategory::Tip.as_str().to_string());

    let notification = state
        .notifications
        .create(principal.id, title, message, &category)
        .await?;
    Ok(ApiResponse::ok(notification))
}

/// POST /api/notifications/init-samples - only for users without notifications
pub async fn init_samples_post(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
) -> ApiResult<Value> {
    let created = state.notifications.init_samples(principal.id).await?;
    let message = if created == 0 {
        "User already has notifications"
    } else {
        "Sample notifications created"
    };
    Ok(ApiResponse::ok(json!({ "message": message, "created": created })))
}

/// POST /api/notifications/events
pub async fn event_post(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    ApiJson(event): ApiJson<ActivityEvent>,
) -> ApiResult<Notification> {
    let notification = state
        .notifications
        .emit(principal.id, &NotificationEvent::from(event))
        .await?;
    Ok(ApiResponse::created(notification))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activity_events_are_tagged_by_name() {
        let event: ActivityEvent = serde_json::from_value(json!({
            "event": "meditation_completed",
            "name": "Body Scan",
            "minutes": 10
        }))
        .unwrap();
        assert_eq!(
            NotificationEvent::from(event),
            NotificationEvent::MeditationCompleted {
                name: "Body Scan".to_string(),
                minutes: 10
            }
        );

        let reminder: ActivityEvent =
            serde_json::from_value(json!({ "event": "daily_reminder" })).unwrap();
        assert_eq!(reminder, ActivityEvent::DailyReminder);

        assert!(serde_json::from_value::<ActivityEvent>(json!({ "event": "streak" })).is_err());
    }
}
