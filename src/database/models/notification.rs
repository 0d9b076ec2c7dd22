use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::UserId;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    pub user_id: UserId,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub category: String,
    #[serde(rename = "isRead")]
    #[sqlx(rename = "is_read")]
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationCategory {
    Achievement,
    Reminder,
    Meditation,
    Tip,
    Update,
}

impl NotificationCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationCategory::Achievement => "achievement",
            NotificationCategory::Reminder => "reminder",
            NotificationCategory::Meditation => "meditation",
            NotificationCategory::Tip => "tip",
            NotificationCategory::Update => "update",
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: UserId,
    pub title: String,
    pub message: String,
    /// Free-form so client-created notifications may use their own labels.
    pub category: String,
    pub created_at: DateTime<Utc>,
}
