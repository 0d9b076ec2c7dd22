use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use super::models::{
    Conversation, EmotionLog, Message, NewEmotionLog, NewMessage, NewNotification, NewUser,
    Notification, User, UserId, UserProfileUpdate,
};

/// Errors from either store implementation
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database unavailable: {0}")]
    Unavailable(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Persistence of accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;

    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError>;

    /// Fails with `Conflict` when the email is already registered.
    async fn create_user(&self, new: NewUser) -> Result<User, StoreError>;

    async fn update_profile(
        &self,
        id: UserId,
        update: UserProfileUpdate,
        now: DateTime<Utc>,
    ) -> Result<User, StoreError>;

    /// Removes the user and everything they own, following
    /// [`USER_DELETION_PLAN`](super::models::USER_DELETION_PLAN), atomically.
    async fn delete_user(&self, id: UserId) -> Result<(), StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

/// Persistence of user-owned records.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    // Conversations
    async fn create_conversation(
        &self,
        user_id: UserId,
        title: &str,
        now: DateTime<Utc>,
    ) -> Result<Conversation, StoreError>;

    async fn find_conversation(&self, id: i64) -> Result<Option<Conversation>, StoreError>;

    /// Most recently updated first.
    async fn list_conversations(&self, user_id: UserId) -> Result<Vec<Conversation>, StoreError>;

    async fn touch_conversation(&self, id: i64, now: DateTime<Utc>) -> Result<(), StoreError>;

    /// Also removes the conversation's messages.
    async fn delete_conversation(&self, id: i64) -> Result<(), StoreError>;

    async fn count_conversations(&self, user_id: UserId) -> Result<i64, StoreError>;

    // Messages
    async fn add_message(&self, new: NewMessage) -> Result<Message, StoreError>;

    /// Oldest first.
    async fn list_messages(&self, conversation_id: i64) -> Result<Vec<Message>, StoreError>;

    async fn count_messages(&self, user_id: UserId) -> Result<i64, StoreError>;

    // Emotion logs
    async fn create_emotion_log(&self, new: NewEmotionLog) -> Result<EmotionLog, StoreError>;

    async fn find_emotion_log(&self, id: i64) -> Result<Option<EmotionLog>, StoreError>;

    /// Newest first, optionally restricted to one emotion type.
    async fn list_emotion_logs(
        &self,
        user_id: UserId,
        emotion_type: Option<&str>,
    ) -> Result<Vec<EmotionLog>, StoreError>;

    async fn delete_emotion_log(&self, id: i64) -> Result<(), StoreError>;

    async fn count_emotion_logs(&self, user_id: UserId) -> Result<i64, StoreError>;

    // Notifications
    async fn create_notification(&self, new: NewNotification) -> Result<Notification, StoreError>;

    async fn find_notification(&self, id: i64) -> Result<Option<Notification>, StoreError>;

    /// Newest first.
    async fn list_notifications(&self, user_id: UserId) -> Result<Vec<Notification>, StoreError>;

    async fn count_unread_notifications(&self, user_id: UserId) -> Result<i64, StoreError>;

    async fn mark_notification_read(&self, id: i64) -> Result<Notification, StoreError>;

    /// Returns how many notifications changed.
    async fn mark_all_notifications_read(&self, user_id: UserId) -> Result<u64, StoreError>;

    async fn delete_notification(&self, id: i64) -> Result<(), StoreError>;

    /// Returns how many notifications were removed.
    async fn clear_notifications(&self, user_id: UserId) -> Result<u64, StoreError>;
}

/// Both halves of the persistence seam, as one object.
pub trait Store: UserStore + ResourceStore {}

impl<T: UserStore + ResourceStore> Store for T {}
