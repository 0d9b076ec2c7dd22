use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, Transaction};
use std::time::Duration;
use tracing::{debug, info};

use super::models::{
    Conversation, EmotionLog, Message, NewEmotionLog, NewMessage, NewNotification, NewUser,
    Notification, ResourceKind, User, UserId, UserProfileUpdate, USER_DELETION_PLAN,
};
use super::store::{ResourceStore, StoreError, UserStore};
use crate::config::DatabaseConfig;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Message rows joined with their conversation's owner.
const MESSAGE_COLUMNS: &str =
    "m.id, m.conversation_id, c.user_id AS owner_id, m.content, m.sender_type, m.sent_at";

/// Postgres-backed store over a single connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Open the pool and bring the schema up to date.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| StoreError::Unavailable("DATABASE_URL is not set".to_string()))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;
        info!(
            "Created database pool (max {} connections)",
            config.max_connections
        );

        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("Database migrations applied");

        Ok(Self { pool })
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("Closed database pool");
    }

    async fn delete_owned_by(
        tx: &mut Transaction<'_, Postgres>,
        kind: ResourceKind,
        user_id: UserId,
    ) -> Result<u64, StoreError> {
        let sql = match kind {
            ResourceKind::Message => {
                "DELETE FROM messages WHERE conversation_id IN \
                 (SELECT id FROM conversations WHERE user_id = $1)"
            }
            ResourceKind::Conversation => "DELETE FROM conversations WHERE user_id = $1",
            ResourceKind::Notification => "DELETE FROM notifications WHERE user_id = $1",
            ResourceKind::EmotionLog => "DELETE FROM emotion_logs WHERE user_id = $1",
            ResourceKind::User => "DELETE FROM users WHERE id = $1",
        };
        let result = sqlx::query(sql).bind(user_id).execute(&mut **tx).await?;
        Ok(result.rows_affected())
    }
}

/// Map constraint violations onto store semantics; everything else stays a driver error.
fn classify(err: sqlx::Error, what: impl FnOnce() -> String) -> StoreError {
    let code = err
        .as_database_error()
        .and_then(|db| db.code())
        .map(|c| c.into_owned());

    match code.as_deref() {
        Some(UNIQUE_VIOLATION) => StoreError::Conflict(what()),
        Some(FOREIGN_KEY_VIOLATION) => StoreError::NotFound(what()),
        _ => match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(err.to_string())
            }
            other => StoreError::Sqlx(other),
        },
    }
}

fn require_row(rows_affected: u64, what: impl FnOnce() -> String) -> Result<(), StoreError> {
    if rows_affected == 0 {
        Err(StoreError::NotFound(what()))
    } else {
        Ok(())
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn create_user(&self, new: NewUser) -> Result<User, StoreError> {
        let email = new.email.clone();
        sqlx::query_as::<_, User>(
            "INSERT INTO users (email, password_hash, first_name, last_name, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $5) RETURNING *",
        )
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(new.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, || format!("Email {} is already registered", email)))
    }

    async fn update_profile(
        &self,
        id: UserId,
        update: UserProfileUpdate,
        now: DateTime<Utc>,
    ) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET \
               first_name = COALESCE($2, first_name), \
               last_name = COALESCE($3, last_name), \
               phone_number = COALESCE($4, phone_number), \
               bio = COALESCE($5, bio), \
               avatar_url = COALESCE($6, avatar_url), \
               birthday = COALESCE($7, birthday), \
               family_situation = COALESCE($8, family_situation), \
               work_type = COALESCE($9, work_type), \
               work_hours = COALESCE($10, work_hours), \
               children_count = COALESCE($11, children_count), \
               country = COALESCE($12, country), \
               updated_at = $13 \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(update.first_name)
        .bind(update.last_name)
        .bind(update.phone_number)
        .bind(update.bio)
        .bind(update.avatar_url)
        .bind(update.birthday)
        .bind(update.family_situation)
        .bind(update.work_type)
        .bind(update.work_hours)
        .bind(update.children_count)
        .bind(update.country)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        user.ok_or_else(|| StoreError::NotFound(format!("User {}", id)))
    }

    async fn delete_user(&self, id: UserId) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        for kind in USER_DELETION_PLAN {
            let removed = Self::delete_owned_by(&mut tx, kind, id).await?;
            debug!("Removed {} {} row(s) for user {}", removed, kind.noun(), id);
        }
        let removed = Self::delete_owned_by(&mut tx, ResourceKind::User, id).await?;
        // Dropping the transaction rolls back the dependents as well.
        require_row(removed, || format!("User {}", id))?;

        tx.commit().await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl ResourceStore for PgStore {
    async fn create_conversation(
        &self,
        user_id: UserId,
        title: &str,
        now: DateTime<Utc>,
    ) -> Result<Conversation, StoreError> {
        sqlx::query_as::<_, Conversation>(
            "INSERT INTO conversations (user_id, title, created_at, updated_at) \
             VALUES ($1, $2, $3, $3) RETURNING *",
        )
        .bind(user_id)
        .bind(title)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, || format!("User {}", user_id)))
    }

    async fn find_conversation(&self, id: i64) -> Result<Option<Conversation>, StoreError> {
        let row = sqlx::query_as::<_, Conversation>("SELECT * FROM conversations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_conversations(&self, user_id: UserId) -> Result<Vec<Conversation>, StoreError> {
        let rows = sqlx::query_as::<_, Conversation>(
            "SELECT * FROM conversations WHERE user_id = $1 ORDER BY updated_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn touch_conversation(&self, id: i64, now: DateTime<Utc>) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE conversations SET updated_at = $2 WHERE id = $1")
            .bind(id)
            .bind(now)
            .execute(&self.pool)
            .await?;
        require_row(result.rows_affected(), || format!("Conversation {}", id))
    }

    async fn delete_conversation(&self, id: i64) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM messages WHERE conversation_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM conversations WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        require_row(result.rows_affected(), || format!("Conversation {}", id))?;
        tx.commit().await?;
        Ok(())
    }

    async fn count_conversations(&self, user_id: UserId) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM conversations WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn add_message(&self, new: NewMessage) -> Result<Message, StoreError> {
        let sql = format!(
            "WITH m AS ( \
               INSERT INTO messages (conversation_id, content, sender_type, sent_at) \
               VALUES ($1, $2, $3, $4) RETURNING * \
             ) \
             SELECT {} FROM m JOIN conversations c ON c.id = m.conversation_id",
            MESSAGE_COLUMNS
        );
        let conversation_id = new.conversation_id;
        sqlx::query_as::<_, Message>(&sql)
            .bind(new.conversation_id)
            .bind(&new.content)
            .bind(new.sender.as_str())
            .bind(new.sent_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| classify(e, || format!("Conversation {}", conversation_id)))
    }

    async fn list_messages(&self, conversation_id: i64) -> Result<Vec<Message>, StoreError> {
        let sql = format!(
            "SELECT {} FROM messages m JOIN conversations c ON c.id = m.conversation_id \
             WHERE m.conversation_id = $1 ORDER BY m.sent_at ASC, m.id ASC",
            MESSAGE_COLUMNS
        );
        let rows = sqlx::query_as::<_, Message>(&sql)
            .bind(conversation_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn count_messages(&self, user_id: UserId) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM messages m JOIN conversations c ON c.id = m.conversation_id \
             WHERE c.user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn create_emotion_log(&self, new: NewEmotionLog) -> Result<EmotionLog, StoreError> {
        let user_id = new.user_id;
        sqlx::query_as::<_, EmotionLog>(
            "INSERT INTO emotion_logs \
               (user_id, emotion_type, intensity, activities, note, source, confidence, recorded_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(new.user_id)
        .bind(&new.emotion_type)
        .bind(new.intensity)
        .bind(&new.activities)
        .bind(&new.note)
        .bind(new.source.as_str())
        .bind(new.confidence)
        .bind(new.recorded_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, || format!("User {}", user_id)))
    }

    async fn find_emotion_log(&self, id: i64) -> Result<Option<EmotionLog>, StoreError> {
        let row = sqlx::query_as::<_, EmotionLog>("SELECT * FROM emotion_logs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_emotion_logs(
        &self,
        user_id: UserId,
        emotion_type: Option<&str>,
    ) -> Result<Vec<EmotionLog>, StoreError> {
        let rows = sqlx::query_as::<_, EmotionLog>(
            "SELECT * FROM emotion_logs \
             WHERE user_id = $1 AND ($2::TEXT IS NULL OR emotion_type = $2) \
             ORDER BY recorded_at DESC, id DESC",
        )
        .bind(user_id)
        .bind(emotion_type)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn delete_emotion_log(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM emotion_logs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        require_row(result.rows_affected(), || format!("Emotion log {}", id))
    }

    async fn count_emotion_logs(&self, user_id: UserId) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM emotion_logs WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn create_notification(&self, new: NewNotification) -> Result<Notification, StoreError> {
        let user_id = new.user_id;
        sqlx::query_as::<_, Notification>(
            "INSERT INTO notifications (user_id, title, message, category, is_read, created_at) \
             VALUES ($1, $2, $3, $4, FALSE, $5) RETURNING *",
        )
        .bind(new.user_id)
        .bind(&new.title)
        .bind(&new.message)
        .bind(&new.category)
        .bind(new.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, || format!("User {}", user_id)))
    }

    async fn find_notification(&self, id: i64) -> Result<Option<Notification>, StoreError> {
        let row = sqlx::query_as::<_, Notification>("SELECT * FROM notifications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_notifications(&self, user_id: UserId) -> Result<Vec<Notification>, StoreError> {
        let rows = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn count_unread_notifications(&self, user_id: UserId) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND NOT is_read",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn mark_notification_read(&self, id: i64) -> Result<Notification, StoreError> {
        let row = sqlx::query_as::<_, Notification>(
            "UPDATE notifications SET is_read = TRUE WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.ok_or_else(|| StoreError::NotFound(format!("Notification {}", id)))
    }

    async fn mark_all_notifications_read(&self, user_id: UserId) -> Result<u64, StoreError> {
        let result =
            sqlx::query("UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND NOT is_read")
                .bind(user_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }

    async fn delete_notification(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        require_row(result.rows_affected(), || format!("Notification {}", id))
    }

    async fn clear_notifications(&self, user_id: UserId) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM notifications WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
