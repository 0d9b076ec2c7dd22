//! In-process store used by tests and by `--in-memory` development runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::debug;

use super::models::{
    Conversation, EmotionLog, Message, NewEmotionLog, NewMessage, NewNotification, NewUser,
    Notification, ResourceKind, User, UserId, UserProfileUpdate, USER_DELETION_PLAN,
};
use super::store::{ResourceStore, StoreError, UserStore};

/// Rows keyed by id, plus the next id to hand out.
#[derive(Debug)]
struct Table<T> {
    rows: BTreeMap<i64, T>,
    next_id: i64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<T> Table<T> {
    fn allocate(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

#[derive(Debug, Default)]
struct Tables {
    users: Table<User>,
    conversations: Table<Conversation>,
    messages: Table<Message>,
    emotion_logs: Table<EmotionLog>,
    notifications: Table<Notification>,
}

impl Tables {
    fn remove_owned_by(&mut self, kind: ResourceKind, user_id: UserId) -> usize {
        fn retain<T>(table: &mut Table<T>, keep: impl Fn(&T) -> bool) -> usize {
            let before = table.rows.len();
            table.rows.retain(|_, row| keep(row));
            before - table.rows.len()
        }

        match kind {
            ResourceKind::Message => retain(&mut self.messages, |m| m.owner_id != user_id),
            ResourceKind::Conversation => {
                retain(&mut self.conversations, |c| c.user_id != user_id)
            }
            ResourceKind::Notification => {
                retain(&mut self.notifications, |n| n.user_id != user_id)
            }
            ResourceKind::EmotionLog => retain(&mut self.emotion_logs, |e| e.user_id != user_id),
            ResourceKind::User => retain(&mut self.users, |u| u.id != user_id),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .rows
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.tables.read().await.users.rows.get(&id).cloned())
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        Ok(self.find_by_email(email).await?.is_some())
    }

    async fn create_user(&self, new: NewUser) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .rows
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&new.email))
        {
            return Err(StoreError::Conflict(format!(
                "Email {} is already registered",
                new.email
            )));
        }

        let id = tables.users.allocate();
        let user = User {
            id,
            email: new.email,
            password_hash: new.password_hash,
            first_name: new.first_name,
            last_name: new.last_name,
            phone_number: None,
            bio: None,
            avatar_url: None,
            birthday: None,
            family_situation: None,
            work_type: None,
            work_hours: None,
            children_count: None,
            country: None,
            created_at: new.created_at,
            updated_at: new.created_at,
        };
        tables.users.rows.insert(id, user.clone());
        Ok(user)
    }

    async fn update_profile(
        &self,
        id: UserId,
        update: UserProfileUpdate,
        now: DateTime<Utc>,
    ) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;
        let user = tables
            .users
            .rows
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("User {}", id)))?;
        update.apply(user, now);
        Ok(user.clone())
    }

    async fn delete_user(&self, id: UserId) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.users.rows.contains_key(&id) {
            return Err(StoreError::NotFound(format!("User {}", id)));
        }
        for kind in USER_DELETION_PLAN {
            let removed = tables.remove_owned_by(kind, id);
            debug!("Removed {} {} row(s) for user {}", removed, kind.noun(), id);
        }
        tables.remove_owned_by(ResourceKind::User, id);
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[async_trait]
impl ResourceStore for MemoryStore {
    async fn create_conversation(
        &self,
        user_id: UserId,
        title: &str,
        now: DateTime<Utc>,
    ) -> Result<Conversation, StoreError> {
        let mut tables = self.tables.write().await;
        let id = tables.conversations.allocate();
        let conversation = Conversation {
            id,
            user_id,
            title: title.to_string(),
            created_at: now,
            updated_at: now,
        };
        tables.conversations.rows.insert(id, conversation.clone());
        Ok(conversation)
    }

    async fn find_conversation(&self, id: i64) -> Result<Option<Conversation>, StoreError> {
        Ok(self.tables.read().await.conversations.rows.get(&id).cloned())
    }

    async fn list_conversations(&self, user_id: UserId) -> Result<Vec<Conversation>, StoreError> {
        let tables = self.tables.read().await;
        let mut list: Vec<Conversation> = tables
            .conversations
            .rows
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
        Ok(list)
    }

    async fn touch_conversation(&self, id: i64, now: DateTime<Utc>) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let conversation = tables
            .conversations
            .rows
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("Conversation {}", id)))?;
        conversation.updated_at = now;
        Ok(())
    }

    async fn delete_conversation(&self, id: i64) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if tables.conversations.rows.remove(&id).is_none() {
            return Err(StoreError::NotFound(format!("Conversation {}", id)));
        }
        tables.messages.rows.retain(|_, m| m.conversation_id != id);
        Ok(())
    }

    async fn count_conversations(&self, user_id: UserId) -> Result<i64, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .conversations
            .rows
            .values()
            .filter(|c| c.user_id == user_id)
            .count() as i64)
    }

    async fn add_message(&self, new: NewMessage) -> Result<Message, StoreError> {
        let mut tables = self.tables.write().await;
        let owner_id = tables
            .conversations
            .rows
            .get(&new.conversation_id)
            .map(|c| c.user_id)
            .ok_or_else(|| StoreError::NotFound(format!("Conversation {}", new.conversation_id)))?;

        let id = tables.messages.allocate();
        let message = Message {
            id,
            conversation_id: new.conversation_id,
            owner_id,
            content: new.content,
            sender_type: new.sender.as_str().to_string(),
            sent_at: new.sent_at,
        };
        tables.messages.rows.insert(id, message.clone());
        Ok(message)
    }

    async fn list_messages(&self, conversation_id: i64) -> Result<Vec<Message>, StoreError> {
        let tables = self.tables.read().await;
        let mut list: Vec<Message> = tables
            .messages
            .rows
            .values()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| a.sent_at.cmp(&b.sent_at).then(a.id.cmp(&b.id)));
        Ok(list)
    }

    async fn count_messages(&self, user_id: UserId) -> Result<i64, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .messages
            .rows
            .values()
            .filter(|m| m.owner_id == user_id)
            .count() as i64)
    }

    async fn create_emotion_log(&self, new: NewEmotionLog) -> Result<EmotionLog, StoreError> {
        let mut tables = self.tables.write().await;
        let id = tables.emotion_logs.allocate();
        let log = EmotionLog {
            id,
            user_id: new.user_id,
            emotion_type: new.emotion_type,
            intensity: new.intensity,
            activities: new.activities,
            note: new.note,
            source: new.source.as_str().to_string(),
            confidence: new.confidence,
            recorded_at: new.recorded_at,
        };
        tables.emotion_logs.rows.insert(id, log.clone());
        Ok(log)
    }

    async fn find_emotion_log(&self, id: i64) -> Result<Option<EmotionLog>, StoreError> {
        Ok(self.tables.read().await.emotion_logs.rows.get(&id).cloned())
    }

    async fn list_emotion_logs(
        &self,
        user_id: UserId,
        emotion_type: Option<&str>,
    ) -> Result<Vec<EmotionLog>, StoreError> {
        let tables = self.tables.read().await;
        let mut list: Vec<EmotionLog> = tables
            .emotion_logs
            .rows
            .values()
            .filter(|e| e.user_id == user_id)
            .filter(|e| emotion_type.map_or(true, |t| e.emotion_type == t))
            .cloned()
            .collect();
        list.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at).then(b.id.cmp(&a.id)));
        Ok(list)
    }

    async fn delete_emotion_log(&self, id: i64) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        tables
            .emotion_logs
            .rows
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("Emotion log {}", id)))
    }

    async fn count_emotion_logs(&self, user_id: UserId) -> Result<i64, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .emotion_logs
            .rows
            .values()
            .filter(|e| e.user_id == user_id)
            .count() as i64)
    }

    async fn create_notification(&self, new: NewNotification) -> Result<Notification, StoreError> {
        let mut tables = self.tables.write().await;
        let id = tables.notifications.allocate();
        let notification = Notification {
            id,
            user_id: new.user_id,
            title: new.title,
            message: new.message,
            category: new.category,
            read: false,
            created_at: new.created_at,
        };
        tables.notifications.rows.insert(id, notification.clone());
        Ok(notification)
    }

    async fn find_notification(&self, id: i64) -> Result<Option<Notification>, StoreError> {
        Ok(self.tables.read().await.notifications.rows.get(&id).cloned())
    }

    async fn list_notifications(&self, user_id: UserId) -> Result<Vec<Notification>, StoreError> {
        let tables = self.tables.read().await;
        let mut list: Vec<Notification> = tables
            .notifications
            .rows
            .values()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(list)
    }

    async fn count_unread_notifications(&self, user_id: UserId) -> Result<i64, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .notifications
            .rows
            .values()
            .filter(|n| n.user_id == user_id && !n.read)
            .count() as i64)
    }

    async fn mark_notification_read(&self, id: i64) -> Result<Notification, StoreError> {
        let mut tables = self.tables.write().await;
        let notification = tables
            .notifications
            .rows
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("Notification {}", id)))?;
        notification.read = true;
        Ok(notification.clone())
    }

    async fn mark_all_notifications_read(&self, user_id: UserId) -> Result<u64, StoreError> {
        let mut tables = self.tables.write().await;
        let mut changed = 0;
        for n in tables.notifications.rows.values_mut() {
            if n.user_id == user_id && !n.read {
                n.read = true;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn delete_notification(&self, id: i64) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        tables
            .notifications
            .rows
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("Notification {}", id)))
    }

    async fn clear_notifications(&self, user_id: UserId) -> Result<u64, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables.remove_owned_by(ResourceKind::Notification, user_id) as u64)
    }
}
