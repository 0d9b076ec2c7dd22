use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use super::ask_service::{AskError, AskService};
use super::notification_service::NotificationEmitter;
use crate::auth::{self, AccessDenied, Principal};
use crate::clock::Clock;
use crate::database::models::{EmotionLog, NewMessage, SenderType, User};
use crate::database::{ResourceStore, StoreError};

const TITLE_CHARS: usize = 30;
const CONTEXT_MOOD_LOGS: usize = 5;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Query cannot be empty")]
    EmptyQuery,

    #[error(transparent)]
    Access(#[from] AccessDenied),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Ask(#[from] AskError),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatAnswer {
    pub answer: String,
    pub conversation_id: i64,
}

/// Title for a conversation opened by its first query.
pub fn conversation_title(query: &str) -> String {
    if query.chars().count() > TITLE_CHARS {
        let head: String = query.chars().take(TITLE_CHARS).collect();
        format!("{}...", head)
    } else {
        query.to_string()
    }
}

/// Profile and recent moods, rendered for the assistant. `recent` is newest first.
pub fn user_context(user: &User, recent: &[EmotionLog]) -> String {
    let mut out = String::from("User Profile:\n");
    out.push_str(&format!("Name: {} {}\n", user.first_name, user.last_name));
    if let Some(bio) = &user.bio {
        out.push_str(&format!("Bio: {}\n", bio));
    }
    if let Some(family) = &user.family_situation {
        out.push_str(&format!("Family: {}\n", family));
    }
    if let Some(work) = &user.work_type {
        out.push_str(&format!("Work: {}\n", work));
    }

    if !recent.is_empty() {
        out.push_str("\nRecent Mood Logs:\n");
        for log in recent.iter().take(CONTEXT_MOOD_LOGS) {
            out.push_str(&format!("- {}: {}", log.recorded_at.date_naive(), log.emotion_type));
            if let Some(note) = log.note.as_deref().filter(|n| !n.is_empty()) {
                out.push_str(&format!(" (Note: {})", note));
            }
            out.push('\n');
        }
    }
    out
}

/// Answers chat queries and keeps the conversation transcript.
#[derive(Clone)]
pub struct ChatService {
    store: Arc<dyn ResourceStore>,
    ask: Arc<dyn AskService>,
    notifications: NotificationEmitter,
    clock: Arc<dyn Clock>,
}

impl ChatService {
    pub fn new(
        store: Arc<dyn ResourceStore>,
        ask: Arc<dyn AskService>,
        notifications: NotificationEmitter,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            ask,
            notifications,
            clock,
        }
    }

    pub async fn query(
        &self,
        user: &User,
        query: &str,
        conversation_id: Option<i64>,
    ) -> Result<ChatAnswer, ChatError> {
        if query.trim().is_empty() {
            return Err(ChatError::EmptyQuery);
        }
        let principal = Principal::from(user);

        let conversation = match conversation_id {
            Some(id) => {
                let found = self.store.find_conversation(id).await?;
                auth::guard(&principal, found)?
            }
            None => {
                let first = self.store.count_conversations(user.id).await? == 0;
                let conversation = self
                    .store
                    .create_conversation(user.id, &conversation_title(query), self.clock.now())
                    .await?;
                info!("User {} opened conversation {}", user.id, conversation.id);
                if first {
                    self.notifications.first_chat(user.id).await?;
                }
                conversation
            }
        };

        self.store
            .add_message(NewMessage {
                conversation_id: conversation.id,
                content: query.to_string(),
                sender: SenderType::User,
                sent_at: self.clock.now(),
            })
            .await?;

        let recent = self.store.list_emotion_logs(user.id, None).await?;
        let context = user_context(user, &recent);
        let answer = self.ask.ask(query, &context).await?;

        let now = self.clock.now();
        self.store
            .add_message(NewMessage {
                conversation_id: conversation.id,
                content: answer.clone(),
                sender: SenderType::Bot,
                sent_at: now,
            })
            .await?;
        self.store.touch_conversation(conversation.id, now).await?;

        Ok(ChatAnswer {
            answer,
            conversation_id: conversation.id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::database::models::{EmotionSource, NewEmotionLog, NewUser};
    use crate::database::{MemoryStore, UserStore};
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone, Utc};
    use std::sync::Mutex;

    /// Records what it was asked and answers with a fixed string.
    #[derive(Default)]
    struct Echo {
        contexts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl AskService for Echo {
        async fn ask(&self, query: &str, user_context: &str) -> Result<String, AskError> {
            self.contexts.lock().unwrap().push(user_context.to_string());
            Ok(format!("echo: {}", query))
        }
    }

    async fn fixture() -> (ChatService, Arc<MemoryStore>, Arc<Echo>, User) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 7, 1, 10, 0, 0).unwrap(),
        ));
        let echo = Arc::new(Echo::default());
        let user = store
            .create_user(NewUser {
                email: "ada@example.com".to_string(),
                password_hash: "x".to_string(),
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                created_at: clock.now(),
            })
            .await
            .unwrap();
        let notifications = NotificationEmitter::new(store.clone(), clock.clone());
        let service = ChatService::new(store.clone(), echo.clone(), notifications, clock);
        (service, store, echo, user)
    }

    #[test]
    fn long_queries_are_truncated_for_the_title() {
        assert_eq!(conversation_title("short"), "short");
        let long = "I have been feeling anxious about work lately";
        assert_eq!(conversation_title(long), "I have been feeling anxious ab...");
    }

    #[tokio::test]
    async fn first_query_opens_conversation_and_records_both_sides() {
        let (service, store, _, user) = fixture().await;

        let answer = service.query(&user, "How do I relax?", None).await.unwrap();
        assert_eq!(answer.answer, "echo: How do I relax?");

        let messages = store.list_messages(answer.conversation_id).await.unwrap();
        let senders: Vec<&str> = messages.iter().map(|m| m.sender_type.as_str()).collect();
        assert_eq!(senders, ["USER", "BOT"]);

        let notes = store.list_notifications(user.id).await.unwrap();
        assert_eq!(notes.len(), 1);
        assert!(notes[0].title.contains("ZenBot"));

        // follow-up reuses the conversation and does not notify again
        let again = service
            .query(&user, "Thanks", Some(answer.conversation_id))
            .await
            .unwrap();
        assert_eq!(again.conversation_id, answer.conversation_id);
        assert_eq!(store.list_messages(answer.conversation_id).await.unwrap().len(), 4);
        assert_eq!(store.list_notifications(user.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn context_includes_profile_and_last_five_moods() {
        let (service, store, echo, user) = fixture().await;
        let start = Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap();
        for day in 0..7 {
            store
                .create_emotion_log(NewEmotionLog {
                    user_id: user.id,
                    emotion_type: format!("MOOD{}", day),
                    intensity: None,
                    activities: None,
                    note: (day == 6).then(|| "long walk".to_string()),
                    source: EmotionSource::Manual,
                    confidence: None,
                    recorded_at: start + Duration::days(day),
                })
                .await
                .unwrap();
        }

        service.query(&user, "hi", None).await.unwrap();
        let context = echo.contexts.lock().unwrap()[0].clone();

        assert!(context.starts_with("User Profile:\nName: Ada Lovelace\n"));
        assert!(context.contains("- 2025-06-07: MOOD6 (Note: long walk)\n"));
        assert!(context.contains("MOOD2"));
        assert!(!context.contains("MOOD1"));
    }

    #[tokio::test]
    async fn empty_and_foreign_queries_are_refused() {
        let (service, store, _, user) = fixture().await;
        assert!(matches!(
            service.query(&user, "   ", None).await,
            Err(ChatError::EmptyQuery)
        ));
        assert!(matches!(
            service.query(&user, "hi", Some(404)).await,
            Err(ChatError::Access(AccessDenied::NotFound(_)))
        ));

        let foreign = store
            .create_conversation(user.id + 100, "not yours", Utc::now())
            .await
            .unwrap();
        assert!(matches!(
            service.query(&user, "hi", Some(foreign.id)).await,
            Err(ChatError::Access(AccessDenied::Forbidden(_)))
        ));
    }
}
