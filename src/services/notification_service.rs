use std::sync::Arc;
use tracing::debug;

use crate::clock::Clock;
use crate::database::models::{NewNotification, Notification, NotificationCategory, UserId};
use crate::database::{ResourceStore, StoreError};

/// Activity that results in a notification for the acting user.
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationEvent {
    MoodLogged { label: String },
    DailyReminder,
    MeditationCompleted { name: String, minutes: u32 },
    FirstChat,
    WellnessTip { text: String },
    GamePlayed { name: String },
    Streak { days: i64 },
    FeatureUpdate { name: String },
}

/// Rendered title, message and category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationTemplate {
    pub title: String,
    pub message: String,
    pub category: NotificationCategory,
}

impl NotificationEvent {
    pub fn render(&self) -> NotificationTemplate {
        use NotificationCategory::*;

        let (title, message, category) = match self {
            NotificationEvent::MoodLogged { label } => (
                "Mood Logged! 📝".to_string(),
                format!(
                    "Great job logging your mood as '{}'. Keep tracking to see patterns in your wellness journey.",
                    label
                ),
                Achievement,
            ),
            NotificationEvent::DailyReminder => (
                "Daily Check-in 🌟".to_string(),
                DAILY_REMINDER_TEXT.to_string(),
                Reminder,
            ),
            NotificationEvent::MeditationCompleted { name, minutes } => (
                "Meditation Complete! 🧘".to_string(),
                format!(
                    "You completed a {}-minute session of '{}'. Great work on prioritizing your mental health!",
                    minutes, name
                ),
                Achievement,
            ),
            NotificationEvent::FirstChat => (
                "Welcome to ZenBot! 💬".to_string(),
                "Great job starting your first conversation with ZenBot. Feel free to share your thoughts anytime."
                    .to_string(),
                Tip,
            ),
            NotificationEvent::WellnessTip { text } => {
                ("Wellness Tip 💡".to_string(), text.clone(), Tip)
            }
            NotificationEvent::GamePlayed { name } => (
                "Game Completed! 🎮".to_string(),
                format!(
                    "You finished playing '{}'. These exercises can help reduce stress and improve mindfulness.",
                    name
                ),
                Achievement,
            ),
            NotificationEvent::Streak { days } => (
                format!("🔥 {}-Day Streak!", days),
                format!(
                    "Amazing! You've been using EdenMind for {} days in a row. Keep up the great work!",
                    days
                ),
                Achievement,
            ),
            NotificationEvent::FeatureUpdate { name } => (
                "New Feature! 🆕".to_string(),
                format!("Check out the new {} feature in EdenMind!", name),
                Update,
            ),
        };

        NotificationTemplate {
            title,
            message,
            category,
        }
    }
}

const DAILY_REMINDER_TEXT: &str =
    "Don't forget to log your mood today! Taking a moment to reflect can help improve your mental wellness.";

/// Welcome set offered to accounts that have no notifications yet.
pub const SAMPLE_NOTIFICATIONS: [(&str, &str, NotificationCategory); 5] = [
    (
        "Welcome to EdenMind! 🎉",
        "We're excited to have you join our wellness community. Start your journey to mental wellness today!",
        NotificationCategory::Achievement,
    ),
    ("Daily Reminder", DAILY_REMINDER_TEXT, NotificationCategory::Reminder),
    (
        "Meditation Tip 🧘",
        "Try the new meditation tracks for a peaceful mind. Just 5 minutes a day can make a difference!",
        NotificationCategory::Meditation,
    ),
    (
        "Wellness Tip 💡",
        "Taking short breaks during work can boost your productivity and reduce stress.",
        NotificationCategory::Tip,
    ),
    (
        "New Games Available! 🎮",
        "Check out the therapeutic games section for fun stress-relief exercises!",
        NotificationCategory::Update,
    ),
];

/// Appends notification records when activity happens.
#[derive(Clone)]
pub struct NotificationEmitter {
    store: Arc<dyn ResourceStore>,
    clock: Arc<dyn Clock>,
}

impl NotificationEmitter {
    pub fn new(store: Arc<dyn ResourceStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn emit(
        &self,
        user_id: UserId,
        event: &NotificationEvent,
    ) -> Result<Notification, StoreError> {
        let template = event.render();
        debug!("Notifying user {}: {}", user_id, template.title);
        self.create(user_id, template.title, template.message, template.category.as_str())
            .await
    }

    /// Store a notification with caller-supplied text.
    pub async fn create(
        &self,
        user_id: UserId,
        title: String,
        message: String,
        category: &str,
    ) -> Result<Notification, StoreError> {
        self.store
            .create_notification(NewNotification {
                user_id,
                title,
                message,
                category: category.to_string(),
                created_at: self.clock.now(),
            })
            .await
    }

    pub async fn mood_logged(&self, user_id: UserId, label: &str) -> Result<Notification, StoreError> {
        self.emit(
            user_id,
            &NotificationEvent::MoodLogged {
                label: label.to_string(),
            },
        )
        .await
    }

    pub async fn daily_reminder(&self, user_id: UserId) -> Result<Notification, StoreError> {
        self.emit(user_id, &NotificationEvent::DailyReminder).await
    }

    pub async fn meditation_completed(
        &self,
        user_id: UserId,
        name: &str,
        minutes: u32,
    ) -> Result<Notification, StoreError> {
        self.emit(
            user_id,
            &NotificationEvent::MeditationCompleted {
                name: name.to_string(),
                minutes,
            },
        )
        .await
    }

    pub async fn first_chat(&self, user_id: UserId) -> Result<Notification, StoreError> {
        self.emit(user_id, &NotificationEvent::FirstChat).await
    }

    pub async fn wellness_tip(&self, user_id: UserId, text: &str) -> Result<Notification, StoreError> {
        self.emit(
            user_id,
            &NotificationEvent::WellnessTip {
                text: text.to_string(),
            },
        )
        .await
    }

    pub async fn game_played(&self, user_id: UserId, name: &str) -> Result<Notification, StoreError> {
        self.emit(
            user_id,
            &NotificationEvent::GamePlayed {
                name: name.to_string(),
            },
        )
        .await
    }

    pub async fn streak(&self, user_id: UserId, days: i64) -> Result<Notification, StoreError> {
        self.emit(user_id, &NotificationEvent::Streak { days }).await
    }

    pub async fn feature_update(&self, user_id: UserId, name: &str) -> Result<Notification, StoreError> {
        self.emit(
            user_id,
            &NotificationEvent::FeatureUpdate {
                name: name.to_string(),
            },
        )
        .await
    }

    /// Create the welcome set unless the user already has notifications.
    /// Returns how many were created.
    pub async fn init_samples(&self, user_id: UserId) -> Result<usize, StoreError> {
        if !self.store.list_notifications(user_id).await?.is_empty() {
            return Ok(0);
        }
        for (title, message, category) in SAMPLE_NOTIFICATIONS {
            self.create(user_id, title.to_string(), message.to_string(), category.as_str())
                .await?;
        }
        Ok(SAMPLE_NOTIFICATIONS.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::database::MemoryStore;
    use chrono::{TimeZone, Utc};

    fn emitter() -> (NotificationEmitter, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 5, 5, 9, 0, 0).unwrap(),
        ));
        (NotificationEmitter::new(store.clone(), clock), store)
    }

    #[test]
    fn templates_carry_their_parameters() {
        let cases = [
            (
                NotificationEvent::MoodLogged {
                    label: "Calm".to_string(),
                },
                "Calm",
                NotificationCategory::Achievement,
            ),
            (
                NotificationEvent::MeditationCompleted {
                    name: "Body Scan".to_string(),
                    minutes: 12,
                },
                "12-minute session of 'Body Scan'",
                NotificationCategory::Achievement,
            ),
            (
                NotificationEvent::WellnessTip {
                    text: "Drink water".to_string(),
                },
                "Drink water",
                NotificationCategory::Tip,
            ),
            (
                NotificationEvent::GamePlayed {
                    name: "Breathing Bubbles".to_string(),
                },
                "Breathing Bubbles",
                NotificationCategory::Achievement,
            ),
            (
                NotificationEvent::FeatureUpdate {
                    name: "Journal".to_string(),
                },
                "new Journal feature",
                NotificationCategory::Update,
            ),
        ];

        for (event, needle, category) in cases {
            let rendered = event.render();
            assert!(rendered.message.contains(needle), "{:?}", event);
            assert_eq!(rendered.category, category);
        }

        let streak = NotificationEvent::Streak { days: 14 }.render();
        assert_eq!(streak.title, "🔥 14-Day Streak!");
        assert!(streak.message.contains("14 days in a row"));

        assert_eq!(
            NotificationEvent::DailyReminder.render().category,
            NotificationCategory::Reminder
        );
        assert_eq!(NotificationEvent::FirstChat.render().category, NotificationCategory::Tip);
    }

    #[tokio::test]
    async fn emitted_notifications_start_unread() {
        let (emitter, store) = emitter();
        let n = emitter.mood_logged(7, "Happy").await.unwrap();

        assert!(!n.read);
        assert_eq!(n.user_id, 7);
        assert_eq!(n.category, "achievement");
        assert_eq!(store.count_unread_notifications(7).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn samples_are_created_only_once() {
        let (emitter, store) = emitter();
        assert_eq!(emitter.init_samples(3).await.unwrap(), 5);
        assert_eq!(emitter.init_samples(3).await.unwrap(), 0);

        let list = store.list_notifications(3).await.unwrap();
        assert_eq!(list.len(), 5);
        assert!(list.iter().any(|n| n.category == "meditation"));
    }
}
