pub mod conversation;
pub mod emotion_log;
pub mod message;
pub mod notification;
pub mod user;

pub use conversation::Conversation;
pub use emotion_log::{EmotionLog, EmotionSource, NewEmotionLog};
pub use message::{Message, NewMessage, SenderType};
pub use notification::{NewNotification, Notification, NotificationCategory};
pub use user::{NewUser, User, UserProfileUpdate};

use std::fmt;

pub type UserId = i64;

/// The kinds of records a single user owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    User,
    Conversation,
    Message,
    EmotionLog,
    Notification,
}

impl ResourceKind {
    /// Lower-case name used in client-facing messages.
    pub fn noun(self) -> &'static str {
        match self {
            ResourceKind::User => "user",
            ResourceKind::Conversation => "conversation",
            ResourceKind::Message => "message",
            ResourceKind::EmotionLog => "emotion log",
            ResourceKind::Notification => "notification",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::User => "User",
            ResourceKind::Conversation => "Conversation",
            ResourceKind::Message => "Message",
            ResourceKind::EmotionLog => "Emotion log",
            ResourceKind::Notification => "Notification",
        };
        f.write_str(name)
    }
}

/// Order in which a user's dependents are removed before the user row
/// itself. Each step only depends on rows removed by earlier steps.
pub const USER_DELETION_PLAN: [ResourceKind; 4] = [
    ResourceKind::Message,
    ResourceKind::Conversation,
    ResourceKind::Notification,
    ResourceKind::EmotionLog,
];

/// A record with exactly one owning user, fixed at creation.
pub trait Owned {
    const KIND: ResourceKind;

    fn owner_id(&self) -> UserId;
}

impl Owned for User {
    const KIND: ResourceKind = ResourceKind::User;

    fn owner_id(&self) -> UserId {
        self.id
    }
}

impl Owned for Conversation {
    const KIND: ResourceKind = ResourceKind::Conversation;

    fn owner_id(&self) -> UserId {
        self.user_id
    }
}

impl Owned for Message {
    const KIND: ResourceKind = ResourceKind::Message;

    fn owner_id(&self) -> UserId {
        self.owner_id
    }
}

impl Owned for EmotionLog {
    const KIND: ResourceKind = ResourceKind::EmotionLog;

    fn owner_id(&self) -> UserId {
        self.user_id
    }
}

impl Owned for Notification {
    const KIND: ResourceKind = ResourceKind::Notification;

    fn owner_id(&self) -> UserId {
        self.user_id
    }
}
