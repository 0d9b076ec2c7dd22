pub mod ask_service;
pub mod chat_service;
pub mod notification_service;
pub mod progress;

pub use ask_service::{AskError, AskService, ChatCompletionsAskService, UnconfiguredAskService};
pub use chat_service::{ChatAnswer, ChatError, ChatService};
pub use notification_service::{NotificationEmitter, NotificationEvent, SAMPLE_NOTIFICATIONS};
pub use progress::{ActivityCounters, Achievement, ProgressError, ProgressReport};
