use std::sync::Arc;

use crate::auth::{TokenCodec, TokenError};
use crate::clock::Clock;
use crate::config::AppConfig;
use crate::database::{ResourceStore, Store, UserStore};
use crate::middleware::AuthenticationGate;
use crate::services::{AskService, ChatService, NotificationEmitter};

/// Shared handles for every request. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub codec: TokenCodec,
    pub clock: Arc<dyn Clock>,
    pub users: Arc<dyn UserStore>,
    pub resources: Arc<dyn ResourceStore>,
    pub notifications: NotificationEmitter,
    pub chat: ChatService,
    pub gate: AuthenticationGate,
}

impl AppState {
    pub fn new<S>(
        config: AppConfig,
        store: Arc<S>,
        clock: Arc<dyn Clock>,
        ask: Arc<dyn AskService>,
    ) -> Result<Self, TokenError>
    where
        S: Store + 'static,
    {
        let codec = TokenCodec::from_config(&config.security)?;
        let users: Arc<dyn UserStore> = store.clone();
        let resources: Arc<dyn ResourceStore> = store;

        let notifications = NotificationEmitter::new(resources.clone(), clock.clone());
        let chat = ChatService::new(resources.clone(), ask, notifications.clone(), clock.clone());
        let gate = AuthenticationGate::new(codec.clone(), users.clone(), clock.clone());

        Ok(Self {
            config: Arc::new(config),
            codec,
            clock,
            users,
            resources,
            notifications,
            chat,
            gate,
        })
    }
}
