//! Application state - Dependency injection container.
//!
//! Provides centralized access to all application services and infrastructure.

use std::sync::Arc;

use super::extractors::WebhookVerifier;
use crate::config::Config;
use crate::errors::AppResult;
use crate::infra::{Cache, Database};
use crate::jobs::UserSyncQueue;
use crate::services::{
    AuthService, ChatService, ListingService, OrderService, ServiceContainer, Services,
};

/// Application state containing all services (DI container).
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthService>,
    pub listing_service: Arc<dyn ListingService>,
    pub chat_service: Arc<dyn ChatService>,
    pub order_service: Arc<dyn OrderService>,
    /// Queue for identity-provider user events
    pub user_sync_queue: Arc<dyn UserSyncQueue>,
    /// Redis cache, absent when Redis is unreachable
    pub cache: Option<Arc<Cache>>,
    /// Database handle, used by the health check
    pub database: Option<Arc<Database>>,
    /// Svix signature verifier, absent when no webhook secret is configured
    pub webhook_verifier: Option<Arc<WebhookVerifier>>,
    /// Rate limit by forwarded client address instead of the peer
    pub trust_proxy: bool,
}

impl AppState {
    /// Create application state from a live database connection and config.
    pub fn from_config(
        database: Arc<Database>,
        cache: Option<Arc<Cache>>,
        user_sync_queue: Arc<dyn UserSyncQueue>,
        config: &Config,
    ) -> AppResult<Self> {
        let container = Services::from_connection(database.get_connection(), config)?;

        let webhook_verifier = match config.webhook_secret() {
            Some(secret) => Some(Arc::new(WebhookVerifier::new(secret)?)),
            None => {
                tracing::warn!("CLERK_WEBHOOK_SECRET not set, webhook deliveries will be rejected");
                None
            }
        };

        Ok(Self {
            auth_service: container.auth(),
            listing_service: container.listings(),
            chat_service: container.chats(),
            order_service: container.orders(),
            user_sync_queue,
            cache,
            database: Some(database),
            webhook_verifier,
            trust_proxy: config.trust_proxy,
        })
    }

    /// Create application state with manually injected services.
    ///
    /// No cache, database or webhook verifier is attached; use
    /// `with_webhook_verifier` to accept webhooks.
    pub fn new(
        auth_service: Arc<dyn AuthService>,
        listing_service: Arc<dyn ListingService>,
        chat_service: Arc<dyn ChatService>,
        order_service: Arc<dyn OrderService>,
        user_sync_queue: Arc<dyn UserSyncQueue>,
    ) -> Self {
        Self {
            auth_service,
            listing_service,
            chat_service,
            order_service,
            user_sync_queue,
            cache: None,
            database: None,
            webhook_verifier: None,
            trust_proxy: false,
        }
    }

    pub fn with_webhook_verifier(mut self, verifier: WebhookVerifier) -> Self {
        self.webhook_verifier = Some(Arc::new(verifier));
        self
    }
}
