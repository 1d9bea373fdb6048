//! Service Container - Centralized service access with parallel execution support.
//!
//! Wires every service to a single `Persistence` unit of work so the HTTP
//! server and the job worker share one construction path.

use std::future::Future;
use std::sync::Arc;

use super::{
    AuthService, Authenticator, ChatManager, ChatService, ListingManager, ListingService,
    OrderManager, OrderService, UserSyncService, UserSynchronizer,
};
use crate::config::Config;
use crate::errors::AppResult;
use crate::infra::Persistence;

/// Service container trait for dependency injection.
pub trait ServiceContainer: Send + Sync {
    fn auth(&self) -> Arc<dyn AuthService>;

    fn listings(&self) -> Arc<dyn ListingService>;

    fn chats(&self) -> Arc<dyn ChatService>;

    fn orders(&self) -> Arc<dyn OrderService>;

    fn user_sync(&self) -> Arc<dyn UserSyncService>;
}

/// Concrete implementation of ServiceContainer
pub struct Services {
    auth_service: Arc<dyn AuthService>,
    listing_service: Arc<dyn ListingService>,
    chat_service: Arc<dyn ChatService>,
    order_service: Arc<dyn OrderService>,
    user_sync_service: Arc<dyn UserSyncService>,
}

impl Services {
    /// Build every service over one database connection pool.
    ///
    /// Fails when no session token key is configured.
    pub fn from_connection(
        db: Arc<sea_orm::DatabaseConnection>,
        config: &Config,
    ) -> AppResult<Self> {
        let uow = Arc::new(Persistence::new(db));

        Ok(Self {
            auth_service: Arc::new(Authenticator::new(config)?),
            listing_service: Arc::new(ListingManager::new(
                uow.clone(),
                config.admin_emails.clone(),
            )),
            chat_service: Arc::new(ChatManager::new(uow.clone())),
            order_service: Arc::new(OrderManager::new(uow.clone())),
            user_sync_service: Arc::new(UserSynchronizer::new(uow)),
        })
    }
}

impl ServiceContainer for Services {
    fn auth(&self) -> Arc<dyn AuthService> {
        self.auth_service.clone()
    }

    fn listings(&self) -> Arc<dyn ListingService> {
        self.listing_service.clone()
    }

    fn chats(&self) -> Arc<dyn ChatService> {
        self.chat_service.clone()
    }

    fn orders(&self) -> Arc<dyn OrderService> {
        self.order_service.clone()
    }

    fn user_sync(&self) -> Arc<dyn UserSyncService> {
        self.user_sync_service.clone()
    }
}

/// Run independent repository reads concurrently.
pub mod parallel {
    use super::*;
    use tokio::try_join;

    /// Execute two independent async operations in parallel.
    ///
    /// If either operation fails, the error is returned immediately.
    pub async fn join2<F1, F2, T1, T2>(f1: F1, f2: F2) -> AppResult<(T1, T2)>
    where
        F1: Future<Output = AppResult<T1>>,
        F2: Future<Output = AppResult<T2>>,
    {
        try_join!(f1, f2)
    }

    /// Execute three independent async operations in parallel.
    pub async fn join3<F1, F2, F3, T1, T2, T3>(
        f1: F1,
        f2: F2,
        f3: F3,
    ) -> AppResult<(T1, T2, T3)>
    where
        F1: Future<Output = AppResult<T1>>,
        F2: Future<Output = AppResult<T2>>,
        F3: Future<Output = AppResult<T3>>,
    {
        try_join!(f1, f2, f3)
    }
}
