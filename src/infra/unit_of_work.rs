//! Unit of Work: a single access point for every repository.
//!
//! Services depend on `dyn UnitOfWork` and never see SeaORM directly.
//! Writes that must be atomic (purchase, withdrawal, credential submission)
//! open their own database transaction inside the repository method.

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use super::repositories::{
    ChatRepository, ChatStore, ListingRepository, ListingStore, OrderRepository, OrderStore,
    UserRepository, UserStore,
};

pub trait UnitOfWork: Send + Sync {
    fn users(&self) -> Arc<dyn UserRepository>;

    fn listings(&self) -> Arc<dyn ListingRepository>;

    fn chats(&self) -> Arc<dyn ChatRepository>;

    fn orders(&self) -> Arc<dyn OrderRepository>;
}

/// Concrete implementation of UnitOfWork over one connection pool
pub struct Persistence {
    user_repo: Arc<UserStore>,
    listing_repo: Arc<ListingStore>,
    chat_repo: Arc<ChatStore>,
    order_repo: Arc<OrderStore>,
}

impl Persistence {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            user_repo: Arc::new(UserStore::new(db.clone())),
            listing_repo: Arc::new(ListingStore::new(db.clone())),
            chat_repo: Arc::new(ChatStore::new(db.clone())),
            order_repo: Arc::new(OrderStore::new(db)),
        }
    }
}

impl UnitOfWork for Persistence {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.user_repo.clone()
    }

    fn listings(&self) -> Arc<dyn ListingRepository> {
        self.listing_repo.clone()
    }

    fn chats(&self) -> Arc<dyn ChatRepository> {
        self.chat_repo.clone()
    }

    fn orders(&self) -> Arc<dyn OrderRepository> {
        self.order_repo.clone()
    }
}
