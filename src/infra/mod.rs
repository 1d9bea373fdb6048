//! Infrastructure layer - External systems integration
//!
//! - Database connection, migrations and repositories (Postgres via SeaORM)
//! - Redis cache and rate-limit counters
//! - Unit of Work aggregating the repositories

pub mod cache;
pub mod db;
pub mod repositories;
pub mod unit_of_work;

pub use cache::Cache;
pub use db::{Database, Migrator};
pub use repositories::{
    ChatRepository, ChatStore, ListingRepository, ListingStore, OrderRepository, OrderStore,
    UserRepository, UserStore,
};
pub use unit_of_work::{Persistence, UnitOfWork};

#[cfg(any(test, feature = "test-utils"))]
pub use repositories::{
    MockChatRepository, MockListingRepository, MockOrderRepository, MockUserRepository,
};
