//! Application services layer - Use cases and business logic.
//!
//! Services orchestrate domain logic and infrastructure to fulfill
//! application use cases. They depend on abstractions (traits) and reach
//! repositories only through the Unit of Work.

mod auth_service;
mod chat_service;
pub mod container;
mod listing_service;
mod order_service;
mod user_sync_service;

#[cfg(test)]
pub(crate) mod test_support;

pub use container::{parallel, ServiceContainer, Services};

pub use auth_service::{AuthService, Authenticator, Claims};
pub use chat_service::{ChatManager, ChatService};
pub use listing_service::{ListingManager, ListingService, UserListings};
pub use order_service::{OrderManager, OrderService};
pub use user_sync_service::{SyncOutcome, UserSyncService, UserSynchronizer};
