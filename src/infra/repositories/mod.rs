//! Repository layer - Data access abstraction
//!
//! Repositories provide an abstraction over data persistence,
//! following the Repository pattern for clean separation of concerns.

mod chat_repository;
pub(crate) mod entities;
mod listing_repository;
mod order_repository;
mod user_repository;

pub use chat_repository::{ChatRepository, ChatStore};
pub use listing_repository::{ListingRepository, ListingStore};
pub use order_repository::{OrderRepository, OrderStore};
pub use user_repository::{UserRepository, UserStore};

// Export mocks for tests (both unit and integration)
#[cfg(any(test, feature = "test-utils"))]
pub use chat_repository::MockChatRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use listing_repository::MockListingRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use order_repository::MockOrderRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use user_repository::MockUserRepository;
