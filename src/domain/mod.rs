//! Domain layer - Core business entities and logic
//!
//! This module contains the core domain models that represent
//! marketplace concepts independent of infrastructure concerns.

pub mod chat;
pub mod identity;
pub mod listing;
pub mod order;
pub mod user;

pub use chat::{Chat, ChatDetails, Message};
pub use identity::{UserSyncEvent, WebhookEnvelope};
pub use listing::{
    Credential, CredentialField, Listing, ListingDraft, ListingStatus, ListingWithOwner,
};
pub use order::{Order, Transaction, Withdrawal};
pub use user::{Balance, User, UserProfile, UserSummary};
