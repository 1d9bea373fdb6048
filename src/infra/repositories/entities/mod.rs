//! SeaORM entity definitions
//!
//! These are database-specific entities separate from domain models.

pub mod chat;
pub mod credential;
pub mod listing;
pub mod message;
pub mod transaction;
pub mod user;
pub mod withdrawal;
