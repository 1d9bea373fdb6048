//! HTTP request handlers.

pub mod chat_handler;
pub mod listing_handler;
pub mod webhook_handler;

pub use chat_handler::chat_routes;
pub use listing_handler::{listing_routes, public_listing_routes};
pub use webhook_handler::webhook_routes;
