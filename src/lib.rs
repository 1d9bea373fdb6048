//! Profile Marketplace API
//!
//! Backend for a marketplace of social media accounts: sellers publish
//! listings and submit login credentials, buyers negotiate over a
//! per-listing chat and purchase, and users are mirrored from Clerk through
//! signed webhooks processed by a background worker.
//!
//! # Architecture Layers
//!
//! - **cli** / **commands**: `serve`, `migrate`, `jobs`
//! - **config**: environment configuration and constants
//! - **domain**: marketplace entities
//! - **services**: use cases behind traits
//! - **infra**: Postgres (SeaORM), Redis, Unit of Work
//! - **jobs**: apalis user sync worker
//! - **api**: axum routes, handlers, middleware, OpenAPI
//! - **types** / **errors**: shared response types and error handling

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod infra;
pub mod jobs;
pub mod services;
pub mod types;

// Re-export commonly used types at crate root
pub use api::AppState;
pub use config::Config;
pub use errors::{AppError, AppResult};
