//! User sync job.
//!
//! The webhook endpoint only verifies and enqueues; the worker applies the
//! event to the local user table.

use std::sync::Arc;

use apalis::prelude::*;
use apalis_sql::postgres::PostgresStorage;
use apalis_sql::sqlx::postgres::PgPoolOptions;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{Config, JOB_POOL_MAX_CONNECTIONS};
use crate::domain::UserSyncEvent;
use crate::errors::{AppError, AppResult};
use crate::services::UserSyncService;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Job payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSyncJob {
    /// Webhook delivery id (`svix-id`), kept for tracing
    pub delivery_id: Option<String>,
    pub event: UserSyncEvent,
}

impl UserSyncJob {
    pub fn new(event: UserSyncEvent, delivery_id: Option<String>) -> Self {
        Self { delivery_id, event }
    }
}

/// Producer side of the user sync queue
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserSyncQueue: Send + Sync {
    async fn enqueue(&self, job: UserSyncJob) -> AppResult<()>;
}

/// Queue backed by apalis' Postgres storage
#[derive(Clone)]
pub struct PostgresUserSyncQueue {
    storage: PostgresStorage<UserSyncJob>,
}

impl PostgresUserSyncQueue {
    pub fn new(storage: PostgresStorage<UserSyncJob>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl UserSyncQueue for PostgresUserSyncQueue {
    async fn enqueue(&self, job: UserSyncJob) -> AppResult<()> {
        let user_id = job.event.user_id().to_string();
        let mut storage = self.storage.clone();

        storage
            .push(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to enqueue user sync job: {}", e)))?;

        tracing::debug!(user_id = %user_id, "User sync job enqueued");
        Ok(())
    }
}

/// Open the job pool and make sure apalis' tables exist.
pub async fn connect_storage(config: &Config) -> AppResult<PostgresStorage<UserSyncJob>> {
    let pool = PgPoolOptions::new()
        .max_connections(JOB_POOL_MAX_CONNECTIONS)
        .connect(&config.database_url)
        .await
        .map_err(|e| AppError::internal(format!("Failed to connect job storage: {}", e)))?;

    PostgresStorage::setup(&pool)
        .await
        .map_err(|e| AppError::internal(format!("Failed to setup job storage: {}", e)))?;

    Ok(PostgresStorage::new(pool))
}

/// Worker handler: apply one event
pub async fn user_sync_job_handler(
    job: UserSyncJob,
    service: Data<Arc<dyn UserSyncService>>,
) -> Result<(), AppError> {
    tracing::info!(
        user_id = %job.event.user_id(),
        delivery_id = job.delivery_id.as_deref().unwrap_or("-"),
        "Processing user sync job"
    );

    let outcome = service.apply(job.event).await?;
    tracing::info!(?outcome, "User sync job finished");
    Ok(())
}
