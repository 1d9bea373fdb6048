//! Jobs command - User sync worker and queue maintenance.
//!
//! ```bash
//! profile-marketplace jobs work    # process Clerk user events
//! profile-marketplace jobs list    # queue counts by status
//! profile-marketplace jobs clear   # drop failed jobs
//! ```

use std::sync::Arc;

use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};

use crate::cli::args::{JobsAction, JobsArgs};
use crate::config::{Config, JOB_NAME_USER_SYNC};
use crate::errors::{AppError, AppResult};
use crate::infra::Database;
use crate::services::{ServiceContainer, Services, UserSyncService};

/// Execute the jobs command
pub async fn execute(args: JobsArgs, config: Config) -> AppResult<()> {
    match args.action {
        JobsAction::Work => run_worker(&config).await,
        JobsAction::List => list_jobs(&config).await,
        JobsAction::Clear => clear_failed_jobs(&config).await,
    }
}

/// Process user sync jobs until Ctrl+C.
async fn run_worker(config: &Config) -> AppResult<()> {
    use apalis::prelude::*;

    use crate::jobs::{connect_storage, user_sync_job_handler};

    tracing::info!("Connecting to database for job worker...");

    let db = Database::connect(config).await?;
    let services = Services::from_connection(db.get_connection(), config)?;
    let user_sync: Arc<dyn UserSyncService> = services.user_sync();

    let storage = connect_storage(config).await?;

    let worker = WorkerBuilder::new(JOB_NAME_USER_SYNC)
        .data(user_sync)
        .backend(storage)
        .build_fn(user_sync_job_handler);

    tracing::info!("User sync worker started. Press Ctrl+C to stop.");

    let monitor = Monitor::new().register(worker);

    tokio::select! {
        result = monitor.run() => {
            if let Err(e) = result {
                tracing::error!("Worker error: {}", e);
                return Err(AppError::internal(format!("Worker failed: {}", e)));
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received shutdown signal, stopping worker...");
        }
    }

    tracing::info!("User sync worker stopped.");
    Ok(())
}

/// Connect and report whether apalis has created its schema yet.
async fn queue_connection(config: &Config) -> AppResult<Option<Arc<DatabaseConnection>>> {
    let db = Database::connect_without_migrations(config).await?.get_connection();

    let row = db
        .query_one(Statement::from_string(
            db.get_database_backend(),
            "SELECT EXISTS(SELECT 1 FROM information_schema.schemata WHERE schema_name = 'apalis') AS exists",
        ))
        .await?;

    let initialized = row
        .and_then(|r| r.try_get::<bool>("", "exists").ok())
        .unwrap_or(false);

    Ok(initialized.then_some(db))
}

async fn list_jobs(config: &Config) -> AppResult<()> {
    let Some(db) = queue_connection(config).await? else {
        println!("Job queue not initialized. Run 'jobs work' or 'serve' first.");
        return Ok(());
    };

    let rows = db
        .query_all(Statement::from_string(
            db.get_database_backend(),
            "SELECT status::text AS status, COUNT(*)::bigint AS count FROM apalis.jobs GROUP BY status ORDER BY status",
        ))
        .await?;

    println!("\n=== User Sync Queue ===");
    if rows.is_empty() {
        println!("(empty)");
    }
    for row in rows {
        let status: String = row.try_get("", "status")?;
        let count: i64 = row.try_get("", "count")?;
        println!("{:<10} {}", status, count);
    }
    println!("=======================\n");

    Ok(())
}

async fn clear_failed_jobs(config: &Config) -> AppResult<()> {
    let Some(db) = queue_connection(config).await? else {
        println!("Job queue not initialized. Nothing to clear.");
        return Ok(());
    };

    let result = db
        .execute(Statement::from_string(
            db.get_database_backend(),
            "DELETE FROM apalis.jobs WHERE status = 'Failed'",
        ))
        .await?;

    println!("Cleared {} failed job(s) from the queue.", result.rows_affected());
    Ok(())
}
