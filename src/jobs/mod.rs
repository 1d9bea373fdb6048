//! Background jobs processed by the apalis worker (`jobs work`).

mod user_sync_job;

pub use user_sync_job::{
    connect_storage, user_sync_job_handler, PostgresUserSyncQueue, UserSyncJob, UserSyncQueue,
};

#[cfg(any(test, feature = "test-utils"))]
pub use user_sync_job::MockUserSyncQueue;
