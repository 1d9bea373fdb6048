//! User sync service - mirrors identity-provider user lifecycle events.
//!
//! A deleted user is only removed when nothing references them. Otherwise
//! the row stays and their listings are taken off the market.

use async_trait::async_trait;
use std::sync::Arc;

use super::container::parallel;
use crate::domain::UserSyncEvent;
use crate::errors::AppResult;
use crate::infra::UnitOfWork;

/// What applying an event did to the local store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Upserted,
    Deleted,
    /// User kept; this many listings were deactivated
    Deactivated(u64),
    /// Deletion of a user that was never mirrored
    Skipped,
}

#[async_trait]
pub trait UserSyncService: Send + Sync {
    async fn apply(&self, event: UserSyncEvent) -> AppResult<SyncOutcome>;
}

pub struct UserSynchronizer<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> UserSynchronizer<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }

    async fn remove(&self, user_id: &str) -> AppResult<SyncOutcome> {
        let listings = self.uow.listings();
        let chats = self.uow.chats();
        let orders = self.uow.orders();

        let (listing_count, chat_count, transaction_count) = parallel::join3(
            listings.count_by_owner(user_id),
            chats.count_for_user(user_id),
            orders.count_for_user(user_id),
        )
        .await?;

        if listing_count == 0 && chat_count == 0 && transaction_count == 0 {
            let removed = self.uow.users().delete(user_id).await?;
            return Ok(if removed {
                SyncOutcome::Deleted
            } else {
                SyncOutcome::Skipped
            });
        }

        let deactivated = listings.deactivate_by_owner(user_id).await?;
        tracing::info!(
            user_id = %user_id,
            listings = listing_count,
            chats = chat_count,
            transactions = transaction_count,
            deactivated,
            "User still referenced, listings deactivated instead of deleting"
        );
        Ok(SyncOutcome::Deactivated(deactivated))
    }
}

#[async_trait]
impl<U: UnitOfWork> UserSyncService for UserSynchronizer<U> {
    async fn apply(&self, event: UserSyncEvent) -> AppResult<SyncOutcome> {
        match event {
            UserSyncEvent::Created(profile) | UserSyncEvent::Updated(profile) => {
                let user = self.uow.users().upsert(profile).await?;
                tracing::info!(user_id = %user.id, "User synced");
                Ok(SyncOutcome::Upserted)
            }
            UserSyncEvent::Deleted { user_id } => self.remove(&user_id).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserProfile;
    use crate::services::test_support::{user, TestUnitOfWork};
    use mockall::predicate::eq;

    fn deleted() -> UserSyncEvent {
        UserSyncEvent::Deleted {
            user_id: "user_1".to_string(),
        }
    }

    fn counts(uow: &mut TestUnitOfWork, listings: u64, chats: u64, transactions: u64) {
        uow.listings
            .expect_count_by_owner()
            .with(eq("user_1"))
            .returning(move |_| Ok(listings));
        uow.chats
            .expect_count_for_user()
            .returning(move |_| Ok(chats));
        uow.orders
            .expect_count_for_user()
            .returning(move |_| Ok(transactions));
    }

    #[tokio::test]
    async fn created_and_updated_events_upsert() {
        let mut uow = TestUnitOfWork::default();
        uow.users
            .expect_upsert()
            .times(2)
            .returning(|profile| {
                let mut synced = user(&profile.id);
                synced.email = profile.email;
                Ok(synced)
            });

        let service = UserSynchronizer::new(uow.build());
        let profile = UserProfile {
            id: "user_1".to_string(),
            email: "a@example.com".to_string(),
            name: "Ada Lovelace".to_string(),
            image: None,
        };

        assert_eq!(
            service.apply(UserSyncEvent::Created(profile.clone())).await.unwrap(),
            SyncOutcome::Upserted
        );
        assert_eq!(
            service.apply(UserSyncEvent::Updated(profile)).await.unwrap(),
            SyncOutcome::Upserted
        );
    }

    #[tokio::test]
    async fn unreferenced_user_is_hard_deleted() {
        let mut uow = TestUnitOfWork::default();
        counts(&mut uow, 0, 0, 0);
        uow.users
            .expect_delete()
            .with(eq("user_1"))
            .times(1)
            .returning(|_| Ok(true));
        uow.listings.expect_deactivate_by_owner().never();

        let service = UserSynchronizer::new(uow.build());
        assert_eq!(service.apply(deleted()).await.unwrap(), SyncOutcome::Deleted);
    }

    #[tokio::test]
    async fn referenced_user_is_never_hard_deleted() {
        for (listings, chats, transactions) in [(2, 0, 0), (0, 1, 0), (0, 0, 1)] {
            let mut uow = TestUnitOfWork::default();
            counts(&mut uow, listings, chats, transactions);
            uow.users.expect_delete().never();
            uow.listings
                .expect_deactivate_by_owner()
                .with(eq("user_1"))
                .times(1)
                .returning(move |_| Ok(listings));

            let service = UserSynchronizer::new(uow.build());
            assert_eq!(
                service.apply(deleted()).await.unwrap(),
                SyncOutcome::Deactivated(listings)
            );
        }
    }

    #[tokio::test]
    async fn deleting_unknown_user_is_skipped() {
        let mut uow = TestUnitOfWork::default();
        counts(&mut uow, 0, 0, 0);
        uow.users.expect_delete().returning(|_| Ok(false));

        let service = UserSynchronizer::new(uow.build());
        assert_eq!(service.apply(deleted()).await.unwrap(), SyncOutcome::Skipped);
    }
}
