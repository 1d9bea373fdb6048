//! User repository backed by the mirrored identity-provider users table.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{sea_query::OnConflict, DatabaseConnection, EntityTrait, Set};

use super::entities::user::{self, ActiveModel, Entity as UserEntity};
use crate::domain::{User, UserProfile};
use crate::errors::AppResult;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// User repository trait for dependency injection
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<User>>;

    /// Insert the profile or refresh an existing row's profile fields.
    ///
    /// Balances are never touched.
    async fn upsert(&self, profile: UserProfile) -> AppResult<User>;

    /// Hard delete. Returns whether a row was removed.
    async fn delete(&self, id: &str) -> AppResult<bool>;
}

/// Concrete implementation of UserRepository
pub struct UserStore {
    db: Arc<DatabaseConnection>,
}

impl UserStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<User>> {
        let result = UserEntity::find_by_id(id.to_string())
            .one(self.db.as_ref())
            .await?;
        Ok(result.map(User::from))
    }

    async fn upsert(&self, profile: UserProfile) -> AppResult<User> {
        let now = chrono::Utc::now();
        let active_model = ActiveModel {
            id: Set(profile.id),
            email: Set(profile.email),
            name: Set(profile.name),
            image: Set(profile.image),
            earned: Set(0),
            withdrawn: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = UserEntity::insert(active_model)
            .on_conflict(
                OnConflict::column(user::Column::Id)
                    .update_columns([
                        user::Column::Email,
                        user::Column::Name,
                        user::Column::Image,
                        user::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_with_returning(self.db.as_ref())
            .await?;

        Ok(User::from(model))
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        let result = UserEntity::delete_by_id(id.to_string())
            .exec(self.db.as_ref())
            .await?;

        Ok(result.rows_affected > 0)
    }
}
