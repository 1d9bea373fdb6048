//! Listing repository: listings, their owners and submitted credentials.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{
    sea_query::{Expr, OnConflict},
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use super::entities::{
    credential,
    listing::{self, ActiveModel, Entity as ListingEntity},
    user,
};
use crate::config::{LISTING_STATUS_ACTIVE, LISTING_STATUS_INACTIVE};
use crate::domain::{
    Credential, CredentialField, Listing, ListingDraft, ListingStatus, ListingWithOwner,
    UserSummary,
};
use crate::errors::{AppError, AppResult, OptionExt};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ListingRepository: Send + Sync {
    /// Insert a new active listing
    async fn create(&self, owner_id: &str, draft: ListingDraft) -> AppResult<Listing>;

    /// Overwrite the editable fields of a listing
    async fn update(&self, id: Uuid, draft: ListingDraft) -> AppResult<Listing>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Listing>>;

    /// Active listings with their owners, featured first then newest.
    ///
    /// `page` is zero-based. Returns the page and the total item count.
    async fn list_public(&self, page: u64, per_page: u64)
        -> AppResult<(Vec<ListingWithOwner>, u64)>;

    /// All listings of an owner, newest first
    async fn list_by_owner(&self, owner_id: &str) -> AppResult<Vec<Listing>>;

    async fn set_status(&self, id: Uuid, status: ListingStatus) -> AppResult<Listing>;

    async fn set_featured(&self, id: Uuid, featured: bool) -> AppResult<Listing>;

    /// Delete a listing. Its credential, chats and messages go with it.
    async fn delete(&self, id: Uuid) -> AppResult<()>;

    /// Mark every listing of an owner inactive, sold ones included. Returns rows changed.
    async fn deactivate_by_owner(&self, owner_id: &str) -> AppResult<u64>;

    async fn count_by_owner(&self, owner_id: &str) -> AppResult<u64>;

    /// Replace the listing's credential and flag it as submitted
    async fn save_credential(
        &self,
        listing_id: Uuid,
        fields: Vec<CredentialField>,
    ) -> AppResult<Credential>;

    async fn find_credential(&self, listing_id: Uuid) -> AppResult<Option<Credential>>;
}

pub struct ListingStore {
    db: Arc<DatabaseConnection>,
}

impl ListingStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn find_model(&self, id: Uuid) -> AppResult<listing::Model> {
        ListingEntity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_not_found("Listing")
    }
}

fn apply_draft(active: &mut ActiveModel, draft: ListingDraft) {
    active.title = Set(draft.title);
    active.platform = Set(draft.platform);
    active.username = Set(draft.username);
    active.followers_count = Set(draft.followers_count);
    active.engagement_rate = Set(draft.engagement_rate);
    active.monthly_views = Set(draft.monthly_views);
    active.niche = Set(draft.niche);
    active.price = Set(draft.price);
    active.description = Set(draft.description);
    active.verified = Set(draft.verified);
    active.monetized = Set(draft.monetized);
    active.country = Set(draft.country);
    active.age_range = Set(draft.age_range);
    active.images = Set(draft.images);
}

#[async_trait]
impl ListingRepository for ListingStore {
    async fn create(&self, owner_id: &str, draft: ListingDraft) -> AppResult<Listing> {
        let now = chrono::Utc::now();
        let mut active = ActiveModel {
            id: Set(Uuid::new_v4()),
            owner_id: Set(owner_id.to_string()),
            status: Set(LISTING_STATUS_ACTIVE.to_string()),
            featured: Set(false),
            is_credential_submitted: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        apply_draft(&mut active, draft);

        let model = active.insert(self.db.as_ref()).await?;
        Ok(Listing::from(model))
    }

    async fn update(&self, id: Uuid, draft: ListingDraft) -> AppResult<Listing> {
        let mut active: ActiveModel = self.find_model(id).await?.into();
        apply_draft(&mut active, draft);
        active.updated_at = Set(chrono::Utc::now());

        let model = active.update(self.db.as_ref()).await?;
        Ok(Listing::from(model))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Listing>> {
        let result = ListingEntity::find_by_id(id).one(self.db.as_ref()).await?;
        Ok(result.map(Listing::from))
    }

    async fn list_public(
        &self,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<ListingWithOwner>, u64)> {
        let paginator = ListingEntity::find()
            .filter(listing::Column::Status.eq(LISTING_STATUS_ACTIVE))
            .find_also_related(user::Entity)
            .order_by_desc(listing::Column::Featured)
            .order_by_desc(listing::Column::CreatedAt)
            .paginate(self.db.as_ref(), per_page);

        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page).await?;

        let listings = rows
            .into_iter()
            .filter_map(|(listing, owner)| {
                let owner = owner?;
                Some(ListingWithOwner {
                    owner: UserSummary::from(crate::domain::User::from(owner)),
                    listing: Listing::from(listing),
                })
            })
            .collect();

        Ok((listings, total))
    }

    async fn list_by_owner(&self, owner_id: &str) -> AppResult<Vec<Listing>> {
        let models = ListingEntity::find()
            .filter(listing::Column::OwnerId.eq(owner_id))
            .order_by_desc(listing::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?;

        Ok(models.into_iter().map(Listing::from).collect())
    }

    async fn set_status(&self, id: Uuid, status: ListingStatus) -> AppResult<Listing> {
        let mut active: ActiveModel = self.find_model(id).await?.into();
        active.status = Set(status.as_str().to_string());
        active.updated_at = Set(chrono::Utc::now());

        let model = active.update(self.db.as_ref()).await?;
        Ok(Listing::from(model))
    }

    async fn set_featured(&self, id: Uuid, featured: bool) -> AppResult<Listing> {
        let mut active: ActiveModel = self.find_model(id).await?.into();
        active.featured = Set(featured);
        active.updated_at = Set(chrono::Utc::now());

        let model = active.update(self.db.as_ref()).await?;
        Ok(Listing::from(model))
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = ListingEntity::delete_by_id(id).exec(self.db.as_ref()).await?;

        if result.rows_affected == 0 {
            return Err(AppError::not_found("Listing"));
        }

        Ok(())
    }

    async fn deactivate_by_owner(&self, owner_id: &str) -> AppResult<u64> {
        let result = ListingEntity::update_many()
            .col_expr(listing::Column::Status, Expr::value(LISTING_STATUS_INACTIVE))
            .col_expr(listing::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
            .filter(listing::Column::OwnerId.eq(owner_id))
            .exec(self.db.as_ref())
            .await?;

        Ok(result.rows_affected)
    }

    async fn count_by_owner(&self, owner_id: &str) -> AppResult<u64> {
        let count = ListingEntity::find()
            .filter(listing::Column::OwnerId.eq(owner_id))
            .count(self.db.as_ref())
            .await?;

        Ok(count)
    }

    async fn save_credential(
        &self,
        listing_id: Uuid,
        fields: Vec<CredentialField>,
    ) -> AppResult<Credential> {
        let fields = serde_json::to_value(&fields)
            .map_err(|e| AppError::internal(format!("Failed to encode credential: {}", e)))?;
        let now = chrono::Utc::now();

        let txn = self.db.begin().await?;

        let credential = credential::Entity::insert(credential::ActiveModel {
            id: Set(Uuid::new_v4()),
            listing_id: Set(listing_id),
            fields: Set(fields),
            created_at: Set(now),
            updated_at: Set(now),
        })
        .on_conflict(
            OnConflict::column(credential::Column::ListingId)
                .update_columns([credential::Column::Fields, credential::Column::UpdatedAt])
                .to_owned(),
        )
        .exec_with_returning(&txn)
        .await?;

        ListingEntity::update_many()
            .col_expr(listing::Column::IsCredentialSubmitted, Expr::value(true))
            .col_expr(listing::Column::UpdatedAt, Expr::value(now))
            .filter(listing::Column::Id.eq(listing_id))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        Ok(Credential::from(credential))
    }

    async fn find_credential(&self, listing_id: Uuid) -> AppResult<Option<Credential>> {
        let result = credential::Entity::find()
            .filter(credential::Column::ListingId.eq(listing_id))
            .one(self.db.as_ref())
            .await?;

        Ok(result.map(Credential::from))
    }
}
