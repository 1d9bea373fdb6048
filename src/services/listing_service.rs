//! Listing service - seller-side listing management.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use super::container::parallel;
use crate::domain::{Balance, CredentialField, Listing, ListingDraft, ListingWithOwner};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;
use crate::types::{Paginated, PaginationParams};

/// A seller's listings together with their balance
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserListings {
    pub listings: Vec<Listing>,
    pub balance: Balance,
}

#[async_trait]
pub trait ListingService: Send + Sync {
    async fn create_listing(&self, owner_id: &str, draft: ListingDraft) -> AppResult<Listing>;

    async fn update_listing(
        &self,
        owner_id: &str,
        listing_id: Uuid,
        draft: ListingDraft,
    ) -> AppResult<Listing>;

    async fn public_listings(
        &self,
        params: PaginationParams,
    ) -> AppResult<Paginated<ListingWithOwner>>;

    async fn user_listings(&self, owner_id: &str) -> AppResult<UserListings>;

    /// Swap active and inactive
    async fn toggle_status(&self, owner_id: &str, listing_id: Uuid) -> AppResult<Listing>;

    async fn delete_listing(&self, owner_id: &str, listing_id: Uuid) -> AppResult<()>;

    async fn add_credential(
        &self,
        owner_id: &str,
        listing_id: Uuid,
        fields: Vec<CredentialField>,
    ) -> AppResult<()>;

    /// Admin only. `featured: None` flips the current flag.
    async fn mark_featured(
        &self,
        user_id: &str,
        listing_id: Uuid,
        featured: Option<bool>,
    ) -> AppResult<Listing>;
}

pub struct ListingManager<U: UnitOfWork> {
    uow: Arc<U>,
    admin_emails: Vec<String>,
}

impl<U: UnitOfWork> ListingManager<U> {
    pub fn new(uow: Arc<U>, admin_emails: Vec<String>) -> Self {
        Self { uow, admin_emails }
    }

    /// Listing owned by `owner_id`; someone else's listing reads as missing.
    async fn owned_listing(&self, owner_id: &str, listing_id: Uuid) -> AppResult<Listing> {
        self.uow
            .listings()
            .find_by_id(listing_id)
            .await?
            .filter(|listing| listing.is_owned_by(owner_id))
            .ok_or_not_found("Listing")
    }

    async fn unsold_listing(&self, owner_id: &str, listing_id: Uuid) -> AppResult<Listing> {
        let listing = self.owned_listing(owner_id, listing_id).await?;
        if listing.is_sold() {
            return Err(AppError::bad_request("Listing is sold"));
        }
        Ok(listing)
    }
}

#[async_trait]
impl<U: UnitOfWork> ListingService for ListingManager<U> {
    async fn create_listing(&self, owner_id: &str, draft: ListingDraft) -> AppResult<Listing> {
        self.uow
            .users()
            .find_by_id(owner_id)
            .await?
            .ok_or_not_found("User")?;

        let listing = self.uow.listings().create(owner_id, draft).await?;
        tracing::info!(listing_id = %listing.id, owner_id = %owner_id, "Listing created");
        Ok(listing)
    }

    async fn update_listing(
        &self,
        owner_id: &str,
        listing_id: Uuid,
        draft: ListingDraft,
    ) -> AppResult<Listing> {
        self.unsold_listing(owner_id, listing_id).await?;
        self.uow.listings().update(listing_id, draft).await
    }

    async fn public_listings(
        &self,
        params: PaginationParams,
    ) -> AppResult<Paginated<ListingWithOwner>> {
        let params = params.normalized();
        let (listings, total) = self
            .uow
            .listings()
            .list_public(params.page_index(), params.limit())
            .await?;

        Ok(Paginated::new(listings, params.page, params.per_page, total))
    }

    async fn user_listings(&self, owner_id: &str) -> AppResult<UserListings> {
        let users = self.uow.users();
        let listing_repo = self.uow.listings();
        let (user, listings) = parallel::join2(
            users.find_by_id(owner_id),
            listing_repo.list_by_owner(owner_id),
        )
        .await?;

        Ok(UserListings {
            listings,
            balance: user.ok_or_not_found("User")?.balance(),
        })
    }

    async fn toggle_status(&self, owner_id: &str, listing_id: Uuid) -> AppResult<Listing> {
        let listing = self.owned_listing(owner_id, listing_id).await?;
        let next = listing
            .status
            .toggled()
            .ok_or_else(|| AppError::bad_request(format!("Listing is {}", listing.status)))?;

        self.uow.listings().set_status(listing_id, next).await
    }

    async fn delete_listing(&self, owner_id: &str, listing_id: Uuid) -> AppResult<()> {
        self.unsold_listing(owner_id, listing_id).await?;
        self.uow.listings().delete(listing_id).await?;
        tracing::info!(listing_id = %listing_id, "Listing deleted");
        Ok(())
    }

    async fn add_credential(
        &self,
        owner_id: &str,
        listing_id: Uuid,
        fields: Vec<CredentialField>,
    ) -> AppResult<()> {
        if fields.is_empty() {
            return Err(AppError::validation("At least one credential field is required"));
        }
        if fields
            .iter()
            .any(|f| f.name.trim().is_empty() || f.value.trim().is_empty())
        {
            return Err(AppError::validation("Credential fields need a name and a value"));
        }

        self.unsold_listing(owner_id, listing_id).await?;
        self.uow.listings().save_credential(listing_id, fields).await?;
        Ok(())
    }

    async fn mark_featured(
        &self,
        user_id: &str,
        listing_id: Uuid,
        featured: Option<bool>,
    ) -> AppResult<Listing> {
        let user = self
            .uow
            .users()
            .find_by_id(user_id)
            .await?
            .ok_or_not_found("User")?;
        if !user.is_admin(&self.admin_emails) {
            return Err(AppError::Forbidden);
        }

        let listing = self
            .uow
            .listings()
            .find_by_id(listing_id)
            .await?
            .ok_or_not_found("Listing")?;

        let featured = featured.unwrap_or(!listing.featured);
        self.uow.listings().set_featured(listing_id, featured).await
    }
}
