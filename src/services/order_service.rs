//! Order service - purchases, order history and seller withdrawals.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{ListingStatus, Order, Withdrawal};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;

#[async_trait]
pub trait OrderService: Send + Sync {
    /// Buy a listing and reveal its credentials to the buyer
    async fn purchase(&self, buyer_id: &str, listing_id: Uuid) -> AppResult<Order>;

    async fn user_orders(&self, buyer_id: &str) -> AppResult<Vec<Order>>;

    async fn withdraw(&self, user_id: &str, amount: i64, account: String)
        -> AppResult<Withdrawal>;
}

pub struct OrderManager<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> OrderManager<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl<U: UnitOfWork> OrderService for OrderManager<U> {
    async fn purchase(&self, buyer_id: &str, listing_id: Uuid) -> AppResult<Order> {
        let listing = self
            .uow
            .listings()
            .find_by_id(listing_id)
            .await?
            .ok_or_not_found("Listing")?;

        if !listing.is_active() {
            return Err(AppError::bad_request(format!("Listing is {}", listing.status)));
        }
        if listing.is_owned_by(buyer_id) {
            return Err(AppError::bad_request("You cannot purchase your own listing"));
        }
        if !listing.is_credential_submitted {
            return Err(AppError::bad_request(
                "Listing credentials have not been submitted yet",
            ));
        }

        let credential = self
            .uow
            .listings()
            .find_credential(listing_id)
            .await?
            .ok_or_else(|| {
                AppError::bad_request("Listing credentials have not been submitted yet")
            })?;

        let transaction = self.uow.orders().record_purchase(buyer_id, &listing).await?;
        tracing::info!(
            listing_id = %listing_id,
            buyer_id = %buyer_id,
            amount = transaction.amount,
            "Listing purchased"
        );

        let mut listing = listing;
        listing.status = ListingStatus::Sold;

        Ok(Order {
            transaction,
            listing,
            credential: credential.fields,
        })
    }

    async fn user_orders(&self, buyer_id: &str) -> AppResult<Vec<Order>> {
        self.uow.orders().list_for_buyer(buyer_id).await
    }

    async fn withdraw(
        &self,
        user_id: &str,
        amount: i64,
        account: String,
    ) -> AppResult<Withdrawal> {
        if amount <= 0 {
            return Err(AppError::validation("Amount must be greater than zero"));
        }
        if account.trim().is_empty() {
            return Err(AppError::validation("Account details are required"));
        }

        let user = self
            .uow
            .users()
            .find_by_id(user_id)
            .await?
            .ok_or_not_found("User")?;
        if user.available_balance() < amount {
            return Err(AppError::bad_request("Insufficient balance"));
        }

        let withdrawal = self.uow.orders().withdraw(user_id, amount, account).await?;
        tracing::info!(user_id = %user_id, amount, "Withdrawal recorded");
        Ok(withdrawal)
    }
}
