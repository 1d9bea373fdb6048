//! Purchases (transactions) and seller withdrawals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{CredentialField, Listing};

/// Completed purchase of a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Transaction {
    pub id: Uuid,
    /// Buyer
    pub user_id: String,
    pub listing_id: Uuid,
    #[schema(example = 2500)]
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

/// A buyer's order: the transaction, what was bought and the revealed credentials
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Order {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub listing: Listing,
    pub credential: Vec<CredentialField>,
}

/// Payout request recorded against a seller's balance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Withdrawal {
    pub id: Uuid,
    pub user_id: String,
    #[schema(example = 1000)]
    pub amount: i64,
    /// Free-form payout details (bank account, PayPal address, ...)
    pub account: String,
    pub created_at: DateTime<Utc>,
}
