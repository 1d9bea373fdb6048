//! Listing domain entity, its lifecycle status and credentials.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::UserSummary;
use crate::config::{LISTING_STATUS_ACTIVE, LISTING_STATUS_INACTIVE, LISTING_STATUS_SOLD};

/// Listing lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Active,
    Inactive,
    Sold,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::Active => LISTING_STATUS_ACTIVE,
            ListingStatus::Inactive => LISTING_STATUS_INACTIVE,
            ListingStatus::Sold => LISTING_STATUS_SOLD,
        }
    }

    /// Owner toggle: active and inactive swap, sold is final.
    pub fn toggled(&self) -> Option<ListingStatus> {
        match self {
            ListingStatus::Active => Some(ListingStatus::Inactive),
            ListingStatus::Inactive => Some(ListingStatus::Active),
            ListingStatus::Sold => None,
        }
    }
}

impl From<&str> for ListingStatus {
    fn from(s: &str) -> Self {
        match s {
            LISTING_STATUS_ACTIVE => ListingStatus::Active,
            LISTING_STATUS_SOLD => ListingStatus::Sold,
            _ => ListingStatus::Inactive,
        }
    }
}

impl std::fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Listing domain entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Listing {
    pub id: Uuid,
    pub owner_id: String,
    #[schema(example = "Premium Travel Instagram")]
    pub title: String,
    #[schema(example = "instagram")]
    pub platform: String,
    #[schema(example = "travelwithme")]
    pub username: String,
    pub followers_count: i64,
    pub engagement_rate: f64,
    pub monthly_views: i64,
    #[schema(example = "Travel")]
    pub niche: String,
    #[schema(example = 2500)]
    pub price: i64,
    pub description: String,
    pub verified: bool,
    pub monetized: bool,
    pub country: String,
    pub age_range: String,
    pub images: Vec<String>,
    pub status: ListingStatus,
    pub featured: bool,
    pub is_credential_submitted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Listing {
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_id == user_id
    }

    pub fn is_active(&self) -> bool {
        self.status == ListingStatus::Active
    }

    pub fn is_sold(&self) -> bool {
        self.status == ListingStatus::Sold
    }
}

/// Seller-editable listing fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingDraft {
    pub title: String,
    pub platform: String,
    pub username: String,
    pub followers_count: i64,
    pub engagement_rate: f64,
    pub monthly_views: i64,
    pub niche: String,
    pub price: i64,
    pub description: String,
    pub verified: bool,
    pub monetized: bool,
    pub country: String,
    pub age_range: String,
    pub images: Vec<String>,
}

/// Listing with its owner's public profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ListingWithOwner {
    #[serde(flatten)]
    pub listing: Listing,
    pub owner: UserSummary,
}

/// One credential entry (e.g. email, password, recovery code)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CredentialField {
    #[schema(example = "Password")]
    pub name: String,
    #[serde(rename = "type")]
    #[schema(example = "password")]
    pub kind: String,
    #[schema(example = "hunter2")]
    pub value: String,
}

/// Credentials submitted by the seller for a listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub fields: Vec<CredentialField>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
