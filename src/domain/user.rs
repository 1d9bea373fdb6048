//! User domain entity and related types.
//!
//! Users are owned by the identity provider; the local table is a mirror
//! that also carries the seller's running balance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// User domain entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Identity-provider user id (e.g. `user_2abc...`)
    pub id: String,
    pub email: String,
    pub name: String,
    pub image: Option<String>,
    /// Total credited from sales
    pub earned: i64,
    /// Total paid out
    pub withdrawn: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Balance that can still be withdrawn
    pub fn available_balance(&self) -> i64 {
        self.earned - self.withdrawn
    }

    /// Seller balance breakdown
    pub fn balance(&self) -> Balance {
        Balance {
            earned: self.earned,
            withdrawn: self.withdrawn,
            available: self.available_balance(),
        }
    }

    /// Check if the user's email is in the given admin list (lowercased)
    pub fn is_admin(&self, admin_emails: &[String]) -> bool {
        let email = self.email.to_lowercase();
        !email.is_empty() && admin_emails.iter().any(|admin| *admin == email)
    }
}

/// Profile fields mirrored from the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: String,
    pub image: Option<String>,
}

/// Public view of a user, embedded in listings and chats
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserSummary {
    #[schema(example = "user_2NNEqL2nrIRdJ194ndJqAHwEfxC")]
    pub id: String,
    #[schema(example = "Jane Doe")]
    pub name: String,
    pub image: Option<String>,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            image: user.image,
        }
    }
}

/// Seller balance breakdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Balance {
    #[schema(example = 5000)]
    pub earned: i64,
    #[schema(example = 1000)]
    pub withdrawn: i64,
    #[schema(example = 4000)]
    pub available: i64,
}
