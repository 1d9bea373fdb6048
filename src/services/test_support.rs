//! Shared fixtures for service unit tests.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::{Chat, Listing, ListingStatus, User};
use crate::infra::{
    ChatRepository, ListingRepository, MockChatRepository, MockListingRepository,
    MockOrderRepository, MockUserRepository, OrderRepository, UnitOfWork, UserRepository,
};

/// UnitOfWork over mockall repositories.
///
/// Repositories without expectations panic if called.
#[derive(Default)]
pub struct TestUnitOfWork {
    pub users: MockUserRepository,
    pub listings: MockListingRepository,
    pub chats: MockChatRepository,
    pub orders: MockOrderRepository,
}

impl TestUnitOfWork {
    pub fn build(self) -> Arc<FrozenUnitOfWork> {
        Arc::new(FrozenUnitOfWork {
            users: Arc::new(self.users),
            listings: Arc::new(self.listings),
            chats: Arc::new(self.chats),
            orders: Arc::new(self.orders),
        })
    }
}

/// Expectations set, shareable between the service and spawned tasks
pub struct FrozenUnitOfWork {
    users: Arc<MockUserRepository>,
    listings: Arc<MockListingRepository>,
    chats: Arc<MockChatRepository>,
    orders: Arc<MockOrderRepository>,
}

impl UnitOfWork for FrozenUnitOfWork {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.users.clone()
    }

    fn listings(&self) -> Arc<dyn ListingRepository> {
        self.listings.clone()
    }

    fn chats(&self) -> Arc<dyn ChatRepository> {
        self.chats.clone()
    }

    fn orders(&self) -> Arc<dyn OrderRepository> {
        self.orders.clone()
    }
}

pub fn user(id: &str) -> User {
    let now = Utc::now();
    User {
        id: id.to_string(),
        email: format!("{}@example.com", id),
        name: format!("User {}", id),
        image: None,
        earned: 0,
        withdrawn: 0,
        created_at: now,
        updated_at: now,
    }
}

pub fn listing(owner_id: &str, status: ListingStatus) -> Listing {
    let now = Utc::now();
    Listing {
        id: Uuid::new_v4(),
        owner_id: owner_id.to_string(),
        title: "Premium Travel Instagram".to_string(),
        platform: "instagram".to_string(),
        username: "travelwithme".to_string(),
        followers_count: 120_000,
        engagement_rate: 4.2,
        monthly_views: 900_000,
        niche: "Travel".to_string(),
        price: 2_500,
        description: "Established travel account".to_string(),
        verified: true,
        monetized: false,
        country: "US".to_string(),
        age_range: "18-24".to_string(),
        images: vec![],
        status,
        featured: false,
        is_credential_submitted: true,
        created_at: now,
        updated_at: now,
    }
}

pub fn chat(listing: &Listing, buyer_id: &str) -> Chat {
    let now = Utc::now();
    Chat {
        id: Uuid::new_v4(),
        listing_id: listing.id,
        owner_user_id: listing.owner_id.clone(),
        chat_user_id: buyer_id.to_string(),
        last_message: None,
        last_message_sender_id: None,
        is_last_message_read: false,
        created_at: now,
        updated_at: now,
    }
}
