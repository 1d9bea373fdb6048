//! Chat threads between a listing's owner and one prospective buyer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{Listing, UserSummary};

/// Chat thread, one per (listing, buyer) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Chat {
    pub id: Uuid,
    pub listing_id: Uuid,
    /// Seller (listing owner at the time the chat was opened)
    pub owner_user_id: String,
    /// Buyer who opened the chat
    pub chat_user_id: String,
    pub last_message: Option<String>,
    pub last_message_sender_id: Option<String>,
    pub is_last_message_read: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Chat {
    pub fn is_participant(&self, user_id: &str) -> bool {
        self.owner_user_id == user_id || self.chat_user_id == user_id
    }
}

/// A single chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Message {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub sender_id: String,
    #[schema(example = "Hi, is this still available?")]
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Chat with its listing, both participants and its messages (oldest first)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChatDetails {
    #[serde(flatten)]
    pub chat: Chat,
    pub listing: Listing,
    pub owner_user: UserSummary,
    pub chat_user: UserSummary,
    pub messages: Vec<Message>,
}

impl ChatDetails {
    /// Sender of the most recent message, if any
    pub fn last_sender(&self) -> Option<&str> {
        self.messages
            .last()
            .map(|m| m.sender_id.as_str())
            .or(self.chat.last_message_sender_id.as_deref())
    }

    /// An unread chat becomes read when the other party wrote last.
    pub fn should_mark_read_for(&self, user_id: &str) -> bool {
        !self.chat.is_last_message_read
            && self.last_sender().is_some_and(|sender| sender != user_id)
    }
}
