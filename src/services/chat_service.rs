//! Chat service - one thread per (listing, buyer), opened lazily.
//!
//! Read state is tracked on the chat row itself: a chat is unread until the
//! participant who did not write the last message opens it.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{ChatDetails, Message};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;

#[async_trait]
pub trait ChatService: Send + Sync {
    /// Open the chat for a listing, creating it on first contact.
    ///
    /// With `chat_id` the caller must already be a participant of that chat.
    async fn get_or_create_chat(
        &self,
        user_id: &str,
        listing_id: Uuid,
        chat_id: Option<Uuid>,
    ) -> AppResult<ChatDetails>;

    async fn user_chats(&self, user_id: &str) -> AppResult<Vec<ChatDetails>>;

    /// Store a message. The chat's last-message summary is refreshed in the
    /// background after this returns.
    async fn send_message(&self, user_id: &str, chat_id: Uuid, text: String)
        -> AppResult<Message>;
}

pub struct ChatManager<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> ChatManager<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }

    async fn details(&self, chat_id: Uuid) -> AppResult<ChatDetails> {
        self.uow
            .chats()
            .load_details(chat_id)
            .await?
            .ok_or_not_found("Chat")
    }
}

#[async_trait]
impl<U: UnitOfWork> ChatService for ChatManager<U> {
    async fn get_or_create_chat(
        &self,
        user_id: &str,
        listing_id: Uuid,
        chat_id: Option<Uuid>,
    ) -> AppResult<ChatDetails> {
        let listing = self
            .uow
            .listings()
            .find_by_id(listing_id)
            .await?
            .ok_or_not_found("Listing")?;

        let chats = self.uow.chats();
        let existing = match chat_id {
            Some(chat_id) => Some(
                chats
                    .find_for_participant(chat_id, user_id)
                    .await?
                    .ok_or_not_found("Chat")?,
            ),
            None => {
                chats
                    .find_by_pair(listing_id, user_id, &listing.owner_id)
                    .await?
            }
        };

        if let Some(chat) = existing {
            let mut details = self.details(chat.id).await?;
            if details.should_mark_read_for(user_id) {
                details.chat = chats.mark_read(chat.id).await?;
            }
            return Ok(details);
        }

        if listing.is_owned_by(user_id) {
            return Err(AppError::bad_request("You cannot chat about your own listing"));
        }

        let chat = match chats.create(listing_id, &listing.owner_id, user_id).await {
            Ok(chat) => chat,
            // Lost a race with a concurrent request for the same pair
            Err(AppError::Conflict(_)) => chats
                .find_by_pair(listing_id, user_id, &listing.owner_id)
                .await?
                .ok_or_not_found("Chat")?,
            Err(e) => return Err(e),
        };
        tracing::debug!(chat_id = %chat.id, listing_id = %listing_id, "Chat opened");

        self.details(chat.id).await
    }

    async fn user_chats(&self, user_id: &str) -> AppResult<Vec<ChatDetails>> {
        self.uow.chats().list_for_user(user_id).await
    }

    async fn send_message(
        &self,
        user_id: &str,
        chat_id: Uuid,
        text: String,
    ) -> AppResult<Message> {
        if text.trim().is_empty() {
            return Err(AppError::validation("Message cannot be empty"));
        }

        let chats = self.uow.chats();
        let chat = chats
            .find_for_participant(chat_id, user_id)
            .await?
            .ok_or_not_found("Chat")?;

        let listing = self
            .uow
            .listings()
            .find_by_id(chat.listing_id)
            .await?
            .ok_or_not_found("Listing")?;
        if !listing.is_active() {
            return Err(AppError::bad_request(format!("Listing is {}", listing.status)));
        }

        let message = chats.insert_message(chat_id, user_id, text.clone()).await?;

        let sender = user_id.to_string();
        tokio::spawn(async move {
            if let Err(e) = chats.update_last_message(chat_id, &sender, text).await {
                tracing::error!(chat_id = %chat_id, error = %e, "Failed to update last message");
            }
        });

        Ok(message)
    }
}
