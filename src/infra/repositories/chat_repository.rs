//! Chat repository: threads, their messages and the denormalized
//! last-message fields.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    DbErr, PaginatorTrait, QueryFilter, QueryOrder, Set, SqlErr,
};
use uuid::Uuid;

use super::entities::{
    chat::{self, ActiveModel, Entity as ChatEntity},
    listing, message, user,
};
use crate::domain::{Chat, ChatDetails, Listing, Message, User, UserSummary};
use crate::errors::{AppError, AppResult, OptionExt};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ChatRepository: Send + Sync {
    /// Chat by id, only if `user_id` is one of its two participants
    async fn find_for_participant(&self, chat_id: Uuid, user_id: &str)
        -> AppResult<Option<Chat>>;

    async fn find_by_pair(
        &self,
        listing_id: Uuid,
        chat_user_id: &str,
        owner_user_id: &str,
    ) -> AppResult<Option<Chat>>;

    /// Insert a new thread.
    ///
    /// Fails with `AppError::Conflict` when the (listing, buyer) pair exists.
    async fn create(
        &self,
        listing_id: Uuid,
        owner_user_id: &str,
        chat_user_id: &str,
    ) -> AppResult<Chat>;

    /// Chat with listing, participants and messages (oldest first)
    async fn load_details(&self, chat_id: Uuid) -> AppResult<Option<ChatDetails>>;

    /// Every chat the user takes part in, most recently updated first
    async fn list_for_user(&self, user_id: &str) -> AppResult<Vec<ChatDetails>>;

    async fn mark_read(&self, chat_id: Uuid) -> AppResult<Chat>;

    async fn insert_message(
        &self,
        chat_id: Uuid,
        sender_id: &str,
        text: String,
    ) -> AppResult<Message>;

    /// Refresh the denormalized last-message fields; the chat becomes unread.
    async fn update_last_message(
        &self,
        chat_id: Uuid,
        sender_id: &str,
        text: String,
    ) -> AppResult<()>;

    async fn count_for_user(&self, user_id: &str) -> AppResult<u64>;
}

pub struct ChatStore {
    db: Arc<DatabaseConnection>,
}

/// SQLSTATE 23505, by code or by the Postgres message when the code is lost
fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
        || err
            .to_string()
            .contains("duplicate key value violates unique constraint")
}

fn participant(user_id: &str) -> Condition {
    Condition::any()
        .add(chat::Column::OwnerUserId.eq(user_id))
        .add(chat::Column::ChatUserId.eq(user_id))
}

impl ChatStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Attach listings, participants and messages to chat rows.
    ///
    /// Three batched queries regardless of how many chats are passed in.
    async fn hydrate(&self, chats: Vec<chat::Model>) -> AppResult<Vec<ChatDetails>> {
        if chats.is_empty() {
            return Ok(Vec::new());
        }

        let chat_ids: Vec<Uuid> = chats.iter().map(|c| c.id).collect();
        let listing_ids: Vec<Uuid> = chats.iter().map(|c| c.listing_id).collect();
        let user_ids: Vec<String> = chats
            .iter()
            .flat_map(|c| [c.owner_user_id.clone(), c.chat_user_id.clone()])
            .collect();

        let listings: HashMap<Uuid, Listing> = listing::Entity::find()
            .filter(listing::Column::Id.is_in(listing_ids))
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(|m| (m.id, Listing::from(m)))
            .collect();

        let users: HashMap<String, UserSummary> = user::Entity::find()
            .filter(user::Column::Id.is_in(user_ids))
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(|m| (m.id.clone(), UserSummary::from(User::from(m))))
            .collect();

        let mut messages: HashMap<Uuid, Vec<Message>> = HashMap::new();
        for model in message::Entity::find()
            .filter(message::Column::ChatId.is_in(chat_ids))
            .order_by_asc(message::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?
        {
            messages
                .entry(model.chat_id)
                .or_default()
                .push(Message::from(model));
        }

        let details = chats
            .into_iter()
            .filter_map(|model| {
                let chat = Chat::from(model);
                let (Some(listing), Some(owner_user), Some(chat_user)) = (
                    listings.get(&chat.listing_id),
                    users.get(&chat.owner_user_id),
                    users.get(&chat.chat_user_id),
                ) else {
                    tracing::warn!(chat_id = %chat.id, "Skipping chat with missing relations");
                    return None;
                };

                Some(ChatDetails {
                    listing: listing.clone(),
                    owner_user: owner_user.clone(),
                    chat_user: chat_user.clone(),
                    messages: messages.remove(&chat.id).unwrap_or_default(),
                    chat,
                })
            })
            .collect();

        Ok(details)
    }
}

#[async_trait]
impl ChatRepository for ChatStore {
    async fn find_for_participant(
        &self,
        chat_id: Uuid,
        user_id: &str,
    ) -> AppResult<Option<Chat>> {
        let result = ChatEntity::find_by_id(chat_id)
            .filter(participant(user_id))
            .one(self.db.as_ref())
            .await?;

        Ok(result.map(Chat::from))
    }

    async fn find_by_pair(
        &self,
        listing_id: Uuid,
        chat_user_id: &str,
        owner_user_id: &str,
    ) -> AppResult<Option<Chat>> {
        let result = ChatEntity::find()
            .filter(chat::Column::ListingId.eq(listing_id))
            .filter(chat::Column::ChatUserId.eq(chat_user_id))
            .filter(chat::Column::OwnerUserId.eq(owner_user_id))
            .one(self.db.as_ref())
            .await?;

        Ok(result.map(Chat::from))
    }

    async fn create(
        &self,
        listing_id: Uuid,
        owner_user_id: &str,
        chat_user_id: &str,
    ) -> AppResult<Chat> {
        let now = chrono::Utc::now();
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            listing_id: Set(listing_id),
            owner_user_id: Set(owner_user_id.to_string()),
            chat_user_id: Set(chat_user_id.to_string()),
            last_message: Set(None),
            last_message_sender_id: Set(None),
            is_last_message_read: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
        };

        match active_model.insert(self.db.as_ref()).await {
            Ok(model) => Ok(Chat::from(model)),
            Err(e) if is_unique_violation(&e) => Err(AppError::conflict("Chat")),
            Err(e) => Err(e.into()),
        }
    }

    async fn load_details(&self, chat_id: Uuid) -> AppResult<Option<ChatDetails>> {
        let Some(model) = ChatEntity::find_by_id(chat_id).one(self.db.as_ref()).await? else {
            return Ok(None);
        };

        Ok(self.hydrate(vec![model]).await?.pop())
    }

    async fn list_for_user(&self, user_id: &str) -> AppResult<Vec<ChatDetails>> {
        let models = ChatEntity::find()
            .filter(participant(user_id))
            .order_by_desc(chat::Column::UpdatedAt)
            .all(self.db.as_ref())
            .await?;

        self.hydrate(models).await
    }

    async fn mark_read(&self, chat_id: Uuid) -> AppResult<Chat> {
        let mut active: ActiveModel = ChatEntity::find_by_id(chat_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_not_found("Chat")?
            .into();
        active.is_last_message_read = Set(true);

        let model = active.update(self.db.as_ref()).await?;
        Ok(Chat::from(model))
    }

    async fn insert_message(
        &self,
        chat_id: Uuid,
        sender_id: &str,
        text: String,
    ) -> AppResult<Message> {
        let model = message::ActiveModel {
            id: Set(Uuid::new_v4()),
            chat_id: Set(chat_id),
            sender_id: Set(sender_id.to_string()),
            message: Set(text),
            created_at: Set(chrono::Utc::now()),
        }
        .insert(self.db.as_ref())
        .await?;

        Ok(Message::from(model))
    }

    async fn update_last_message(
        &self,
        chat_id: Uuid,
        sender_id: &str,
        text: String,
    ) -> AppResult<()> {
        ChatEntity::update_many()
            .col_expr(chat::Column::LastMessage, Expr::value(text))
            .col_expr(chat::Column::LastMessageSenderId, Expr::value(sender_id))
            .col_expr(chat::Column::IsLastMessageRead, Expr::value(false))
            .col_expr(chat::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
            .filter(chat::Column::Id.eq(chat_id))
            .exec(self.db.as_ref())
            .await?;

        Ok(())
    }

    async fn count_for_user(&self, user_id: &str) -> AppResult<u64> {
        let count = ChatEntity::find()
            .filter(participant(user_id))
            .count(self.db.as_ref())
            .await?;

        Ok(count)
    }
}
