//! Chat database entity for SeaORM.

use sea_orm::entity::prelude::*;

use crate::domain::Chat;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "chats")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub listing_id: Uuid,
    #[sea_orm(indexed)]
    pub owner_user_id: String,
    #[sea_orm(indexed)]
    pub chat_user_id: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub last_message: Option<String>,
    pub last_message_sender_id: Option<String>,
    pub is_last_message_read: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::listing::Entity",
        from = "Column::ListingId",
        to = "super::listing::Column::Id",
        on_delete = "Cascade"
    )]
    Listing,
    #[sea_orm(has_many = "super::message::Entity")]
    Messages,
}

impl Related<super::listing::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Listing.def()
    }
}

impl Related<super::message::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Messages.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Chat {
    fn from(model: Model) -> Self {
        Chat {
            id: model.id,
            listing_id: model.listing_id,
            owner_user_id: model.owner_user_id,
            chat_user_id: model.chat_user_id,
            last_message: model.last_message,
            last_message_sender_id: model.last_message_sender_id,
            is_last_message_read: model.is_last_message_read,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
