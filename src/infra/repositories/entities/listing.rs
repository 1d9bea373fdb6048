//! Listing database entity for SeaORM.

use sea_orm::entity::prelude::*;

use crate::domain::{Listing, ListingStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "listings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub owner_id: String,
    pub title: String,
    pub platform: String,
    pub username: String,
    pub followers_count: i64,
    pub engagement_rate: f64,
    pub monthly_views: i64,
    pub niche: String,
    pub price: i64,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub verified: bool,
    pub monetized: bool,
    pub country: String,
    pub age_range: String,
    pub images: Vec<String>,
    /// active | inactive | sold
    pub status: String,
    pub featured: bool,
    pub is_credential_submitted: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::OwnerId",
        to = "super::user::Column::Id"
    )]
    Owner,
    #[sea_orm(has_one = "super::credential::Entity")]
    Credential,
    #[sea_orm(has_many = "super::chat::Entity")]
    Chats,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::credential::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Credential.def()
    }
}

impl Related<super::chat::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Chats.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Listing {
    fn from(model: Model) -> Self {
        Listing {
            id: model.id,
            owner_id: model.owner_id,
            title: model.title,
            platform: model.platform,
            username: model.username,
            followers_count: model.followers_count,
            engagement_rate: model.engagement_rate,
            monthly_views: model.monthly_views,
            niche: model.niche,
            price: model.price,
            description: model.description,
            verified: model.verified,
            monetized: model.monetized,
            country: model.country,
            age_range: model.age_range,
            images: model.images,
            status: ListingStatus::from(model.status.as_str()),
            featured: model.featured,
            is_credential_submitted: model.is_credential_submitted,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
