//! Listing credential entity for SeaORM.

use sea_orm::entity::prelude::*;

use crate::domain::{Credential, CredentialField};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "credentials")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub listing_id: Uuid,
    /// JSON array of `{name, type, value}`
    #[sea_orm(column_type = "JsonBinary")]
    pub fields: Json,
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
}

impl Related<super::listing::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Listing.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn parsed_fields(&self) -> Vec<CredentialField> {
        serde_json::from_value(self.fields.clone()).unwrap_or_else(|e| {
            tracing::warn!(credential_id = %self.id, error = %e, "Malformed credential fields");
            Vec::new()
        })
    }
}

impl From<Model> for Credential {
    fn from(model: Model) -> Self {
        Credential {
            fields: model.parsed_fields(),
            id: model.id,
            listing_id: model.listing_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
