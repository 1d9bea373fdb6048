//! Withdrawal entity for SeaORM.

use sea_orm::entity::prelude::*;

use crate::domain::Withdrawal;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "withdrawals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub user_id: String,
    pub amount: i64,
    pub account: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Withdrawal {
    fn from(model: Model) -> Self {
        Withdrawal {
            id: model.id,
            user_id: model.user_id,
            amount: model.amount,
            account: model.account,
            created_at: model.created_at,
        }
    }
}
