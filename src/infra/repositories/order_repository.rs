//! Order repository: purchase transactions and seller withdrawals.
//!
//! Both writes here move money, so each runs in a single database
//! transaction guarded by a conditional update.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use super::entities::{credential, listing, transaction, user, withdrawal};
use crate::config::{LISTING_STATUS_ACTIVE, LISTING_STATUS_SOLD};
use crate::domain::{Credential, Listing, Order, Transaction, Withdrawal};
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Sell `listing` to `buyer_id`.
    ///
    /// Flips the listing from active to sold, records the transaction and
    /// credits the owner. Fails with `BadRequest` if the listing stopped
    /// being active in the meantime.
    async fn record_purchase(&self, buyer_id: &str, listing: &Listing) -> AppResult<Transaction>;

    /// Buyer's orders, newest first, with listing and credentials
    async fn list_for_buyer(&self, buyer_id: &str) -> AppResult<Vec<Order>>;

    async fn count_for_user(&self, user_id: &str) -> AppResult<u64>;

    /// Debit `amount` from the available balance and record the payout.
    async fn withdraw(&self, user_id: &str, amount: i64, account: String)
        -> AppResult<Withdrawal>;
}

pub struct OrderStore {
    db: Arc<DatabaseConnection>,
}

impl OrderStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl OrderRepository for OrderStore {
    async fn record_purchase(&self, buyer_id: &str, listing: &Listing) -> AppResult<Transaction> {
        let now = chrono::Utc::now();
        let txn = self.db.begin().await?;

        let sold = listing::Entity::update_many()
            .col_expr(listing::Column::Status, Expr::value(LISTING_STATUS_SOLD))
            .col_expr(listing::Column::UpdatedAt, Expr::value(now))
            .filter(listing::Column::Id.eq(listing.id))
            .filter(listing::Column::Status.eq(LISTING_STATUS_ACTIVE))
            .exec(&txn)
            .await?;

        if sold.rows_affected == 0 {
            // Dropping the transaction rolls it back
            return Err(AppError::bad_request("Listing is no longer available"));
        }

        let model = transaction::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(buyer_id.to_string()),
            listing_id: Set(listing.id),
            amount: Set(listing.price),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        user::Entity::update_many()
            .col_expr(
                user::Column::Earned,
                Expr::col(user::Column::Earned).add(listing.price),
            )
            .col_expr(user::Column::UpdatedAt, Expr::value(now))
            .filter(user::Column::Id.eq(listing.owner_id.as_str()))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        Ok(Transaction::from(model))
    }

    async fn list_for_buyer(&self, buyer_id: &str) -> AppResult<Vec<Order>> {
        let rows = transaction::Entity::find()
            .filter(transaction::Column::UserId.eq(buyer_id))
            .find_also_related(listing::Entity)
            .order_by_desc(transaction::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?;

        let listing_ids: Vec<Uuid> = rows.iter().map(|(t, _)| t.listing_id).collect();
        let mut credentials: HashMap<Uuid, Credential> = if listing_ids.is_empty() {
            HashMap::new()
        } else {
            credential::Entity::find()
                .filter(credential::Column::ListingId.is_in(listing_ids))
                .all(self.db.as_ref())
                .await?
                .into_iter()
                .map(|m| (m.listing_id, Credential::from(m)))
                .collect()
        };

        let orders = rows
            .into_iter()
            .filter_map(|(transaction, listing)| {
                let listing = Listing::from(listing?);
                let credential = credentials
                    .remove(&listing.id)
                    .map(|c| c.fields)
                    .unwrap_or_default();

                Some(Order {
                    transaction: Transaction::from(transaction),
                    listing,
                    credential,
                })
            })
            .collect();

        Ok(orders)
    }

    async fn count_for_user(&self, user_id: &str) -> AppResult<u64> {
        let count = transaction::Entity::find()
            .filter(transaction::Column::UserId.eq(user_id))
            .count(self.db.as_ref())
            .await?;

        Ok(count)
    }

    async fn withdraw(
        &self,
        user_id: &str,
        amount: i64,
        account: String,
    ) -> AppResult<Withdrawal> {
        let now = chrono::Utc::now();
        let txn = self.db.begin().await?;

        let debited = user::Entity::update_many()
            .col_expr(
                user::Column::Withdrawn,
                Expr::col(user::Column::Withdrawn).add(amount),
            )
            .col_expr(user::Column::UpdatedAt, Expr::value(now))
            .filter(user::Column::Id.eq(user_id))
            .filter(Expr::col(user::Column::Earned).gte(Expr::col(user::Column::Withdrawn).add(amount)))
            .exec(&txn)
            .await?;

        if debited.rows_affected == 0 {
            return Err(AppError::bad_request("Insufficient balance"));
        }

        let model = withdrawal::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id.to_string()),
            amount: Set(amount),
            account: Set(account),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        Ok(Withdrawal::from(model))
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{sea_query::Value, DatabaseBackend, MockDatabase, MockExecResult, Statement};

    use super::*;
    use crate::domain::ListingStatus;
    use crate::services::test_support::listing;

    fn postgres() -> MockDatabase {
        MockDatabase::new(DatabaseBackend::Postgres)
    }

    fn rows(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    /// Statements of the single transaction run against `db`
    fn logged(db: Arc<DatabaseConnection>) -> Vec<Statement> {
        let log = Arc::into_inner(db)
            .expect("store still holds the connection")
            .into_transaction_log();
        assert_eq!(log.len(), 1, "expected a single transaction");
        log[0].statements().to_vec()
    }

    #[tokio::test]
    async fn purchase_only_sells_active_listings() {
        let item = listing("seller_1", ListingStatus::Active);
        let sale = transaction::Model {
            id: Uuid::new_v4(),
            user_id: "buyer_1".to_string(),
            listing_id: item.id,
            amount: item.price,
            created_at: chrono::Utc::now(),
        };
        let db = Arc::new(
            postgres()
                .append_exec_results([rows(1), rows(1)])
                .append_query_results([[sale]])
                .into_connection(),
        );

        let recorded = OrderStore::new(db.clone())
            .record_purchase("buyer_1", &item)
            .await
            .unwrap();
        assert_eq!(recorded.amount, item.price);

        let statements = logged(db);
        assert_eq!(statements.first().unwrap().sql, "BEGIN");
        assert_eq!(statements.last().unwrap().sql, "COMMIT");

        let sell = &statements[1];
        assert!(sell.sql.starts_with(r#"UPDATE "listings" SET "status" = $1"#));
        assert!(sell.sql.contains(r#""listings"."status" = $4"#));
        let values = &sell.values.as_ref().unwrap().0;
        assert_eq!(values[0], Value::from(LISTING_STATUS_SOLD));
        assert_eq!(values[3], Value::from(LISTING_STATUS_ACTIVE));

        let credit = &statements[3];
        assert!(credit.sql.contains(r#""earned" = "earned" + $"#));
    }

    #[tokio::test]
    async fn purchase_of_already_sold_listing_rolls_back() {
        let item = listing("seller_1", ListingStatus::Active);
        let db = Arc::new(postgres().append_exec_results([rows(0)]).into_connection());

        let result = OrderStore::new(db.clone())
            .record_purchase("buyer_1", &item)
            .await;
        assert!(matches!(
            result,
            Err(AppError::BadRequest(msg)) if msg == "Listing is no longer available"
        ));

        let statements = logged(db);
        let sql: Vec<&str> = statements.iter().map(|s| s.sql.as_str()).collect();
        assert_eq!(sql.len(), 3, "nothing runs after the guard: {:?}", sql);
        assert_eq!(sql[0], "BEGIN");
        assert!(sql[1].starts_with(r#"UPDATE "listings""#));
        assert_eq!(sql[2], "ROLLBACK");
    }

    #[tokio::test]
    async fn withdrawal_is_guarded_by_available_balance() {
        let payout = withdrawal::Model {
            id: Uuid::new_v4(),
            user_id: "seller_1".to_string(),
            amount: 400,
            account: "IBAN DE00 1234".to_string(),
            created_at: chrono::Utc::now(),
        };
        let db = Arc::new(
            postgres()
                .append_exec_results([rows(1)])
                .append_query_results([[payout]])
                .into_connection(),
        );

        let recorded = OrderStore::new(db.clone())
            .withdraw("seller_1", 400, "IBAN DE00 1234".to_string())
            .await
            .unwrap();
        assert_eq!(recorded.amount, 400);

        let statements = logged(db);
        let debit = &statements[1].sql;
        assert!(debit.starts_with(r#"UPDATE "users" SET "withdrawn" = "withdrawn" + $1"#));
        assert!(debit.contains(r#""earned" >="#));
        assert!(debit.contains(r#""withdrawn" + $4"#));
        assert_eq!(statements.last().unwrap().sql, "COMMIT");
    }

    #[tokio::test]
    async fn overdraw_is_rejected_and_rolled_back() {
        let db = Arc::new(postgres().append_exec_results([rows(0)]).into_connection());

        let result = OrderStore::new(db.clone())
            .withdraw("seller_1", 10_000, "IBAN DE00 1234".to_string())
            .await;
        assert!(matches!(
            result,
            Err(AppError::BadRequest(msg)) if msg == "Insufficient balance"
        ));

        let statements = logged(db);
        assert_eq!(statements.len(), 3);
        assert_eq!(statements[2].sql, "ROLLBACK");
    }
}
