//! Repository for orders
//!
//! Purchases and status transitions move money, so each runs in a single
//! transaction. Locks are always taken listing first, then user rows.

use super::wallet_repository::{apply_credit, apply_debit, order_entry};
use crate::error::RepositoryError;
use crate::models::{
    ListingStatus, Order, OrderRole, OrderStatus, TransactionType, TransitionError,
};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool, Result as SqlxResult};
use tracing::info;
use uuid::Uuid;

const ORDER_COLUMNS: &str = "id, buyer_id, seller_id, listing_id, listing_title, amount, status, \
     created_at, updated_at, completed_at";

pub struct OrderRepository {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct LockedListing {
    seller_id: Uuid,
    title: String,
    price: Decimal,
    status: String,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Buy a listing with wallet funds.
    ///
    /// The buyer is debited, a pending order holds the funds and the listing
    /// is reserved. Any failure leaves all three untouched.
    pub async fn create_purchase(
        &self,
        buyer_id: Uuid,
        listing_id: Uuid,
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let listing = sqlx::query_as::<_, LockedListing>(
            "SELECT seller_id, title, price, status FROM listings WHERE id = $1 FOR UPDATE",
        )
        .bind(listing_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("Listing {} not found", listing_id)))?;

        if listing.seller_id == buyer_id {
            return Err(RepositoryError::InvalidInput(
                "You cannot buy your own listing".to_string(),
            ));
        }
        if listing.status != ListingStatus::Active.as_str() {
            return Err(RepositoryError::Conflict(
                "Listing is no longer available".to_string(),
            ));
        }

        let order = sqlx::query_as::<_, Order>(&format!(
            r#"
            INSERT INTO orders (buyer_id, seller_id, listing_id, listing_title, amount, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(buyer_id)
        .bind(listing.seller_id)
        .bind(listing_id)
        .bind(&listing.title)
        .bind(listing.price)
        .bind(OrderStatus::Pending.as_str())
        .fetch_one(&mut *tx)
        .await?;

        let description = format!("Purchase of \"{}\"", listing.title);
        apply_debit(
            &mut *tx,
            &order_entry(
                buyer_id,
                listing.price,
                TransactionType::Purchase,
                order.id,
                &description,
            ),
        )
        .await?;

        set_listing_status(&mut *tx, listing_id, ListingStatus::Reserved).await?;

        tx.commit().await?;

        info!(
            "Order {} created: buyer {} bought listing {} for {}",
            order.id, buyer_id, listing_id, order.amount
        );

        Ok(order)
    }

    /// Move a pending order to `target` on behalf of `actor`.
    ///
    /// Completing pays the seller and marks the listing sold. Cancelling
    /// refunds the buyer and puts the listing back on the market.
    pub async fn transition(
        &self,
        order_id: Uuid,
        actor: Uuid,
        target: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE"
        ))
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("Order {} not found", order_id)))?;

        let party = order.party_of(actor).ok_or_else(|| {
            RepositoryError::Forbidden("You are not a party to this order".to_string())
        })?;

        order
            .status_enum()
            .check_transition(target, party)
            .map_err(|e| match e {
                TransitionError::NotPermitted(..) => RepositoryError::Forbidden(e.to_string()),
                _ => RepositoryError::Conflict(e.to_string()),
            })?;

        if let Some(listing_id) = order.listing_id {
            sqlx::query("SELECT id FROM listings WHERE id = $1 FOR UPDATE")
                .bind(listing_id)
                .execute(&mut *tx)
                .await?;
        }

        let (payee, tx_type, listing_status, description) = match target {
            OrderStatus::Completed => (
                order.seller_id,
                TransactionType::Sale,
                ListingStatus::Sold,
                format!("Sale of \"{}\"", order.listing_title),
            ),
            _ => (
                order.buyer_id,
                TransactionType::Refund,
                ListingStatus::Active,
                format!("Refund for \"{}\"", order.listing_title),
            ),
        };

        apply_credit(
            &mut *tx,
            &order_entry(payee, order.amount, tx_type, order.id, &description),
        )
        .await?;

        if let Some(listing_id) = order.listing_id {
            set_listing_status(&mut *tx, listing_id, listing_status).await?;
        }

        let updated = sqlx::query_as::<_, Order>(&format!(
            r#"
            UPDATE orders
            SET status = $2,
                updated_at = NOW(),
                completed_at = CASE WHEN $2 = 'completed' THEN NOW() ELSE completed_at END
            WHERE id = $1
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(order_id)
        .bind(target.as_str())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            "Order {} {} by {:?} {}",
            order_id,
            target.as_str(),
            party,
            actor
        );

        Ok(updated)
    }

    /// Find an order by UUID
    pub async fn find_by_id(&self, id: Uuid) -> SqlxResult<Option<Order>> {
        sqlx::query_as::<_, Order>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Orders the user bought, sold, or both; newest first
    pub async fn list_for_user(&self, user_id: Uuid, role: OrderRole) -> SqlxResult<Vec<Order>> {
        let condition = match role {
            OrderRole::Buyer => "buyer_id = $1",
            OrderRole::Seller => "seller_id = $1",
            OrderRole::All => "(buyer_id = $1 OR seller_id = $1)",
        };

        sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE {condition} ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Pending order currently holding a listing, if any
    pub async fn find_pending_for_listing(&self, listing_id: Uuid) -> SqlxResult<Option<Order>> {
        sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE listing_id = $1 AND status = 'pending'"
        ))
        .bind(listing_id)
        .fetch_optional(&self.pool)
        .await
    }
}

async fn set_listing_status(
    conn: &mut PgConnection,
    listing_id: Uuid,
    status: ListingStatus,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "UPDATE listings SET status = $2, version = version + 1, updated_at = NOW() WHERE id = $1",
    )
    .bind(listing_id)
    .bind(status.as_str())
    .execute(&mut *conn)
    .await?;
    Ok(())
}
