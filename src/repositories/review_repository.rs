use crate::error::RepositoryError;
use crate::models::{Order, RatingSummary, Review};
use sqlx::{PgPool, Result as SqlxResult};
use uuid::Uuid;

const REVIEW_SELECT: &str = r#"
    SELECT
        r.id,
        r.reviewer_id,
        u.username AS reviewer_username,
        r.seller_id,
        r.listing_id,
        r.order_id,
        r.rating,
        r.comment,
        r.created_at
    FROM reviews r
    JOIN users u ON u.id = r.reviewer_id
"#;

/// Repository for seller reviews
pub struct ReviewRepository {
    pool: PgPool,
}

impl ReviewRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert the buyer's review of `order`; a second review of the same order is a `Duplicate`
    pub async fn create(
        &self,
        order: &Order,
        rating: i16,
        comment: Option<&str>,
    ) -> Result<Review, RepositoryError> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO reviews (reviewer_id, seller_id, listing_id, order_id, rating, comment)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(order.buyer_id)
        .bind(order.seller_id)
        .bind(order.listing_id)
        .bind(order.id)
        .bind(rating)
        .bind(comment)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match RepositoryError::from(e) {
            RepositoryError::Duplicate(_) => {
                RepositoryError::Duplicate("This order has already been reviewed".to_string())
            }
            other => other,
        })?;

        let review = sqlx::query_as::<_, Review>(&format!("{REVIEW_SELECT} WHERE r.id = $1"))
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(review)
    }

    /// Reviews received by a seller, newest first
    pub async fn find_by_seller(&self, seller_id: Uuid) -> SqlxResult<Vec<Review>> {
        sqlx::query_as::<_, Review>(&format!(
            "{REVIEW_SELECT} WHERE r.seller_id = $1 ORDER BY r.created_at DESC, r.id DESC"
        ))
        .bind(seller_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn summary(&self, seller_id: Uuid) -> SqlxResult<RatingSummary> {
        sqlx::query_as::<_, RatingSummary>(
            r#"
            SELECT AVG(rating)::FLOAT8 AS average_rating, COUNT(*) AS review_count
            FROM reviews
            WHERE seller_id = $1
            "#,
        )
        .bind(seller_id)
        .fetch_one(&self.pool)
        .await
    }
}
