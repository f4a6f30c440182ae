use super::listing_repository::LISTING_SELECT;
use crate::models::Listing;
use sqlx::{PgPool, Result as SqlxResult};
use uuid::Uuid;

/// Repository for favorites (user bookmarks of listings)
pub struct FavoriteRepository {
    pool: PgPool,
}

impl FavoriteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Bookmark a listing. Returns false when it was already bookmarked.
    pub async fn add(&self, user_id: Uuid, listing_id: Uuid) -> SqlxResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO favorites (user_id, listing_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, listing_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(listing_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Returns false when there was nothing to remove
    pub async fn remove(&self, user_id: Uuid, listing_id: Uuid) -> SqlxResult<bool> {
        let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND listing_id = $2")
            .bind(user_id)
            .bind(listing_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn is_favorited(&self, user_id: Uuid, listing_id: Uuid) -> SqlxResult<bool> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM favorites WHERE user_id = $1 AND listing_id = $2)",
        )
        .bind(user_id)
        .bind(listing_id)
        .fetch_one(&self.pool)
        .await
    }

    /// Favorited listings, most recently favorited first
    pub async fn list(&self, user_id: Uuid) -> SqlxResult<Vec<Listing>> {
        sqlx::query_as::<_, Listing>(&format!(
            "{LISTING_SELECT} JOIN favorites f ON f.listing_id = l.id \
             WHERE f.user_id = $1 \
             ORDER BY f.created_at DESC, l.id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }
}
