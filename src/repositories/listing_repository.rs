use crate::error::RepositoryError;
use crate::models::{CreateListingRequest, Listing, ListingFilter, UpdateListingRequest};
use sqlx::{PgPool, Postgres, QueryBuilder, Result as SqlxResult};
use uuid::Uuid;

/// Listing columns joined with seller username and category name/slug
pub(crate) const LISTING_SELECT: &str = r#"
    SELECT
        l.id,
        l.seller_id,
        u.username AS seller_username,
        l.category_id,
        c.name AS category_name,
        c.slug AS category_slug,
        l.title,
        l.description,
        l.price,
        l.condition,
        l.images,
        l.location,
        l.status,
        l.views,
        l.version,
        l.created_at,
        l.updated_at
    FROM listings l
    JOIN users u ON u.id = l.seller_id
    LEFT JOIN categories c ON c.id = l.category_id
"#;

const LISTING_COUNT: &str = r#"
    SELECT COUNT(*)
    FROM listings l
    LEFT JOIN categories c ON c.id = l.category_id
"#;

/// Repository for listing data access
pub struct ListingRepository {
    pool: PgPool,
}

impl ListingRepository {
    /// Create a new ListingRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// One page of listings matching `filter`, plus the total match count
    pub async fn search(&self, filter: &ListingFilter) -> SqlxResult<(Vec<Listing>, i64)> {
        let mut count_query = QueryBuilder::<Postgres>::new(LISTING_COUNT);
        push_filters(&mut count_query, filter);
        let total: i64 = count_query
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut query = QueryBuilder::<Postgres>::new(LISTING_SELECT);
        push_filters(&mut query, filter);
        query.push(" ORDER BY ");
        query.push(filter.sort.order_by());
        query.push(" LIMIT ");
        query.push_bind(filter.limit as i64);
        query.push(" OFFSET ");
        query.push_bind(filter.offset());

        let items = query
            .build_query_as::<Listing>()
            .fetch_all(&self.pool)
            .await?;

        Ok((items, total))
    }

    /// Find a listing by UUID
    pub async fn find_by_id(&self, id: Uuid) -> SqlxResult<Option<Listing>> {
        sqlx::query_as::<_, Listing>(&format!("{LISTING_SELECT} WHERE l.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Every listing of a seller regardless of status, newest first
    pub async fn find_by_seller(&self, seller_id: Uuid) -> SqlxResult<Vec<Listing>> {
        sqlx::query_as::<_, Listing>(&format!(
            "{LISTING_SELECT} WHERE l.seller_id = $1 ORDER BY l.created_at DESC, l.id DESC"
        ))
        .bind(seller_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Bump the view counter; false when the listing does not exist
    pub async fn increment_views(&self, id: Uuid) -> SqlxResult<bool> {
        let result = sqlx::query("UPDATE listings SET views = views + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn create(
        &self,
        seller_id: Uuid,
        request: &CreateListingRequest,
    ) -> Result<Listing, RepositoryError> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO listings
                (seller_id, category_id, title, description, price, condition, images, location)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(seller_id)
        .bind(request.category_id)
        .bind(&request.title)
        .bind(&request.description)
        .bind(request.price)
        .bind(request.condition.as_str())
        .bind(serde_json::json!(request.images))
        .bind(&request.location)
        .fetch_one(&self.pool)
        .await
        .map_err(unknown_category)?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("Listing {} not found", id)))
    }

    /// Apply a partial update under a row lock.
    ///
    /// Sold listings are frozen, and a provided `expected_version` must match
    /// the stored one. Every successful update bumps `version`.
    pub async fn update(
        &self,
        id: Uuid,
        request: &UpdateListingRequest,
    ) -> Result<Listing, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current: Option<(String, i32)> =
            sqlx::query_as("SELECT status, version FROM listings WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let (status, version) =
            current.ok_or_else(|| RepositoryError::NotFound(format!("Listing {} not found", id)))?;

        if status == "sold" {
            return Err(RepositoryError::Conflict(
                "Sold listings cannot be edited".to_string(),
            ));
        }
        if let Some(expected) = request.expected_version {
            if expected != version {
                return Err(RepositoryError::Conflict(format!(
                    "Listing was modified (expected version {}, found {})",
                    expected, version
                )));
            }
        }

        let images = request.images.as_ref().map(|i| serde_json::json!(i));

        sqlx::query(
            r#"
            UPDATE listings
            SET title = COALESCE($2, title),
                description = CASE WHEN $3::TEXT IS NULL THEN description ELSE NULLIF($3::TEXT, '') END,
                price = COALESCE($4, price),
                condition = COALESCE($5, condition),
                category_id = CASE WHEN $9 THEN $6 ELSE category_id END,
                images = COALESCE($7, images),
                location = CASE WHEN $8::TEXT IS NULL THEN location ELSE NULLIF($8::TEXT, '') END,
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&request.title)
        .bind(&request.description)
        .bind(request.price)
        .bind(request.condition.map(|c| c.as_str()))
        .bind(request.category_id.flatten())
        .bind(images)
        .bind(&request.location)
        .bind(request.category_id.is_some())
        .execute(&mut *tx)
        .await
        .map_err(unknown_category)?;

        tx.commit().await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("Listing {} not found", id)))
    }

    /// Delete a listing unless an order is still holding it
    pub async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let locked: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM listings WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Err(RepositoryError::NotFound(format!("Listing {} not found", id)));
        }

        let pending: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM orders WHERE listing_id = $1 AND status = 'pending')",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if pending {
            return Err(RepositoryError::Conflict(
                "Listing has a pending order".to_string(),
            ));
        }

        sqlx::query("DELETE FROM listings WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &ListingFilter) {
    query.push(" WHERE TRUE");

    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", escape_like(search));
        query.push(" AND (l.title ILIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR l.description ILIKE ");
        query.push_bind(pattern);
        query.push(")");
    }
    if let Some(slug) = &filter.category_slug {
        query.push(" AND c.slug = ");
        query.push_bind(slug.clone());
    }
    if let Some(condition) = filter.condition {
        query.push(" AND l.condition = ");
        query.push_bind(condition.as_str());
    }
    if let Some(min) = filter.min_price {
        query.push(" AND l.price >= ");
        query.push_bind(min);
    }
    if let Some(max) = filter.max_price {
        query.push(" AND l.price <= ");
        query.push_bind(max);
    }
    if let Some(seller_id) = filter.seller_id {
        query.push(" AND l.seller_id = ");
        query.push_bind(seller_id);
    }
    if let Some(status) = filter.status {
        query.push(" AND l.status = ");
        query.push_bind(status.as_str());
    }
}

/// Escape LIKE wildcards so user input only matches literally
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn unknown_category(err: sqlx::Error) -> RepositoryError {
    match RepositoryError::from(err) {
        RepositoryError::ConstraintViolation(msg) if msg.contains("category") => {
            RepositoryError::InvalidInput("Category does not exist".to_string())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ListingQuery, ListingSort};

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50% off"), "50\\% off");
        assert_eq!(escape_like("snake_case"), "snake\\_case");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn test_filters_render_in_order() {
        let filter = ListingFilter::try_from(ListingQuery {
            search: Some("lamp".into()),
            category: Some("furniture".into()),
            min_price: Some(rust_decimal::Decimal::from(5)),
            ..Default::default()
        })
        .unwrap();

        let mut query = QueryBuilder::<Postgres>::new("SELECT 1 FROM listings l");
        push_filters(&mut query, &filter);
        let sql = query.sql();

        assert!(sql.contains("l.title ILIKE $1 OR l.description ILIKE $2"));
        assert!(sql.contains("c.slug = $3"));
        assert!(sql.contains("l.price >= $4"));
        assert!(sql.contains("l.status = $5"));
        assert!(!sql.contains("l.seller_id"));
    }

    #[test]
    fn test_status_all_drops_status_clause() {
        let filter = ListingFilter::try_from(ListingQuery {
            status: Some("all".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(filter.sort, ListingSort::Newest);

        let mut query = QueryBuilder::<Postgres>::new("SELECT 1 FROM listings l");
        push_filters(&mut query, &filter);
        assert!(!query.sql().contains("l.status"));
    }
}
