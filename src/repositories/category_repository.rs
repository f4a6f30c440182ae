use crate::error::RepositoryError;
use crate::models::{Category, CreateCategoryRequest};
use sqlx::{PgPool, Result as SqlxResult};

/// Categories with their count of active listings
const CATEGORY_SELECT: &str = r#"
    SELECT
        c.id,
        c.name,
        c.slug,
        c.description,
        c.icon,
        COUNT(l.id) FILTER (WHERE l.status = 'active') AS item_count,
        c.created_at
    FROM categories c
    LEFT JOIN listings l ON l.category_id = c.id
"#;

/// Repository for category data access
pub struct CategoryRepository {
    pool: PgPool,
}

impl CategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All categories ordered by name
    pub async fn list(&self) -> SqlxResult<Vec<Category>> {
        sqlx::query_as::<_, Category>(&format!(
            "{CATEGORY_SELECT} GROUP BY c.id ORDER BY c.name ASC"
        ))
        .fetch_all(&self.pool)
        .await
    }

    pub async fn find_by_slug(&self, slug: &str) -> SqlxResult<Option<Category>> {
        sqlx::query_as::<_, Category>(&format!(
            "{CATEGORY_SELECT} WHERE c.slug = $1 GROUP BY c.id"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
    }

    /// Insert a category; `slug` must already be derived
    pub async fn create(
        &self,
        request: &CreateCategoryRequest,
        slug: &str,
    ) -> Result<Category, RepositoryError> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (name, slug, description, icon)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, slug, description, icon, 0::BIGINT AS item_count, created_at
            "#,
        )
        .bind(request.name.trim())
        .bind(slug)
        .bind(&request.description)
        .bind(&request.icon)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match RepositoryError::from(e) {
            RepositoryError::Duplicate(_) => {
                RepositoryError::Duplicate("Category already exists".to_string())
            }
            other => other,
        })?;

        Ok(category)
    }
}
