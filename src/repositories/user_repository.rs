use crate::error::RepositoryError;
use crate::models::{PublicProfile, RegisterRequest, UpdateProfileRequest, User};
use sqlx::{PgPool, Result as SqlxResult};
use uuid::Uuid;

const USER_COLUMNS: &str = "id, username, email, password_hash, full_name, bio, avatar_url, \
     university, is_admin, wallet_balance, created_at, updated_at";

/// Repository for user data access
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new UserRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new user. Username/email collisions surface as `Duplicate`.
    pub async fn create(
        &self,
        request: &RegisterRequest,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, email, password_hash, full_name, university)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&request.username)
        .bind(&request.email)
        .bind(password_hash)
        .bind(&request.full_name)
        .bind(&request.university)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match RepositoryError::from(e) {
            RepositoryError::Duplicate(msg) if msg.contains("email") => {
                RepositoryError::Duplicate("Email is already registered".to_string())
            }
            RepositoryError::Duplicate(_) => {
                RepositoryError::Duplicate("Username is already taken".to_string())
            }
            other => other,
        })?;

        Ok(user)
    }

    /// Find a user by UUID
    pub async fn find_by_id(&self, id: Uuid) -> SqlxResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Find a user by username (case-sensitive) or email (case-insensitive)
    pub async fn find_by_login(&self, login: &str) -> SqlxResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE username = $1 OR email = LOWER($1)
            LIMIT 1
            "#
        ))
        .bind(login)
        .fetch_optional(&self.pool)
        .await
    }

    /// Apply the provided profile fields, leaving the rest untouched.
    /// An empty string clears the field.
    pub async fn update_profile(
        &self,
        id: Uuid,
        update: &UpdateProfileRequest,
    ) -> SqlxResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET full_name = CASE WHEN $2::TEXT IS NULL THEN full_name ELSE NULLIF($2::TEXT, '') END,
                bio = CASE WHEN $3::TEXT IS NULL THEN bio ELSE NULLIF($3::TEXT, '') END,
                avatar_url = CASE WHEN $4::TEXT IS NULL THEN avatar_url ELSE NULLIF($4::TEXT, '') END,
                university = CASE WHEN $5::TEXT IS NULL THEN university ELSE NULLIF($5::TEXT, '') END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&update.full_name)
        .bind(&update.bio)
        .bind(&update.avatar_url)
        .bind(&update.university)
        .fetch_optional(&self.pool)
        .await
    }

    /// Public profile with rating and listing statistics
    pub async fn find_public_profile(&self, id: Uuid) -> SqlxResult<Option<PublicProfile>> {
        sqlx::query_as::<_, PublicProfile>(
            r#"
            SELECT
                u.id,
                u.username,
                u.full_name,
                u.bio,
                u.avatar_url,
                u.university,
                u.created_at AS member_since,
                (SELECT AVG(r.rating)::float8 FROM reviews r WHERE r.seller_id = u.id) AS average_rating,
                (SELECT COUNT(*) FROM reviews r WHERE r.seller_id = u.id) AS review_count,
                (SELECT COUNT(*) FROM listings l WHERE l.seller_id = u.id AND l.status = 'active') AS active_listing_count
            FROM users u
            WHERE u.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Check whether a user exists
    pub async fn exists(&self, id: Uuid) -> SqlxResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}
