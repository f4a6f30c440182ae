use crate::models::{Message, MessageWithParties, SendMessageRequest};
use sqlx::{PgPool, Result as SqlxResult};
use uuid::Uuid;

const MESSAGE_WITH_PARTIES_SELECT: &str = r#"
    SELECT
        m.id,
        m.sender_id,
        s.username AS sender_username,
        m.receiver_id,
        r.username AS receiver_username,
        m.listing_id,
        l.title AS listing_title,
        m.content,
        m.is_read,
        m.created_at
    FROM messages m
    JOIN users s ON s.id = m.sender_id
    JOIN users r ON r.id = m.receiver_id
    LEFT JOIN listings l ON l.id = m.listing_id
"#;

/// Repository for direct messages
pub struct MessageRepository {
    pool: PgPool,
}

impl MessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, sender_id: Uuid, request: &SendMessageRequest) -> SqlxResult<Message> {
        sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (sender_id, receiver_id, listing_id, content)
            VALUES ($1, $2, $3, $4)
            RETURNING id, sender_id, receiver_id, listing_id, content, is_read, created_at
            "#,
        )
        .bind(sender_id)
        .bind(request.receiver_id)
        .bind(request.listing_id)
        .bind(&request.content)
        .fetch_one(&self.pool)
        .await
    }

    /// Every message the user sent or received, newest first
    pub async fn find_for_user(&self, user_id: Uuid) -> SqlxResult<Vec<MessageWithParties>> {
        sqlx::query_as::<_, MessageWithParties>(&format!(
            "{MESSAGE_WITH_PARTIES_SELECT} \
             WHERE m.sender_id = $1 OR m.receiver_id = $1 \
             ORDER BY m.created_at DESC, m.id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Messages between two users, oldest first, optionally about one listing
    pub async fn thread(
        &self,
        user_id: Uuid,
        other_id: Uuid,
        listing_id: Option<Uuid>,
    ) -> SqlxResult<Vec<MessageWithParties>> {
        sqlx::query_as::<_, MessageWithParties>(&format!(
            "{MESSAGE_WITH_PARTIES_SELECT} \
             WHERE ((m.sender_id = $1 AND m.receiver_id = $2) \
                 OR (m.sender_id = $2 AND m.receiver_id = $1)) \
               AND ($3::UUID IS NULL OR m.listing_id = $3) \
             ORDER BY m.created_at ASC, m.id ASC"
        ))
        .bind(user_id)
        .bind(other_id)
        .bind(listing_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Mark what `sender_id` sent to `receiver_id` as read; returns rows changed
    pub async fn mark_read(
        &self,
        receiver_id: Uuid,
        sender_id: Uuid,
        listing_id: Option<Uuid>,
    ) -> SqlxResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE messages
            SET is_read = TRUE
            WHERE receiver_id = $1
              AND sender_id = $2
              AND is_read = FALSE
              AND ($3::UUID IS NULL OR listing_id = $3)
            "#,
        )
        .bind(receiver_id)
        .bind(sender_id)
        .bind(listing_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn unread_count(&self, user_id: Uuid) -> SqlxResult<i64> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM messages WHERE receiver_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
    }
}
