use crate::models::{ChatRole, ChatSupportMessage};
use sqlx::{PgPool, Result as SqlxResult};
use uuid::Uuid;

/// Repository for persisted support-chat exchanges
pub struct ChatSupportRepository {
    pool: PgPool,
}

impl ChatSupportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Store one question/answer pair atomically
    pub async fn record_exchange(
        &self,
        user_id: Uuid,
        question: &str,
        answer: &str,
    ) -> SqlxResult<()> {
        let mut tx = self.pool.begin().await?;

        for (role, content) in [(ChatRole::User, question), (ChatRole::Assistant, answer)] {
            // NOW() is fixed for the transaction; the answer must sort after the question
            sqlx::query(
                "INSERT INTO chat_support_messages (user_id, role, content, created_at) \
                 VALUES ($1, $2, $3, clock_timestamp())",
            )
            .bind(user_id)
            .bind(role.as_str())
            .bind(content)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await
    }

    /// The user's most recent `limit` messages, returned oldest first
    pub async fn history(&self, user_id: Uuid, limit: i64) -> SqlxResult<Vec<ChatSupportMessage>> {
        sqlx::query_as::<_, ChatSupportMessage>(
            r#"
            SELECT id, user_id, role, content, created_at
            FROM (
                SELECT id, user_id, role, content, created_at
                FROM chat_support_messages
                WHERE user_id = $1
                ORDER BY created_at DESC, id DESC
                LIMIT $2
            ) recent
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }
}
