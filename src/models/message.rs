use crate::models::user::reject_nul;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const MAX_MESSAGE_LENGTH: usize = 2000;

/// Direct message between two users, optionally about a listing
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub listing_id: Option<Uuid>,
    pub content: String,
    pub is_read: bool,
    pub created_at: NaiveDateTime,
}

/// Message joined with both parties' usernames and the listing title
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MessageWithParties {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub sender_username: String,
    pub receiver_id: Uuid,
    pub receiver_username: String,
    pub listing_id: Option<Uuid>,
    pub listing_title: Option<String>,
    pub content: String,
    pub is_read: bool,
    pub created_at: NaiveDateTime,
}

impl MessageWithParties {
    /// The other participant from `user_id`'s point of view
    pub fn counterpart(&self, user_id: Uuid) -> (Uuid, &str) {
        if self.sender_id == user_id {
            (self.receiver_id, &self.receiver_username)
        } else {
            (self.sender_id, &self.sender_username)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationUser {
    pub id: Uuid,
    pub username: String,
}

/// One thread in the inbox, keyed by (other user, listing)
#[derive(Debug, Clone, Serialize)]
pub struct Conversation {
    pub other_user: ConversationUser,
    pub listing_id: Option<Uuid>,
    pub listing_title: Option<String>,
    pub last_message: String,
    pub last_message_at: NaiveDateTime,
    pub last_message_from_me: bool,
    pub unread_count: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageRequest {
    pub receiver_id: Uuid,
    pub listing_id: Option<Uuid>,
    pub content: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThreadQuery {
    pub listing_id: Option<Uuid>,
}

impl SendMessageRequest {
    pub fn normalized(self) -> Result<Self, String> {
        let content = self.content.trim().to_string();
        if content.is_empty() {
            return Err("Message cannot be empty".to_string());
        }
        reject_nul(&content, "Message")?;
        if content.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(format!(
                "Message cannot exceed {} characters",
                MAX_MESSAGE_LENGTH
            ));
        }
        Ok(Self { content, ..self })
    }
}
