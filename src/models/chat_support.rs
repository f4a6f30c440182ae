use crate::models::user::reject_nul;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const MAX_CHAT_HISTORY: usize = 20;
pub const MAX_CHAT_MESSAGE_LENGTH: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// Persisted support-chat line for a signed-in user
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChatSupportMessage {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub role: String,
    pub content: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

/// Where a reply came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplySource {
    Model,
    Fallback,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub reply: String,
    pub source: ReplySource,
}

impl ChatRequest {
    pub fn normalized(self) -> Result<Self, String> {
        let message = self.message.trim().to_string();
        if message.is_empty() {
            return Err("Message cannot be empty".to_string());
        }
        reject_nul(&message, "Message")?;
        if message.chars().count() > MAX_CHAT_MESSAGE_LENGTH {
            return Err(format!(
                "Message cannot exceed {} characters",
                MAX_CHAT_MESSAGE_LENGTH
            ));
        }
        if self.history.len() > MAX_CHAT_HISTORY {
            return Err(format!(
                "History cannot exceed {} turns",
                MAX_CHAT_HISTORY
            ));
        }
        Ok(Self {
            message,
            history: self.history,
        })
    }
}
