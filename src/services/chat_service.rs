//! Support chatbot backed by a generative-language API
//!
//! The API key never leaves the server. When the key is missing or the call
//! fails for any reason, the user gets a canned answer picked from keywords
//! in their message.

use crate::config::ChatbotConfig;
use crate::error::{AppError, AppResult};
use crate::models::{ChatReply, ChatRequest, ChatRole, ChatSupportMessage, ChatTurn, ReplySource};
use crate::repositories::ChatSupportRepository;
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Chat history entries returned to a user
pub const HISTORY_LIMIT: i64 = 100;

const SYSTEM_INSTRUCTION: &str =
    "You are the Campus Market assistant. Answer briefly and only about buying, selling and using the marketplace.";

const SELLING_REPLY: &str = "To sell an item, open \"Sell\", add a title, price, condition and photos, then publish. You can edit or remove the listing from your profile until it is reserved by a buyer.";
const BUYING_REPLY: &str = "To buy an item, open the listing and choose \"Buy now\". The price is paid from your wallet and held until you confirm you received the item. Either side can cancel a pending order for a full refund.";
const PAYMENT_REPLY: &str = "Your wallet holds your Campus Market balance. Top it up from the Wallet page with a card payment, and withdraw any time. Purchases are paid from the wallet and refunded automatically if an order is cancelled.";
const SAFETY_REPLY: &str = "Meet in a busy public spot on campus, inspect the item before confirming the order, and never pay outside the platform. Report anything suspicious to support.";
const ACCOUNT_REPLY: &str = "You can update your name, bio, avatar and university from your profile page. If you cannot sign in, check that you are using your username or email with the right password.";
const DEFAULT_REPLY: &str = "I can help with buying, selling, your wallet, staying safe and your account. What would you like to know?";

/// Keyword groups, checked in order; the first hit wins
const FALLBACKS: &[(&[&str], &str)] = &[
    (&["scam", "safe", "fraud", "meet", "suspicious"], SAFETY_REPLY),
    (
        &["wallet", "pay", "deposit", "withdraw", "refund", "money", "balance"],
        PAYMENT_REPLY,
    ),
    (&["sell", "listing", "post", "price my"], SELLING_REPLY),
    (&["buy", "purchase", "order"], BUYING_REPLY),
    (
        &["account", "password", "login", "log in", "sign in", "profile"],
        ACCOUNT_REPLY,
    ),
];

/// Canned answer chosen by case-insensitive keyword match
pub fn fallback_reply(message: &str) -> &'static str {
    let message = message.to_lowercase();
    FALLBACKS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| message.contains(k)))
        .map(|(_, reply)| *reply)
        .unwrap_or(DEFAULT_REPLY)
}

pub struct ChatService {
    http: Client,
    config: ChatbotConfig,
    chat_repo: Arc<ChatSupportRepository>,
}

impl ChatService {
    pub fn new(config: ChatbotConfig, chat_repo: Arc<ChatSupportRepository>) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        if config.api_key.is_none() {
            warn!("CHATBOT_API_KEY not set - support chat answers with canned replies only");
        }

        Ok(Self {
            http,
            config,
            chat_repo,
        })
    }

    /// Answer a support question; exchanges of signed-in users are kept
    pub async fn respond(&self, user_id: Option<Uuid>, request: ChatRequest) -> AppResult<ChatReply> {
        let request = request.normalized().map_err(AppError::Validation)?;

        let reply = match self.ask_model(&request).await {
            Ok(text) => ChatReply {
                reply: text,
                source: ReplySource::Model,
            },
            Err(e) => {
                if self.config.api_key.is_some() {
                    warn!("Chatbot unavailable, using fallback: {}", e);
                }
                ChatReply {
                    reply: fallback_reply(&request.message).to_string(),
                    source: ReplySource::Fallback,
                }
            }
        };

        if let Some(user_id) = user_id {
            if let Err(e) = self
                .chat_repo
                .record_exchange(user_id, &request.message, &reply.reply)
                .await
            {
                error!("Failed to store chat exchange for {}: {}", user_id, e);
            }
        }

        Ok(reply)
    }

    pub async fn history(&self, user_id: Uuid) -> AppResult<Vec<ChatSupportMessage>> {
        Ok(self.chat_repo.history(user_id, HISTORY_LIMIT).await?)
    }

    async fn ask_model(&self, request: &ChatRequest) -> AppResult<String> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::ExternalService("Chatbot is not configured".to_string()))?;

        let url = format!(
            "{}/models/{}:generateContent",
            self.config.api_url.trim_end_matches('/'),
            self.config.model
        );

        let response = self
            .http
            .post(&url)
            .query(&[("key", api_key)])
            .json(&build_request_body(&request.history, &request.message))
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Chatbot request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalService(format!(
                "Chatbot returned {}",
                response.status()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("Invalid chatbot response: {}", e)))?;

        let text = extract_reply(&body)
            .ok_or_else(|| AppError::ExternalService("Chatbot returned no text".to_string()))?;
        info!("Chatbot answered ({} chars)", text.len());
        Ok(text)
    }
}

/// `generateContent` payload: prior turns, then the new user message
fn build_request_body(history: &[ChatTurn], message: &str) -> Value {
    let mut contents: Vec<Value> = history
        .iter()
        .filter(|turn| !turn.content.trim().is_empty())
        .map(|turn| {
            let role = match turn.role {
                ChatRole::User => "user",
                ChatRole::Assistant => "model",
            };
            json!({ "role": role, "parts": [{ "text": turn.content }] })
        })
        .collect();
    contents.push(json!({ "role": "user", "parts": [{ "text": message }] }));

    json!({
        "systemInstruction": { "parts": [{ "text": SYSTEM_INSTRUCTION }] },
        "contents": contents,
    })
}

/// `candidates[0].content.parts[0].text`, if non-blank
fn extract_reply(body: &Value) -> Option<String> {
    body.get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .get(0)?
        .get("text")?
        .as_str()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_keywords() {
        assert_eq!(fallback_reply("How do I SELL my textbook?"), SELLING_REPLY);
        assert_eq!(fallback_reply("I want to buy a desk"), BUYING_REPLY);
        assert_eq!(fallback_reply("How do I deposit money?"), PAYMENT_REPLY);
        assert_eq!(fallback_reply("Is it safe to meet a seller?"), SAFETY_REPLY);
        assert_eq!(fallback_reply("I forgot my password"), ACCOUNT_REPLY);
        assert_eq!(fallback_reply("hello there"), DEFAULT_REPLY);
    }

    #[test]
    fn test_fallback_priority() {
        // Mentions both an order and a refund; money questions win
        assert_eq!(fallback_reply("Where is the refund for my order?"), PAYMENT_REPLY);
        // Safety beats everything else
        assert_eq!(fallback_reply("Is this listing a scam?"), SAFETY_REPLY);
    }

    #[test]
    fn test_request_body_maps_roles() {
        let history = vec![
            ChatTurn {
                role: ChatRole::User,
                content: "hi".into(),
            },
            ChatTurn {
                role: ChatRole::Assistant,
                content: "Hello! How can I help?".into(),
            },
        ];
        let body = build_request_body(&history, "How do I sell?");
        let contents = body["contents"].as_array().unwrap();

        assert_eq!(contents.len(), 3);
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[2]["role"], "user");
        assert_eq!(contents[2]["parts"][0]["text"], "How do I sell?");
        assert!(body["systemInstruction"]["parts"][0]["text"].is_string());
    }

    #[test]
    fn test_extract_reply() {
        let body = json!({
            "candidates": [{ "content": { "parts": [{ "text": "  Sure!  " }] } }]
        });
        assert_eq!(extract_reply(&body).as_deref(), Some("Sure!"));
        assert_eq!(extract_reply(&json!({ "candidates": [] })), None);
        assert_eq!(
            extract_reply(&json!({ "candidates": [{ "content": { "parts": [{ "text": " " }] } }] })),
            None
        );
    }
}
