use crate::error::{AppError, AppResult};
use crate::models::{
    Conversation, ConversationUser, Message, MessageWithParties, SendMessageRequest,
};
use crate::repositories::{ListingRepository, MessageRepository, UserRepository};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Direct messages and the inbox view
pub struct MessageService {
    message_repo: Arc<MessageRepository>,
    user_repo: Arc<UserRepository>,
    listing_repo: Arc<ListingRepository>,
}

impl MessageService {
    pub fn new(
        message_repo: Arc<MessageRepository>,
        user_repo: Arc<UserRepository>,
        listing_repo: Arc<ListingRepository>,
    ) -> Self {
        Self {
            message_repo,
            user_repo,
            listing_repo,
        }
    }

    pub async fn send(&self, sender_id: Uuid, request: SendMessageRequest) -> AppResult<Message> {
        let request = request.normalized().map_err(AppError::Validation)?;

        if request.receiver_id == sender_id {
            return Err(AppError::Validation(
                "You cannot message yourself".to_string(),
            ));
        }
        if !self.user_repo.exists(request.receiver_id).await? {
            return Err(AppError::NotFound("Recipient not found".to_string()));
        }
        if let Some(listing_id) = request.listing_id {
            if self.listing_repo.find_by_id(listing_id).await?.is_none() {
                return Err(AppError::NotFound("Listing not found".to_string()));
            }
        }

        let message = self.message_repo.create(sender_id, &request).await?;
        debug!("Message {} from {} to {}", message.id, sender_id, message.receiver_id);
        Ok(message)
    }

    pub async fn conversations(&self, user_id: Uuid) -> AppResult<Vec<Conversation>> {
        let messages = self.message_repo.find_for_user(user_id).await?;
        Ok(group_conversations(user_id, &messages))
    }

    /// The thread with another user, oldest first. Opening it marks the
    /// caller's incoming messages as read.
    pub async fn thread(
        &self,
        user_id: Uuid,
        other_id: Uuid,
        listing_id: Option<Uuid>,
    ) -> AppResult<Vec<MessageWithParties>> {
        if !self.user_repo.exists(other_id).await? {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        let marked = self
            .message_repo
            .mark_read(user_id, other_id, listing_id)
            .await?;
        if marked > 0 {
            debug!("Marked {} messages read for {}", marked, user_id);
        }

        Ok(self
            .message_repo
            .thread(user_id, other_id, listing_id)
            .await?)
    }

    pub async fn unread_count(&self, user_id: Uuid) -> AppResult<i64> {
        Ok(self.message_repo.unread_count(user_id).await?)
    }
}

/// Group a user's messages into one conversation per (other user, listing),
/// most recently active first.
pub fn group_conversations(user_id: Uuid, messages: &[MessageWithParties]) -> Vec<Conversation> {
    let mut index: HashMap<(Uuid, Option<Uuid>), usize> = HashMap::new();
    let mut conversations: Vec<Conversation> = Vec::new();

    for message in messages {
        let (other_id, other_username) = message.counterpart(user_id);
        let unread = message.receiver_id == user_id && !message.is_read;

        match index.get(&(other_id, message.listing_id)) {
            Some(&i) => {
                let conversation = &mut conversations[i];
                if message.created_at > conversation.last_message_at {
                    conversation.last_message = message.content.clone();
                    conversation.last_message_at = message.created_at;
                    conversation.last_message_from_me = message.sender_id == user_id;
                    conversation.listing_title = message.listing_title.clone();
                }
                if unread {
                    conversation.unread_count += 1;
                }
            }
            None => {
                index.insert((other_id, message.listing_id), conversations.len());
                conversations.push(Conversation {
                    other_user: ConversationUser {
                        id: other_id,
                        username: other_username.to_string(),
                    },
                    listing_id: message.listing_id,
                    listing_title: message.listing_title.clone(),
                    last_message: message.content.clone(),
                    last_message_at: message.created_at,
                    last_message_from_me: message.sender_id == user_id,
                    unread_count: i64::from(unread),
                });
            }
        }
    }

    conversations.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));
    conversations
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDateTime, Utc};

    struct Fixture {
        me: Uuid,
        alice: Uuid,
        bob: Uuid,
        lamp: Uuid,
        base: NaiveDateTime,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                me: Uuid::new_v4(),
                alice: Uuid::new_v4(),
                bob: Uuid::new_v4(),
                lamp: Uuid::new_v4(),
                base: Utc::now().naive_utc(),
            }
        }

        fn name(&self, id: Uuid) -> String {
            if id == self.me {
                "me".into()
            } else if id == self.alice {
                "alice".into()
            } else {
                "bob".into()
            }
        }

        fn message(
            &self,
            from: Uuid,
            to: Uuid,
            listing: Option<Uuid>,
            minutes: i64,
            read: bool,
        ) -> MessageWithParties {
            MessageWithParties {
                id: Uuid::new_v4(),
                sender_id: from,
                sender_username: self.name(from),
                receiver_id: to,
                receiver_username: self.name(to),
                listing_id: listing,
                listing_title: listing.map(|_| "Desk lamp".to_string()),
                content: format!("message at {}", minutes),
                is_read: read,
                created_at: self.base + chrono::Duration::minutes(minutes),
            }
        }
    }

    #[test]
    fn test_groups_by_counterpart_and_listing() {
        let f = Fixture::new();
        let messages = vec![
            f.message(f.alice, f.me, Some(f.lamp), 1, true),
            f.message(f.me, f.alice, Some(f.lamp), 2, false),
            f.message(f.alice, f.me, None, 3, false),
            f.message(f.bob, f.me, Some(f.lamp), 4, false),
        ];

        let conversations = group_conversations(f.me, &messages);
        assert_eq!(conversations.len(), 3);

        // Newest activity first
        assert_eq!(conversations[0].other_user.username, "bob");
        assert_eq!(conversations[1].other_user.id, f.alice);
        assert_eq!(conversations[1].listing_id, None);
        assert_eq!(conversations[2].listing_id, Some(f.lamp));
        assert_eq!(conversations[2].listing_title.as_deref(), Some("Desk lamp"));
    }

    #[test]
    fn test_last_message_and_unread_count() {
        let f = Fixture::new();
        // Repository order is newest first; grouping must not depend on it
        let messages = vec![
            f.message(f.me, f.alice, Some(f.lamp), 5, false),
            f.message(f.alice, f.me, Some(f.lamp), 3, false),
            f.message(f.alice, f.me, Some(f.lamp), 1, false),
            f.message(f.alice, f.me, Some(f.lamp), 0, true),
        ];

        let conversations = group_conversations(f.me, &messages);
        assert_eq!(conversations.len(), 1);

        let conversation = &conversations[0];
        assert_eq!(conversation.last_message, "message at 5");
        assert!(conversation.last_message_from_me);
        // My own unread outgoing message does not count
        assert_eq!(conversation.unread_count, 2);
    }

    #[test]
    fn test_counterpart_is_seen_from_either_side() {
        let f = Fixture::new();
        let messages = vec![f.message(f.me, f.bob, None, 0, false)];

        let mine = group_conversations(f.me, &messages);
        assert_eq!(mine[0].other_user.username, "bob");
        assert_eq!(mine[0].unread_count, 0);

        let theirs = group_conversations(f.bob, &messages);
        assert_eq!(theirs[0].other_user.username, "me");
        assert_eq!(theirs[0].unread_count, 1);
        assert!(!theirs[0].last_message_from_me);
    }

    #[test]
    fn test_empty_inbox() {
        assert!(group_conversations(Uuid::new_v4(), &[]).is_empty());
    }
}
