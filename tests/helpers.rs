#![allow(dead_code)]

use campus_market::auth::hash_password;
use campus_market::models::*;
use campus_market::repositories::*;
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

pub const TEST_PASSWORD: &str = "password123";

/// Repositories over a test database
pub struct TestDatabase {
    pub pool: PgPool,
    pub user_repo: Arc<UserRepository>,
    pub category_repo: Arc<CategoryRepository>,
    pub listing_repo: Arc<ListingRepository>,
    pub favorite_repo: Arc<FavoriteRepository>,
    pub message_repo: Arc<MessageRepository>,
    pub review_repo: Arc<ReviewRepository>,
    pub wallet_repo: Arc<WalletRepository>,
    pub order_repo: Arc<OrderRepository>,
    pub chat_repo: Arc<ChatSupportRepository>,
}

impl TestDatabase {
    /// Create TestDatabase from an existing pool (useful with sqlx::test)
    pub async fn from_pool(pool: PgPool) -> Self {
        Self {
            pool: pool.clone(),
            user_repo: Arc::new(UserRepository::new(pool.clone())),
            category_repo: Arc::new(CategoryRepository::new(pool.clone())),
            listing_repo: Arc::new(ListingRepository::new(pool.clone())),
            favorite_repo: Arc::new(FavoriteRepository::new(pool.clone())),
            message_repo: Arc::new(MessageRepository::new(pool.clone())),
            review_repo: Arc::new(ReviewRepository::new(pool.clone())),
            wallet_repo: Arc::new(WalletRepository::new(pool.clone())),
            order_repo: Arc::new(OrderRepository::new(pool.clone())),
            chat_repo: Arc::new(ChatSupportRepository::new(pool)),
        }
    }

    /// Clean up all test data except the seeded categories
    pub async fn cleanup(&self) {
        sqlx::query(
            "TRUNCATE TABLE chat_support_messages, wallet_transactions, reviews, orders, \
             favorites, messages, listings, users CASCADE",
        )
        .execute(&self.pool)
        .await
        .expect("Failed to cleanup test data");
    }
}

/// Helper function to create a test user whose password is [`TEST_PASSWORD`]
pub async fn create_test_user(db: &TestDatabase, username: &str) -> User {
    let request = RegisterRequest {
        username: username.to_string(),
        email: format!("{}@campus.edu", username),
        password: TEST_PASSWORD.to_string(),
        full_name: None,
        university: Some("State University".to_string()),
    };
    let hash = hash_password(TEST_PASSWORD).expect("Failed to hash password");

    db.user_repo
        .create(&request, &hash)
        .await
        .expect("Failed to create test user")
}

/// Helper function to top up a wallet
pub async fn fund(db: &TestDatabase, user_id: Uuid, amount: Decimal) -> WalletTransaction {
    let reference = format!("test_{}", Uuid::new_v4());
    db.wallet_repo
        .credit(&LedgerEntry {
            user_id,
            amount,
            tx_type: TransactionType::Deposit,
            reference: Some(&reference),
            order_id: None,
            description: Some("Test top-up"),
        })
        .await
        .expect("Failed to fund wallet")
}

pub async fn category_id(db: &TestDatabase, slug: &str) -> Uuid {
    db.category_repo
        .find_by_slug(slug)
        .await
        .expect("Failed to query category")
        .expect("Seeded category missing")
        .id
}

/// Helper function to create a test listing
pub async fn create_test_listing(
    db: &TestDatabase,
    seller_id: Uuid,
    title: &str,
    price: Decimal,
    category_id: Option<Uuid>,
) -> Listing {
    let request = CreateListingRequest {
        title: title.to_string(),
        description: Some(format!("{} in good shape", title)),
        price,
        condition: ListingCondition::Good,
        category_id,
        images: vec![],
        location: Some("Library".to_string()),
    };

    db.listing_repo
        .create(seller_id, &request)
        .await
        .expect("Failed to create test listing")
}

pub async fn balance_of(db: &TestDatabase, user_id: Uuid) -> Decimal {
    db.wallet_repo
        .balance(user_id)
        .await
        .expect("Failed to read balance")
        .expect("User missing")
}

/// Every ledger row of the user chains onto the previous one and the
/// last `balance_after` equals the stored balance
pub async fn assert_ledger_consistent(db: &TestDatabase, user_id: Uuid) {
    let mut rows = db
        .wallet_repo
        .transactions(user_id, 1000)
        .await
        .expect("Failed to read ledger");
    rows.reverse();

    let mut running = Decimal::ZERO;
    for row in &rows {
        assert_eq!(row.balance_before, running, "ledger gap before {}", row.id);
        let tx_type = row.tx_type().expect("Unknown transaction type");
        let expected = if tx_type.is_credit() {
            row.balance_before + row.amount
        } else {
            row.balance_before - row.amount
        };
        assert_eq!(row.balance_after, expected, "bad balance_after on {}", row.id);
        running = row.balance_after;
    }

    assert_eq!(balance_of(db, user_id).await, running);
}

/// Minimal stand-in for the Stripe API: answers every request with `intent`
/// as JSON. Returns the base URL to configure as `stripe_api_base`.
pub async fn stripe_stub(intent: serde_json::Value) -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind Stripe stub");
    let addr = listener.local_addr().expect("stub address");
    let body = intent.to_string();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let body = body.clone();
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    format!("http://{}/v1", addr)
}
