//! Campus Market Backend Library
//!
//! This module exposes the backend components for use by the server binary and tests.

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod payments;
pub mod repositories;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, AppResult};

use auth::JwtKeys;
use database::Database;
use payments::StripeClient;
use repositories::*;
use services::*;
use std::path::PathBuf;
use std::sync::Arc;

/// Application state containing all repositories and services
pub struct AppState {
    pub database: Database,
    pub config: AppConfig,
    pub jwt: JwtKeys,
    pub auth_service: Arc<AuthService>,
    pub user_service: Arc<UserService>,
    pub category_service: Arc<CategoryService>,
    pub listing_service: Arc<ListingService>,
    pub favorite_service: Arc<FavoriteService>,
    pub message_service: Arc<MessageService>,
    pub review_service: Arc<ReviewService>,
    pub wallet_service: Arc<WalletService>,
    pub order_service: Arc<OrderService>,
    pub chat_service: Arc<ChatService>,
}

impl AppState {
    /// Wire repositories and services over a pool
    pub fn new(pool: sqlx::PgPool, config: AppConfig) -> AppResult<Self> {
        let database = Database::new(pool.clone());
        let jwt = JwtKeys::new(&config.auth.jwt_secret, config.auth.token_ttl_hours);

        let user_repo = Arc::new(UserRepository::new(pool.clone()));
        let category_repo = Arc::new(CategoryRepository::new(pool.clone()));
        let listing_repo = Arc::new(ListingRepository::new(pool.clone()));
        let favorite_repo = Arc::new(FavoriteRepository::new(pool.clone()));
        let message_repo = Arc::new(MessageRepository::new(pool.clone()));
        let review_repo = Arc::new(ReviewRepository::new(pool.clone()));
        let wallet_repo = Arc::new(WalletRepository::new(pool.clone()));
        let order_repo = Arc::new(OrderRepository::new(pool.clone()));
        let chat_repo = Arc::new(ChatSupportRepository::new(pool));

        let audit = Arc::new(AuditTrailService::new(PathBuf::from(&config.audit_log_dir))?);
        let stripe = Arc::new(StripeClient::new(&config.payments)?);

        Ok(Self {
            database,
            jwt: jwt.clone(),
            auth_service: Arc::new(AuthService::new(user_repo.clone(), jwt)),
            user_service: Arc::new(UserService::new(user_repo.clone())),
            category_service: Arc::new(CategoryService::new(category_repo, user_repo.clone())),
            listing_service: Arc::new(ListingService::new(listing_repo.clone())),
            favorite_service: Arc::new(FavoriteService::new(favorite_repo, listing_repo.clone())),
            message_service: Arc::new(MessageService::new(
                message_repo,
                user_repo.clone(),
                listing_repo,
            )),
            review_service: Arc::new(ReviewService::new(
                review_repo,
                order_repo.clone(),
                user_repo,
            )),
            wallet_service: Arc::new(WalletService::new(wallet_repo, stripe, audit.clone())),
            order_service: Arc::new(OrderService::new(order_repo, audit)),
            chat_service: Arc::new(ChatService::new(config.chatbot.clone(), chat_repo)?),
            config,
        })
    }
}
