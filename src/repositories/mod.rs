pub mod category_repository;
pub mod chat_support_repository;
pub mod favorite_repository;
pub mod listing_repository;
pub mod message_repository;
pub mod order_repository;
pub mod review_repository;
pub mod user_repository;
pub mod wallet_repository;

// Re-export all repositories for convenient access
pub use category_repository::CategoryRepository;
pub use chat_support_repository::ChatSupportRepository;
pub use favorite_repository::FavoriteRepository;
pub use listing_repository::ListingRepository;
pub use message_repository::MessageRepository;
pub use order_repository::OrderRepository;
pub use review_repository::ReviewRepository;
pub use user_repository::UserRepository;
pub use wallet_repository::WalletRepository;
