pub mod audit;
pub mod auth_service;
pub mod category_service;
pub mod chat_service;
pub mod favorite_service;
pub mod listing_service;
pub mod message_service;
pub mod order_service;
pub mod review_service;
pub mod user_service;
pub mod wallet_service;

pub use audit::AuditTrailService;
pub use auth_service::AuthService;
pub use category_service::CategoryService;
pub use chat_service::ChatService;
pub use favorite_service::FavoriteService;
pub use listing_service::ListingService;
pub use message_service::MessageService;
pub use order_service::OrderService;
pub use review_service::ReviewService;
pub use user_service::UserService;
pub use wallet_service::{DepositOutcome, WalletService};
