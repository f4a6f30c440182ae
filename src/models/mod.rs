//! Domain models for the Campus Market backend.
//!
//! This module contains all database-backed models representing
//! the core entities of the marketplace, plus the request payloads
//! that create or change them.

pub mod category;
pub mod chat_support;
pub mod favorite;
pub mod listing;
pub mod message;
pub mod order;
pub mod review;
pub mod user;
pub mod wallet;

// Re-export all models for convenient access
pub use category::{slugify, Category, CreateCategoryRequest};
pub use chat_support::{ChatReply, ChatRequest, ChatRole, ChatSupportMessage, ChatTurn, ReplySource};
pub use favorite::{Favorite, FavoriteStatus};
pub use listing::{
    CreateListingRequest, Listing, ListingCondition, ListingFilter, ListingPage, ListingQuery,
    ListingSort, ListingStatus, UpdateListingRequest,
};
pub use message::{
    Conversation, ConversationUser, Message, MessageWithParties, SendMessageRequest, ThreadQuery,
};
pub use order::{
    CreateOrderRequest, Order, OrderParty, OrderRole, OrderStatus, OrdersQuery, TransitionError,
    UpdateOrderStatusRequest,
};
pub use review::{CreateReviewRequest, RatingSummary, Review, SellerReviews};
pub use user::{
    AuthResponse, LoginRequest, PublicProfile, RegisterRequest, UpdateProfileRequest, User,
};
pub use wallet::{
    DepositRequest, LedgerEntry, PaymentIntentRequest, TransactionStatus, TransactionType,
    TransactionsQuery, WalletSummary, WalletTransaction, WithdrawRequest,
};
