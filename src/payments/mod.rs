//! Wallet top-up payments

pub mod stripe_client;

pub use stripe_client::{PaymentIntent, StripeClient};
