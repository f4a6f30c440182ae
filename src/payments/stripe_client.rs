//! Stripe PaymentIntent client
//!
//! Without a secret key the client runs in simulation mode: intents are
//! generated locally and reported as succeeded, so wallet top-ups work in
//! development without a Stripe account.

use crate::config::PaymentConfig;
use crate::error::{AppError, AppResult};
use reqwest::Client;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

/// Prefix of locally generated intent ids
pub const SIMULATED_INTENT_PREFIX: &str = "pi_sim_";

/// Status Stripe reports once the payment has been captured
pub const STATUS_SUCCEEDED: &str = "succeeded";

/// Payment intent as returned to API clients
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: Option<String>,
    /// Major currency units
    pub amount: Decimal,
    pub currency: String,
    pub status: String,
    pub simulated: bool,
    /// User the intent was created for, from `metadata[user_id]`
    #[serde(skip)]
    pub user_id: Option<Uuid>,
}

impl PaymentIntent {
    pub fn is_succeeded(&self) -> bool {
        self.status == STATUS_SUCCEEDED
    }
}

/// Stripe intent ids are `pi_` followed by alphanumerics
pub fn is_valid_intent_id(id: &str) -> bool {
    id.strip_prefix("pi_")
        .map_or(false, |rest| {
            !rest.is_empty() && rest.len() <= 255 && rest.chars().all(|c| c.is_ascii_alphanumeric())
        })
}

/// Wire shape of a Stripe PaymentIntent
#[derive(Debug, Deserialize)]
struct StripeIntent {
    id: String,
    client_secret: Option<String>,
    amount: i64,
    currency: String,
    status: String,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

pub struct StripeClient {
    http: Client,
    secret_key: Option<String>,
    api_base: String,
    currency: String,
}

impl StripeClient {
    pub fn new(config: &PaymentConfig) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        if config.stripe_secret_key.is_none() {
            warn!("STRIPE_SECRET_KEY not set - wallet payments run in simulation mode");
        }

        Ok(Self {
            http,
            secret_key: config.stripe_secret_key.clone(),
            api_base: config.stripe_api_base.trim_end_matches('/').to_string(),
            currency: config.currency.to_lowercase(),
        })
    }

    /// True when no secret key is configured
    pub fn is_simulated(&self) -> bool {
        self.secret_key.is_none()
    }

    /// Lowercase ISO currency code intents are created in
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Create a payment intent for `amount` (major units)
    pub async fn create_payment_intent(
        &self,
        amount: Decimal,
        user_id: Uuid,
    ) -> AppResult<PaymentIntent> {
        let Some(secret_key) = &self.secret_key else {
            let id = format!("{}{}", SIMULATED_INTENT_PREFIX, Uuid::new_v4().simple());
            info!("Simulated payment intent {} for {} ({})", id, amount, user_id);
            return Ok(PaymentIntent {
                client_secret: Some(format!("{}_secret_simulated", id)),
                id,
                amount,
                currency: self.currency.clone(),
                status: STATUS_SUCCEEDED.to_string(),
                simulated: true,
                user_id: Some(user_id),
            });
        };

        let minor = to_minor_units(amount)?.to_string();
        let user = user_id.to_string();
        let response = self
            .http
            .post(format!("{}/payment_intents", self.api_base))
            .bearer_auth(secret_key)
            .form(&[
                ("amount", minor.as_str()),
                ("currency", self.currency.as_str()),
                ("automatic_payment_methods[enabled]", "true"),
                ("metadata[user_id]", user.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Stripe request failed: {}", e)))?;

        let intent = read_intent(response).await?;
        info!("Created payment intent {} for user {}", intent.id, user_id);
        Ok(intent)
    }

    /// Fetch an intent by id. Simulated ids are reported as succeeded.
    pub async fn retrieve_payment_intent(&self, id: &str) -> AppResult<PaymentIntent> {
        let Some(secret_key) = &self.secret_key else {
            return Err(AppError::BusinessLogic(
                "Payments are running in simulation mode".to_string(),
            ));
        };

        if !is_valid_intent_id(id) {
            return Err(AppError::Validation("Invalid payment intent id".to_string()));
        }

        let response = self
            .http
            .get(format!("{}/payment_intents/{}", self.api_base, id))
            .bearer_auth(secret_key)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Stripe request failed: {}", e)))?;

        read_intent(response).await
    }
}

async fn read_intent(response: reqwest::Response) -> AppResult<PaymentIntent> {
    let status = response.status();
    if status.is_success() {
        let intent: StripeIntent = response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("Invalid Stripe response: {}", e)))?;
        return Ok(PaymentIntent {
            id: intent.id,
            client_secret: intent.client_secret,
            amount: from_minor_units(intent.amount),
            currency: intent.currency,
            status: intent.status,
            simulated: false,
            user_id: intent
                .metadata
                .get("user_id")
                .and_then(|u| Uuid::parse_str(u).ok()),
        });
    }

    let message = response
        .json::<StripeErrorBody>()
        .await
        .ok()
        .and_then(|b| b.error.message)
        .unwrap_or_else(|| status.to_string());

    if status == reqwest::StatusCode::NOT_FOUND {
        Err(AppError::NotFound("Payment intent not found".to_string()))
    } else if status.is_client_error() {
        Err(AppError::BusinessLogic(format!("Payment rejected: {}", message)))
    } else {
        Err(AppError::ExternalService(format!("Stripe error: {}", message)))
    }
}

/// Convert major units (12.34) to Stripe's minor units (1234)
pub fn to_minor_units(amount: Decimal) -> AppResult<i64> {
    (amount * Decimal::ONE_HUNDRED)
        .round()
        .to_i64()
        .ok_or_else(|| AppError::InvalidDecimal(format!("Amount out of range: {}", amount)))
}

pub fn from_minor_units(minor: i64) -> Decimal {
    Decimal::new(minor, 2)
}
