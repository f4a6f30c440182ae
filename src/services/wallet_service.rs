use crate::error::{AppError, AppResult};
use crate::models::wallet::validate_wallet_amount;
use crate::models::{
    DepositRequest, LedgerEntry, TransactionType, WalletSummary, WalletTransaction,
    WithdrawRequest,
};
use crate::payments::{PaymentIntent, StripeClient};
use crate::repositories::WalletRepository;
use crate::services::AuditTrailService;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Transactions shown with the wallet summary
pub const SUMMARY_TRANSACTIONS: i64 = 20;
pub const DEFAULT_TRANSACTION_LIMIT: i64 = 50;
pub const MAX_TRANSACTION_LIMIT: i64 = 100;

/// Result of a deposit call
#[derive(Debug, Clone)]
pub struct DepositOutcome {
    pub transaction: WalletTransaction,
    /// False when the payment reference had already been credited
    pub created: bool,
}

/// Service for wallet top-ups, withdrawals and history
pub struct WalletService {
    wallet_repo: Arc<WalletRepository>,
    stripe: Arc<StripeClient>,
    audit: Arc<AuditTrailService>,
}

impl WalletService {
    pub fn new(
        wallet_repo: Arc<WalletRepository>,
        stripe: Arc<StripeClient>,
        audit: Arc<AuditTrailService>,
    ) -> Self {
        Self {
            wallet_repo,
            stripe,
            audit,
        }
    }

    pub async fn summary(&self, user_id: Uuid) -> AppResult<WalletSummary> {
        let balance = self
            .wallet_repo
            .balance(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        let transactions = self
            .wallet_repo
            .transactions(user_id, SUMMARY_TRANSACTIONS)
            .await?;

        Ok(WalletSummary {
            balance,
            transactions,
        })
    }

    pub async fn transactions(
        &self,
        user_id: Uuid,
        limit: Option<i64>,
    ) -> AppResult<Vec<WalletTransaction>> {
        let limit = clamp_limit(limit);
        Ok(self.wallet_repo.transactions(user_id, limit).await?)
    }

    /// Start a top-up with the payment provider
    pub async fn create_payment_intent(
        &self,
        user_id: Uuid,
        amount: Decimal,
    ) -> AppResult<PaymentIntent> {
        validate_wallet_amount(amount).map_err(AppError::Validation)?;
        self.stripe.create_payment_intent(amount, user_id).await
    }

    /// Credit a completed payment.
    ///
    /// The payment intent id is the ledger reference, so replaying it
    /// returns the original transaction instead of crediting twice.
    pub async fn deposit(&self, user_id: Uuid, request: DepositRequest) -> AppResult<DepositOutcome> {
        validate_wallet_amount(request.amount).map_err(AppError::Validation)?;

        let intent_id = request
            .payment_intent_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());

        let reference = if self.stripe.is_simulated() {
            warn!("Simulated deposit of {} for user {}", request.amount, user_id);
            intent_id.unwrap_or_else(|| format!("sim_{}", Uuid::new_v4()))
        } else {
            let intent_id = intent_id.ok_or_else(|| {
                AppError::Validation("payment_intent_id is required".to_string())
            })?;
            let intent = self.stripe.retrieve_payment_intent(&intent_id).await?;
            if intent.user_id != Some(user_id) {
                warn!(
                    "User {} tried to deposit payment intent {} created for {:?}",
                    user_id, intent.id, intent.user_id
                );
                return Err(AppError::Forbidden(
                    "Payment intent belongs to another account".to_string(),
                ));
            }
            if !intent.currency.eq_ignore_ascii_case(self.stripe.currency()) {
                return Err(AppError::Validation(format!(
                    "Payment currency {} does not match the wallet currency {}",
                    intent.currency,
                    self.stripe.currency()
                )));
            }
            if !intent.is_succeeded() {
                return Err(AppError::BusinessLogic(format!(
                    "Payment has not succeeded (status: {})",
                    intent.status
                )));
            }
            if intent.amount != request.amount {
                return Err(AppError::Validation(format!(
                    "Deposit amount {} does not match the payment amount {}",
                    request.amount, intent.amount
                )));
            }
            intent.id
        };

        let entry = LedgerEntry {
            user_id,
            amount: request.amount,
            tx_type: TransactionType::Deposit,
            reference: Some(&reference),
            order_id: None,
            description: Some("Wallet top-up"),
        };
        let (transaction, created) = self.wallet_repo.record_deposit(&entry).await?;

        if transaction.user_id != user_id {
            return Err(AppError::Conflict(
                "Payment reference has already been used".to_string(),
            ));
        }

        if created {
            info!(
                "Deposit {} credited {} to user {}",
                transaction.id, transaction.amount, user_id
            );
            self.record_audit(&transaction).await;
        } else {
            info!("Deposit reference {} replayed; not credited again", reference);
        }

        Ok(DepositOutcome {
            transaction,
            created,
        })
    }

    pub async fn withdraw(&self, user_id: Uuid, request: WithdrawRequest) -> AppResult<WalletTransaction> {
        validate_wallet_amount(request.amount).map_err(AppError::Validation)?;

        let entry = LedgerEntry {
            user_id,
            amount: request.amount,
            tx_type: TransactionType::Withdrawal,
            reference: None,
            order_id: None,
            description: Some("Withdrawal"),
        };
        let transaction = self.wallet_repo.debit(&entry).await?;

        info!(
            "Withdrawal {} of {} for user {}",
            transaction.id, transaction.amount, user_id
        );
        self.record_audit(&transaction).await;
        Ok(transaction)
    }

    /// The money has already moved; a failed audit write is logged, not returned
    async fn record_audit(&self, transaction: &WalletTransaction) {
        if let Err(e) = self.audit.log_wallet_transaction(transaction).await {
            error!("Failed to audit transaction {}: {}", transaction.id, e);
        }
    }
}

fn clamp_limit(limit: Option<i64>) -> i64 {
    limit
        .unwrap_or(DEFAULT_TRANSACTION_LIMIT)
        .clamp(1, MAX_TRANSACTION_LIMIT)
}
