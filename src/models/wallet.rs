//! Wallet ledger models

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Largest single deposit or withdrawal
pub const MAX_WALLET_AMOUNT: i64 = 10_000;

/// Transaction types for fund movements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
    Purchase,
    Sale,
    Refund,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdrawal => "withdrawal",
            Self::Purchase => "purchase",
            Self::Sale => "sale",
            Self::Refund => "refund",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "deposit" => Some(Self::Deposit),
            "withdrawal" => Some(Self::Withdrawal),
            "purchase" => Some(Self::Purchase),
            "sale" => Some(Self::Sale),
            "refund" => Some(Self::Refund),
            _ => None,
        }
    }

    /// Whether this movement adds to the balance
    pub fn is_credit(&self) -> bool {
        matches!(self, Self::Deposit | Self::Sale | Self::Refund)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// Ledger row; one per balance change
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct WalletTransaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: Decimal,
    pub transaction_type: String,
    pub status: String,
    pub reference: Option<String>,
    pub order_id: Option<Uuid>,
    pub balance_before: Decimal,
    pub balance_after: Decimal,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
}

impl WalletTransaction {
    pub fn tx_type(&self) -> Option<TransactionType> {
        TransactionType::from_str(&self.transaction_type)
    }

    pub fn is_completed(&self) -> bool {
        self.status == TransactionStatus::Completed.as_str()
    }
}

/// A balance change to apply, before it hits the ledger
#[derive(Debug, Clone)]
pub struct LedgerEntry<'a> {
    pub user_id: Uuid,
    pub amount: Decimal,
    pub tx_type: TransactionType,
    pub reference: Option<&'a str>,
    pub order_id: Option<Uuid>,
    pub description: Option<&'a str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WalletSummary {
    pub balance: Decimal,
    pub transactions: Vec<WalletTransaction>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DepositRequest {
    pub amount: Decimal,
    pub payment_intent_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WithdrawRequest {
    pub amount: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntentRequest {
    pub amount: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionsQuery {
    pub limit: Option<i64>,
}

/// Positive amount with at most two decimal places
pub fn validate_money(amount: Decimal, field: &str) -> Result<(), String> {
    if amount <= Decimal::ZERO {
        return Err(format!("{} must be positive", field));
    }
    if amount.normalize().scale() > 2 {
        return Err(format!("{} cannot have more than 2 decimal places", field));
    }
    Ok(())
}

/// Bounds for a single deposit/withdrawal
pub fn validate_wallet_amount(amount: Decimal) -> Result<(), String> {
    validate_money(amount, "Amount")?;
    if amount > Decimal::from(MAX_WALLET_AMOUNT) {
        return Err(format!("Amount cannot exceed {}", MAX_WALLET_AMOUNT));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_validate_money() {
        assert!(validate_money(Decimal::from_str("0.01").unwrap(), "Amount").is_ok());
        assert!(validate_money(Decimal::from_str("12.50").unwrap(), "Amount").is_ok());
        // Trailing zeros do not count as precision
        assert!(validate_money(Decimal::from_str("12.500").unwrap(), "Amount").is_ok());
        assert!(validate_money(Decimal::from_str("12.505").unwrap(), "Amount").is_err());
        assert!(validate_money(Decimal::ZERO, "Amount").is_err());
        assert!(validate_money(Decimal::from_str("-5").unwrap(), "Amount").is_err());
    }

    #[test]
    fn test_wallet_amount_cap() {
        assert!(validate_wallet_amount(Decimal::from(MAX_WALLET_AMOUNT)).is_ok());
        assert!(validate_wallet_amount(Decimal::from(MAX_WALLET_AMOUNT + 1)).is_err());
    }

    #[test]
    fn test_transaction_type_round_trip_and_direction() {
        for t in [
            TransactionType::Deposit,
            TransactionType::Withdrawal,
            TransactionType::Purchase,
            TransactionType::Sale,
            TransactionType::Refund,
        ] {
            assert_eq!(TransactionType::from_str(t.as_str()), Some(t));
        }
        assert!(TransactionType::Refund.is_credit());
        assert!(!TransactionType::Purchase.is_credit());
        assert_eq!(TransactionType::from_str("transfer"), None);
    }
}
