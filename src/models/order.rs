use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Completed,
    Cancelled,
}

/// Which side of an order the caller is on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderParty {
    Buyer,
    Seller,
}

/// Why a status change was refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// Completed and cancelled orders never change
    AlreadyResolved(OrderStatus),
    /// Target equals current status
    Unchanged,
    /// This party may not perform this transition
    NotPermitted(OrderParty, OrderStatus),
}

impl std::fmt::Display for TransitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransitionError::AlreadyResolved(status) => {
                write!(f, "Order is already {}", status.as_str())
            }
            TransitionError::Unchanged => write!(f, "Order already has that status"),
            TransitionError::NotPermitted(OrderParty::Seller, OrderStatus::Completed) => {
                write!(f, "Only the buyer can confirm an order as completed")
            }
            TransitionError::NotPermitted(_, target) => {
                write!(f, "Not permitted to mark this order {}", target.as_str())
            }
        }
    }
}

impl OrderStatus {
    /// Convert from database string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            _ => Err(format!("Invalid order status: {}", s)),
        }
    }

    /// Convert to database string
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatus::Pending)
    }

    /// Checks `self → target` when requested by `party`.
    ///
    /// Only pending orders move. The buyer alone confirms completion
    /// (receipt of the item); either party may cancel.
    pub fn check_transition(
        &self,
        target: OrderStatus,
        party: OrderParty,
    ) -> Result<(), TransitionError> {
        if self.is_terminal() {
            return Err(TransitionError::AlreadyResolved(*self));
        }
        if *self == target {
            return Err(TransitionError::Unchanged);
        }
        match (target, party) {
            (OrderStatus::Completed, OrderParty::Buyer) => Ok(()),
            (OrderStatus::Cancelled, _) => Ok(()),
            _ => Err(TransitionError::NotPermitted(party, target)),
        }
    }
}

impl From<String> for OrderStatus {
    fn from(s: String) -> Self {
        Self::from_str(&s).unwrap_or(OrderStatus::Pending)
    }
}

/// Order model: a buyer's purchase of one listing, paid from the wallet
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub listing_id: Option<Uuid>,
    pub listing_title: String,
    pub amount: Decimal,
    pub status: String, // Stored as TEXT, use OrderStatus enum for type safety
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub completed_at: Option<NaiveDateTime>,
}

impl Order {
    /// Get status as an enum
    pub fn status_enum(&self) -> OrderStatus {
        OrderStatus::from_str(&self.status).unwrap_or(OrderStatus::Pending)
    }

    /// The caller's side of this order, if any
    pub fn party_of(&self, user_id: Uuid) -> Option<OrderParty> {
        if user_id == self.buyer_id {
            Some(OrderParty::Buyer)
        } else if user_id == self.seller_id {
            Some(OrderParty::Seller)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderRequest {
    pub listing_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

/// `role` filter for order listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderRole {
    Buyer,
    Seller,
    #[default]
    All,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrdersQuery {
    #[serde(default)]
    pub role: OrderRole,
}
