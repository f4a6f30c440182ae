use crate::error::{AppError, AppResult};
use crate::models::{CreateOrderRequest, Order, OrderRole, OrderStatus};
use crate::repositories::OrderRepository;
use crate::services::AuditTrailService;
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

/// Purchases and their settlement
pub struct OrderService {
    order_repo: Arc<OrderRepository>,
    audit: Arc<AuditTrailService>,
}

impl OrderService {
    pub fn new(order_repo: Arc<OrderRepository>, audit: Arc<AuditTrailService>) -> Self {
        Self { order_repo, audit }
    }

    /// Buy a listing with wallet funds
    pub async fn purchase(&self, buyer_id: Uuid, request: CreateOrderRequest) -> AppResult<Order> {
        let order = self
            .order_repo
            .create_purchase(buyer_id, request.listing_id)
            .await?;
        self.record_audit(&order, buyer_id).await;
        Ok(order)
    }

    pub async fn list(&self, user_id: Uuid, role: OrderRole) -> AppResult<Vec<Order>> {
        Ok(self.order_repo.list_for_user(user_id, role).await?)
    }

    /// Visible to its buyer and seller only
    pub async fn get(&self, user_id: Uuid, order_id: Uuid) -> AppResult<Order> {
        let order = self
            .order_repo
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

        if order.party_of(user_id).is_none() {
            return Err(AppError::Forbidden(
                "You are not a party to this order".to_string(),
            ));
        }
        Ok(order)
    }

    pub async fn update_status(
        &self,
        user_id: Uuid,
        order_id: Uuid,
        status: OrderStatus,
    ) -> AppResult<Order> {
        let order = self.order_repo.transition(order_id, user_id, status).await?;
        self.record_audit(&order, user_id).await;
        Ok(order)
    }

    async fn record_audit(&self, order: &Order, actor: Uuid) {
        if let Err(e) = self.audit.log_order(order, actor).await {
            error!("Failed to audit order {}: {}", order.id, e);
        }
    }
}
