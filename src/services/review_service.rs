use crate::error::{AppError, AppResult};
use crate::models::{CreateReviewRequest, OrderStatus, Review, SellerReviews};
use crate::models::user::trim_optional;
use crate::repositories::{OrderRepository, ReviewRepository, UserRepository};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Seller reviews, written by buyers of completed orders
pub struct ReviewService {
    review_repo: Arc<ReviewRepository>,
    order_repo: Arc<OrderRepository>,
    user_repo: Arc<UserRepository>,
}

impl ReviewService {
    pub fn new(
        review_repo: Arc<ReviewRepository>,
        order_repo: Arc<OrderRepository>,
        user_repo: Arc<UserRepository>,
    ) -> Self {
        Self {
            review_repo,
            order_repo,
            user_repo,
        }
    }

    pub async fn create(&self, reviewer_id: Uuid, request: CreateReviewRequest) -> AppResult<Review> {
        request.validate().map_err(AppError::Validation)?;

        let order = self
            .order_repo
            .find_by_id(request.order_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

        if order.buyer_id != reviewer_id {
            return Err(AppError::Forbidden(
                "Only the buyer can review this order".to_string(),
            ));
        }
        if order.status_enum() != OrderStatus::Completed {
            return Err(AppError::Forbidden(
                "Only completed orders can be reviewed".to_string(),
            ));
        }

        let comment = trim_optional(request.comment);
        let review = self
            .review_repo
            .create(&order, request.rating, comment.as_deref())
            .await?;

        info!(
            "Review {} of seller {} ({} stars)",
            review.id, review.seller_id, review.rating
        );
        Ok(review)
    }

    /// Reviews of a seller, newest first, with the rating summary
    pub async fn seller_reviews(&self, seller_id: Uuid) -> AppResult<SellerReviews> {
        if !self.user_repo.exists(seller_id).await? {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        let summary = self.review_repo.summary(seller_id).await?;
        let reviews = self.review_repo.find_by_seller(seller_id).await?;
        Ok(SellerReviews { summary, reviews })
    }
}
