use crate::models::user::reject_nul;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Buyer's review of a seller, tied to one completed order
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Review {
    pub id: Uuid,
    pub reviewer_id: Uuid,
    pub reviewer_username: String,
    pub seller_id: Uuid,
    pub listing_id: Option<Uuid>,
    pub order_id: Uuid,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Aggregate rating of a seller
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct RatingSummary {
    pub average_rating: Option<f64>,
    pub review_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SellerReviews {
    #[serde(flatten)]
    pub summary: RatingSummary,
    pub reviews: Vec<Review>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateReviewRequest {
    pub order_id: Uuid,
    pub rating: i16,
    pub comment: Option<String>,
}

impl CreateReviewRequest {
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=5).contains(&self.rating) {
            return Err("Rating must be between 1 and 5".to_string());
        }
        reject_nul(self.comment.as_deref().unwrap_or_default(), "Comment")?;
        if self
            .comment
            .as_ref()
            .map_or(false, |c| c.chars().count() > 1000)
        {
            return Err("Comment cannot exceed 1000 characters".to_string());
        }
        Ok(())
    }
}
