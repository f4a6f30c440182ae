use crate::error::{AppError, AppResult};
use crate::models::{FavoriteStatus, Listing};
use crate::repositories::{FavoriteRepository, ListingRepository};
use std::sync::Arc;
use uuid::Uuid;

pub struct FavoriteService {
    favorite_repo: Arc<FavoriteRepository>,
    listing_repo: Arc<ListingRepository>,
}

impl FavoriteService {
    pub fn new(favorite_repo: Arc<FavoriteRepository>, listing_repo: Arc<ListingRepository>) -> Self {
        Self {
            favorite_repo,
            listing_repo,
        }
    }

    /// Idempotent; returns true when the favorite was newly created
    pub async fn add(&self, user_id: Uuid, listing_id: Uuid) -> AppResult<bool> {
        if self.listing_repo.find_by_id(listing_id).await?.is_none() {
            return Err(AppError::NotFound("Listing not found".to_string()));
        }
        Ok(self.favorite_repo.add(user_id, listing_id).await?)
    }

    pub async fn remove(&self, user_id: Uuid, listing_id: Uuid) -> AppResult<()> {
        if !self.favorite_repo.remove(user_id, listing_id).await? {
            return Err(AppError::NotFound("Listing is not in your favorites".to_string()));
        }
        Ok(())
    }

    pub async fn list(&self, user_id: Uuid) -> AppResult<Vec<Listing>> {
        Ok(self.favorite_repo.list(user_id).await?)
    }

    pub async fn status(&self, user_id: Uuid, listing_id: Uuid) -> AppResult<FavoriteStatus> {
        let favorited = self.favorite_repo.is_favorited(user_id, listing_id).await?;
        Ok(FavoriteStatus { favorited })
    }
}
