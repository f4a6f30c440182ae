use crate::error::{AppError, AppResult};
use crate::models::{
    CreateListingRequest, Listing, ListingFilter, ListingPage, ListingQuery, UpdateListingRequest,
};
use crate::repositories::ListingRepository;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Service for browsing and managing listings
pub struct ListingService {
    listing_repo: Arc<ListingRepository>,
}

impl ListingService {
    pub fn new(listing_repo: Arc<ListingRepository>) -> Self {
        Self { listing_repo }
    }

    /// Filtered, sorted, paginated listings
    pub async fn search(&self, query: ListingQuery) -> AppResult<ListingPage> {
        let filter = ListingFilter::try_from(query).map_err(AppError::Validation)?;
        let (items, total) = self.listing_repo.search(&filter).await?;
        Ok(ListingPage::new(items, total, &filter))
    }

    /// Fetch a listing and count the view
    pub async fn view(&self, id: Uuid) -> AppResult<Listing> {
        if !self.listing_repo.increment_views(id).await? {
            return Err(AppError::NotFound("Listing not found".to_string()));
        }
        self.get(id).await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Listing> {
        self.listing_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Listing not found".to_string()))
    }

    pub async fn create(&self, seller_id: Uuid, request: CreateListingRequest) -> AppResult<Listing> {
        let request = request.normalized().map_err(AppError::Validation)?;
        let listing = self.listing_repo.create(seller_id, &request).await?;

        info!(
            "Listing {} created by {}: {} at {}",
            listing.id, seller_id, listing.title, listing.price
        );
        Ok(listing)
    }

    pub async fn update(
        &self,
        actor: Uuid,
        id: Uuid,
        request: UpdateListingRequest,
    ) -> AppResult<Listing> {
        let request = request.normalized().map_err(AppError::Validation)?;
        self.ensure_owner(actor, id).await?;

        let listing = self.listing_repo.update(id, &request).await?;
        info!("Listing {} updated to version {}", id, listing.version);
        Ok(listing)
    }

    pub async fn delete(&self, actor: Uuid, id: Uuid) -> AppResult<()> {
        self.ensure_owner(actor, id).await?;
        self.listing_repo.delete(id).await?;
        info!("Listing {} deleted by {}", id, actor);
        Ok(())
    }

    /// All listings of a seller, any status
    pub async fn seller_listings(&self, seller_id: Uuid) -> AppResult<Vec<Listing>> {
        Ok(self.listing_repo.find_by_seller(seller_id).await?)
    }

    async fn ensure_owner(&self, actor: Uuid, id: Uuid) -> AppResult<Listing> {
        let listing = self.get(id).await?;
        if listing.seller_id != actor {
            return Err(AppError::Forbidden(
                "You can only modify your own listings".to_string(),
            ));
        }
        Ok(listing)
    }
}
