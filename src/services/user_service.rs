use crate::error::{AppError, AppResult};
use crate::models::{PublicProfile, UpdateProfileRequest, User};
use crate::repositories::UserRepository;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Profiles
pub struct UserService {
    user_repo: Arc<UserRepository>,
}

impl UserService {
    pub fn new(user_repo: Arc<UserRepository>) -> Self {
        Self { user_repo }
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        request: UpdateProfileRequest,
    ) -> AppResult<User> {
        let request = request.normalized().map_err(AppError::Validation)?;

        let user = self
            .user_repo
            .update_profile(user_id, &request)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        info!("Updated profile of user {}", user_id);
        Ok(user)
    }

    pub async fn public_profile(&self, user_id: Uuid) -> AppResult<PublicProfile> {
        self.user_repo
            .find_public_profile(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// 404 unless the user exists
    pub async fn ensure_exists(&self, user_id: Uuid) -> AppResult<()> {
        if self.user_repo.exists(user_id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound("User not found".to_string()))
        }
    }
}
