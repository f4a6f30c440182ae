use crate::error::{AppError, AppResult};
use crate::models::{slugify, Category, CreateCategoryRequest};
use crate::repositories::{CategoryRepository, UserRepository};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub struct CategoryService {
    category_repo: Arc<CategoryRepository>,
    user_repo: Arc<UserRepository>,
}

impl CategoryService {
    pub fn new(category_repo: Arc<CategoryRepository>, user_repo: Arc<UserRepository>) -> Self {
        Self {
            category_repo,
            user_repo,
        }
    }

    pub async fn list(&self) -> AppResult<Vec<Category>> {
        Ok(self.category_repo.list().await?)
    }

    pub async fn get(&self, slug: &str) -> AppResult<Category> {
        self.category_repo
            .find_by_slug(&slug.to_lowercase())
            .await?
            .ok_or_else(|| AppError::NotFound("Category not found".to_string()))
    }

    /// Admins only. The slug is derived from the name unless given.
    pub async fn create(&self, actor: Uuid, request: CreateCategoryRequest) -> AppResult<Category> {
        let is_admin = self
            .user_repo
            .find_by_id(actor)
            .await?
            .map_or(false, |u| u.is_admin);
        if !is_admin {
            return Err(AppError::Forbidden(
                "Only administrators can create categories".to_string(),
            ));
        }

        let name = request.name.trim();
        if name.is_empty() || name.chars().count() > 60 {
            return Err(AppError::Validation(
                "Category name must be between 1 and 60 characters".to_string(),
            ));
        }

        let slug = slugify(request.slug.as_deref().unwrap_or(name));
        if slug.is_empty() {
            return Err(AppError::Validation(
                "Category slug must contain letters or digits".to_string(),
            ));
        }

        let category = self.category_repo.create(&request, &slug).await?;
        info!("Created category {} ({})", category.name, category.slug);
        Ok(category)
    }
}
