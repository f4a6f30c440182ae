use crate::auth::{hash_password, issue_token, verify_password, JwtKeys};
use crate::error::{AppError, AppResult};
use crate::models::{AuthResponse, LoginRequest, RegisterRequest, User};
use crate::repositories::UserRepository;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Registration, login and session lookup
pub struct AuthService {
    user_repo: Arc<UserRepository>,
    keys: JwtKeys,
}

impl AuthService {
    pub fn new(user_repo: Arc<UserRepository>, keys: JwtKeys) -> Self {
        Self { user_repo, keys }
    }

    /// Create an account and sign it in
    pub async fn register(&self, request: RegisterRequest) -> AppResult<AuthResponse> {
        let request = request.normalized().map_err(AppError::Validation)?;
        let password_hash = hash_password(&request.password)?;

        let user = self.user_repo.create(&request, &password_hash).await?;
        let token = issue_token(user.id, &user.username, &self.keys)?;

        info!("Registered user {} ({})", user.username, user.id);
        Ok(AuthResponse { user, token })
    }

    /// Unknown users and wrong passwords get the same answer
    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        let login = request.username.trim();
        if login.is_empty() || request.password.is_empty() {
            return Err(AppError::Validation(
                "Username and password are required".to_string(),
            ));
        }

        let user = self.user_repo.find_by_login(login).await?;
        let user = match user {
            Some(user) if verify_password(&user.password_hash, &request.password) => user,
            _ => {
                warn!("Failed login attempt for {}", login);
                return Err(AppError::Unauthorized("Invalid credentials".to_string()));
            }
        };

        let token = issue_token(user.id, &user.username, &self.keys)?;
        info!("User {} logged in", user.id);
        Ok(AuthResponse { user, token })
    }

    /// The account behind a session; a token for a deleted account is rejected
    pub async fn current_user(&self, user_id: Uuid) -> AppResult<User> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Account no longer exists".to_string()))
    }
}
