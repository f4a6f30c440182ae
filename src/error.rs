use crate::database::DatabaseError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use sqlx::Error as SqlxError;
use thiserror::Error;
use tracing::error;

/// Application-level error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLx database errors
    #[error("SQL error: {0}")]
    Sqlx(SqlxError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Not found errors
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Missing or invalid credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not allowed
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// State conflicts: duplicates, stale versions, illegal transitions
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Business logic errors
    #[error("Business logic error: {0}")]
    BusinessLogic(String),

    /// External service errors
    #[error("External service error: {0}")]
    ExternalService(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// UUID parsing errors
    #[error("Invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    /// Decimal parsing errors
    #[error("Invalid decimal: {0}")]
    InvalidDecimal(String),

    /// Generic error with message
    #[error("{0}")]
    Message(String),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Message safe to show to API clients; internal failures are not echoed back
    pub fn public_message(&self) -> String {
        match self {
            AppError::Validation(msg)
            | AppError::NotFound(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::Conflict(msg)
            | AppError::BusinessLogic(msg)
            | AppError::InvalidDecimal(msg) => msg.clone(),
            AppError::InvalidUuid(e) => format!("Invalid UUID: {}", e),
            AppError::ExternalService(_) => "Upstream service unavailable".to_string(),
            _ => "Internal server error".to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::InvalidUuid(_)
            | AppError::InvalidDecimal(_)
            | AppError::BusinessLogic(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ExternalService(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_)
            | AppError::Sqlx(_)
            | AppError::Config(_)
            | AppError::Serialization(_)
            | AppError::Message(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {:?}", self);
        }
        HttpResponse::build(status).json(serde_json::json!({ "error": self.public_message() }))
    }
}

/// Repository-specific error types
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Database query error
    #[error("Query error: {0}")]
    Query(SqlxError),

    /// Record not found
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Duplicate record
    #[error("Duplicate record: {0}")]
    Duplicate(String),

    /// Constraint violation
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Row changed state underneath the caller (stale version, order already resolved)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Caller is not allowed to act on this record
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Business rule violation (e.g., insufficient balance)
    #[error("Business rule violation: {0}")]
    BusinessRule(String),
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(msg) => AppError::NotFound(msg),
            RepositoryError::Query(e) => AppError::from(e),
            RepositoryError::Duplicate(msg) => AppError::Conflict(msg),
            RepositoryError::ConstraintViolation(msg) => AppError::Validation(msg),
            RepositoryError::InvalidInput(msg) => AppError::Validation(msg),
            RepositoryError::Conflict(msg) => AppError::Conflict(msg),
            RepositoryError::Forbidden(msg) => AppError::Forbidden(msg),
            RepositoryError::BusinessRule(msg) => AppError::BusinessLogic(msg),
        }
    }
}

/// Postgres rejects text containing NUL with this SQLSTATE
const INVALID_TEXT_ENCODING: &str = "22021";

fn is_invalid_text(err: &SqlxError) -> bool {
    matches!(err, SqlxError::Database(db_err) if db_err.code().as_deref() == Some(INVALID_TEXT_ENCODING))
}

impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        if is_invalid_text(&err) {
            AppError::Validation("Text contains invalid characters".to_string())
        } else {
            AppError::Sqlx(err)
        }
    }
}

impl From<SqlxError> for RepositoryError {
    fn from(err: SqlxError) -> Self {
        match &err {
            SqlxError::RowNotFound => RepositoryError::NotFound("Record not found".to_string()),
            SqlxError::Database(db_err) => {
                // Check for common PostgreSQL error codes
                let code = db_err.code().map(|c| c.to_string());
                match code.as_deref() {
                    // Unique violation
                    Some("23505") => RepositoryError::Duplicate(db_err.message().to_string()),
                    // Foreign key violation
                    Some("23503") => {
                        RepositoryError::ConstraintViolation(db_err.message().to_string())
                    }
                    // Check constraint violation
                    Some("23514") => {
                        RepositoryError::ConstraintViolation(db_err.message().to_string())
                    }
                    Some(INVALID_TEXT_ENCODING) => {
                        RepositoryError::InvalidInput("Text contains invalid characters".to_string())
                    }
                    _ => RepositoryError::Query(err),
                }
            }
            _ => RepositoryError::Query(err),
        }
    }
}
