//! HTTP routes under `/api`
//!
//! Handlers stay thin: extract, call a service, pick the status code.

pub mod auth;
pub mod categories;
pub mod chat;
pub mod favorites;
pub mod listings;
pub mod messages;
pub mod orders;
pub mod reviews;
pub mod users;
pub mod wallet;

use crate::error::AppError;
use crate::AppState;
use actix_web::{error, web, HttpRequest, HttpResponse};
use serde_json::json;
use tracing::warn;

/// Register every route and the extractor error handlers
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .app_data(web::QueryConfig::default().error_handler(query_error))
        .app_data(web::PathConfig::default().error_handler(path_error))
        .service(
            web::scope("/api")
                .route("/health", web::get().to(health))
                .configure(auth::configure)
                .configure(users::configure)
                .configure(categories::configure)
                .configure(listings::configure)
                .configure(favorites::configure)
                .configure(messages::configure)
                .configure(reviews::configure)
                .configure(wallet::configure)
                .configure(orders::configure)
                .configure(chat::configure),
        );
}

fn json_error(err: error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::Validation(format!("Invalid request body: {}", err)).into()
}

fn query_error(err: error::QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::Validation(format!("Invalid query string: {}", err)).into()
}

fn path_error(err: error::PathError, _req: &HttpRequest) -> actix_web::Error {
    AppError::Validation(format!("Invalid path parameter: {}", err)).into()
}

/// Liveness plus a database probe; 200 either way
async fn health(state: web::Data<AppState>) -> HttpResponse {
    let database = match state.database.ping().await {
        Ok(()) => "up",
        Err(e) => {
            warn!("Health check: database unreachable: {}", e);
            "down"
        }
    };

    HttpResponse::Ok().json(json!({ "status": "ok", "database": database }))
}
