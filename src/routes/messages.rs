use crate::auth::AuthUser;
use crate::error::AppResult;
use crate::models::{SendMessageRequest, ThreadQuery};
use crate::AppState;
use actix_web::{web, HttpResponse};
use serde_json::json;
use uuid::Uuid;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/messages")
            .route("", web::post().to(send))
            .route("/conversations", web::get().to(conversations))
            .route("/unread-count", web::get().to(unread_count))
            .route("/with/{user_id}", web::get().to(thread)),
    );
}

async fn send(
    state: web::Data<AppState>,
    user: AuthUser,
    body: web::Json<SendMessageRequest>,
) -> AppResult<HttpResponse> {
    let message = state
        .message_service
        .send(user.id, body.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(message))
}

async fn conversations(state: web::Data<AppState>, user: AuthUser) -> AppResult<HttpResponse> {
    let conversations = state.message_service.conversations(user.id).await?;
    Ok(HttpResponse::Ok().json(conversations))
}

/// Opening a thread marks the caller's incoming messages in it as read
async fn thread(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    query: web::Query<ThreadQuery>,
) -> AppResult<HttpResponse> {
    let messages = state
        .message_service
        .thread(user.id, path.into_inner(), query.listing_id)
        .await?;
    Ok(HttpResponse::Ok().json(messages))
}

async fn unread_count(state: web::Data<AppState>, user: AuthUser) -> AppResult<HttpResponse> {
    let count = state.message_service.unread_count(user.id).await?;
    Ok(HttpResponse::Ok().json(json!({ "count": count })))
}
