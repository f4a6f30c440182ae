use crate::auth::AuthUser;
use crate::error::AppResult;
use crate::models::ChatRequest;
use crate::AppState;
use actix_web::{web, HttpResponse};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/chat")
            .route("", web::post().to(ask))
            .route("/history", web::get().to(history)),
    );
}

/// Open to everyone; only signed-in exchanges are stored
async fn ask(
    state: web::Data<AppState>,
    user: Option<AuthUser>,
    body: web::Json<ChatRequest>,
) -> AppResult<HttpResponse> {
    let reply = state
        .chat_service
        .respond(user.map(|u| u.id), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(reply))
}

async fn history(state: web::Data<AppState>, user: AuthUser) -> AppResult<HttpResponse> {
    let messages = state.chat_service.history(user.id).await?;
    Ok(HttpResponse::Ok().json(messages))
}
