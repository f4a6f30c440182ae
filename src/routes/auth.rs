use crate::auth::{removal_cookie, session_cookie, AuthUser};
use crate::error::AppResult;
use crate::models::{LoginRequest, RegisterRequest};
use crate::AppState;
use actix_web::{web, HttpResponse};
use serde_json::json;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/register", web::post().to(register))
            .route("/login", web::post().to(login))
            .route("/logout", web::post().to(logout))
            .route("/me", web::get().to(me)),
    );
}

async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> AppResult<HttpResponse> {
    let response = state.auth_service.register(body.into_inner()).await?;
    let cookie = session_cookie(
        response.token.clone(),
        &state.jwt,
        state.config.auth.secure_cookies,
    );

    Ok(HttpResponse::Created().cookie(cookie).json(response))
}

async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let response = state.auth_service.login(body.into_inner()).await?;
    let cookie = session_cookie(
        response.token.clone(),
        &state.jwt,
        state.config.auth.secure_cookies,
    );

    Ok(HttpResponse::Ok().cookie(cookie).json(response))
}

async fn logout(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok()
        .cookie(removal_cookie(state.config.auth.secure_cookies))
        .json(json!({ "message": "Logged out" }))
}

async fn me(state: web::Data<AppState>, user: AuthUser) -> AppResult<HttpResponse> {
    let current = state.auth_service.current_user(user.id).await?;
    Ok(HttpResponse::Ok().json(current))
}
