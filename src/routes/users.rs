use crate::auth::AuthUser;
use crate::error::AppResult;
use crate::models::UpdateProfileRequest;
use crate::AppState;
use actix_web::{web, HttpResponse};
use uuid::Uuid;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            .route("/me", web::put().to(update_me))
            .route("/{id}", web::get().to(profile))
            .route("/{id}/listings", web::get().to(listings))
            .route("/{id}/reviews", web::get().to(reviews)),
    );
}

async fn update_me(
    state: web::Data<AppState>,
    user: AuthUser,
    body: web::Json<UpdateProfileRequest>,
) -> AppResult<HttpResponse> {
    let updated = state
        .user_service
        .update_profile(user.id, body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(updated))
}

async fn profile(state: web::Data<AppState>, path: web::Path<Uuid>) -> AppResult<HttpResponse> {
    let profile = state.user_service.public_profile(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(profile))
}

async fn listings(state: web::Data<AppState>, path: web::Path<Uuid>) -> AppResult<HttpResponse> {
    let seller_id = path.into_inner();
    state.user_service.ensure_exists(seller_id).await?;

    let listings = state.listing_service.seller_listings(seller_id).await?;
    Ok(HttpResponse::Ok().json(listings))
}

async fn reviews(state: web::Data<AppState>, path: web::Path<Uuid>) -> AppResult<HttpResponse> {
    let reviews = state.review_service.seller_reviews(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(reviews))
}
