use crate::auth::AuthUser;
use crate::error::AppResult;
use crate::models::FavoriteStatus;
use crate::AppState;
use actix_web::{web, HttpResponse};
use uuid::Uuid;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/favorites")
            .route("", web::get().to(list))
            .route("/{listing_id}", web::post().to(add))
            .route("/{listing_id}", web::delete().to(remove))
            .route("/{listing_id}/status", web::get().to(status)),
    );
}

async fn list(state: web::Data<AppState>, user: AuthUser) -> AppResult<HttpResponse> {
    let listings = state.favorite_service.list(user.id).await?;
    Ok(HttpResponse::Ok().json(listings))
}

/// 201 on first add, 200 when it was already a favorite
async fn add(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let created = state
        .favorite_service
        .add(user.id, path.into_inner())
        .await?;

    let body = FavoriteStatus { favorited: true };
    Ok(if created {
        HttpResponse::Created().json(body)
    } else {
        HttpResponse::Ok().json(body)
    })
}

async fn remove(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state
        .favorite_service
        .remove(user.id, path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn status(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let status = state
        .favorite_service
        .status(user.id, path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(status))
}
