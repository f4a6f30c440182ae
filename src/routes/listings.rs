use crate::auth::AuthUser;
use crate::error::AppResult;
use crate::models::{CreateListingRequest, ListingQuery, UpdateListingRequest};
use crate::AppState;
use actix_web::{web, HttpResponse};
use uuid::Uuid;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/listings")
            .route("", web::get().to(search))
            .route("", web::post().to(create))
            .route("/{id}", web::get().to(view))
            .route("/{id}", web::put().to(update))
            .route("/{id}", web::delete().to(delete)),
    );
}

async fn search(
    state: web::Data<AppState>,
    query: web::Query<ListingQuery>,
) -> AppResult<HttpResponse> {
    let page = state.listing_service.search(query.into_inner()).await?;
    Ok(HttpResponse::Ok().json(page))
}

async fn view(state: web::Data<AppState>, path: web::Path<Uuid>) -> AppResult<HttpResponse> {
    let listing = state.listing_service.view(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(listing))
}

async fn create(
    state: web::Data<AppState>,
    user: AuthUser,
    body: web::Json<CreateListingRequest>,
) -> AppResult<HttpResponse> {
    let listing = state
        .listing_service
        .create(user.id, body.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(listing))
}

async fn update(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<UpdateListingRequest>,
) -> AppResult<HttpResponse> {
    let listing = state
        .listing_service
        .update(user.id, path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(listing))
}

async fn delete(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state
        .listing_service
        .delete(user.id, path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
