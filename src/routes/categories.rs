use crate::auth::AuthUser;
use crate::error::AppResult;
use crate::models::CreateCategoryRequest;
use crate::AppState;
use actix_web::{web, HttpResponse};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/categories")
            .route("", web::get().to(list))
            .route("", web::post().to(create))
            .route("/{slug}", web::get().to(get)),
    );
}

async fn list(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let categories = state.category_service.list().await?;
    Ok(HttpResponse::Ok().json(categories))
}

async fn get(state: web::Data<AppState>, path: web::Path<String>) -> AppResult<HttpResponse> {
    let category = state.category_service.get(&path).await?;
    Ok(HttpResponse::Ok().json(category))
}

async fn create(
    state: web::Data<AppState>,
    user: AuthUser,
    body: web::Json<CreateCategoryRequest>,
) -> AppResult<HttpResponse> {
    let category = state
        .category_service
        .create(user.id, body.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(category))
}
