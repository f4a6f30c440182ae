use crate::auth::AuthUser;
use crate::error::AppResult;
use crate::models::{CreateOrderRequest, OrdersQuery, UpdateOrderStatusRequest};
use crate::AppState;
use actix_web::{web, HttpResponse};
use uuid::Uuid;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/orders")
            .route("", web::post().to(purchase))
            .route("", web::get().to(list))
            .route("/{id}", web::get().to(get))
            .route("/{id}/status", web::patch().to(update_status)),
    );
}

async fn purchase(
    state: web::Data<AppState>,
    user: AuthUser,
    body: web::Json<CreateOrderRequest>,
) -> AppResult<HttpResponse> {
    let order = state
        .order_service
        .purchase(user.id, body.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(order))
}

async fn list(
    state: web::Data<AppState>,
    user: AuthUser,
    query: web::Query<OrdersQuery>,
) -> AppResult<HttpResponse> {
    let orders = state.order_service.list(user.id, query.role).await?;
    Ok(HttpResponse::Ok().json(orders))
}

async fn get(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let order = state.order_service.get(user.id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(order))
}

async fn update_status(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<UpdateOrderStatusRequest>,
) -> AppResult<HttpResponse> {
    let order = state
        .order_service
        .update_status(user.id, path.into_inner(), body.status)
        .await?;
    Ok(HttpResponse::Ok().json(order))
}
