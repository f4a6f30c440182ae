use crate::auth::AuthUser;
use crate::error::AppResult;
use crate::models::CreateReviewRequest;
use crate::AppState;
use actix_web::{web, HttpResponse};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/reviews", web::post().to(create));
}

async fn create(
    state: web::Data<AppState>,
    user: AuthUser,
    body: web::Json<CreateReviewRequest>,
) -> AppResult<HttpResponse> {
    let review = state
        .review_service
        .create(user.id, body.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(review))
}
