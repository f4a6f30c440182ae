use crate::auth::AuthUser;
use crate::error::AppResult;
use crate::models::{DepositRequest, PaymentIntentRequest, TransactionsQuery, WithdrawRequest};
use crate::AppState;
use actix_web::{web, HttpResponse};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/wallet")
            .route("", web::get().to(summary))
            .route("/transactions", web::get().to(transactions))
            .route("/payment-intent", web::post().to(payment_intent))
            .route("/deposit", web::post().to(deposit))
            .route("/withdraw", web::post().to(withdraw)),
    );
}

async fn summary(state: web::Data<AppState>, user: AuthUser) -> AppResult<HttpResponse> {
    let summary = state.wallet_service.summary(user.id).await?;
    Ok(HttpResponse::Ok().json(summary))
}

async fn transactions(
    state: web::Data<AppState>,
    user: AuthUser,
    query: web::Query<TransactionsQuery>,
) -> AppResult<HttpResponse> {
    let transactions = state
        .wallet_service
        .transactions(user.id, query.limit)
        .await?;
    Ok(HttpResponse::Ok().json(transactions))
}

async fn payment_intent(
    state: web::Data<AppState>,
    user: AuthUser,
    body: web::Json<PaymentIntentRequest>,
) -> AppResult<HttpResponse> {
    let intent = state
        .wallet_service
        .create_payment_intent(user.id, body.amount)
        .await?;
    Ok(HttpResponse::Ok().json(intent))
}

/// 201 when credited now, 200 when the payment was already credited
async fn deposit(
    state: web::Data<AppState>,
    user: AuthUser,
    body: web::Json<DepositRequest>,
) -> AppResult<HttpResponse> {
    let outcome = state
        .wallet_service
        .deposit(user.id, body.into_inner())
        .await?;

    Ok(if outcome.created {
        HttpResponse::Created().json(outcome.transaction)
    } else {
        HttpResponse::Ok().json(outcome.transaction)
    })
}

async fn withdraw(
    state: web::Data<AppState>,
    user: AuthUser,
    body: web::Json<WithdrawRequest>,
) -> AppResult<HttpResponse> {
    let transaction = state
        .wallet_service
        .withdraw(user.id, body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(transaction))
}
