use axum::{
    extract::{Path, Query, State},
    response::Redirect,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use uuid::Uuid;
use wayfare_core::payment::{GatewayKind, PaymentInitiation};
use wayfare_payment::{params_from_json, CallbackOutcome, PaymentSheet, PaymentStatusView};

use crate::error::AppError;
use crate::middleware::Claims;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProcessPaymentRequest {
    pub gateway: GatewayKind,
}

pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/payments/{booking_id}", get(get_payment))
        .route("/v1/payments/{booking_id}/process", post(process_payment))
        .route("/v1/payments/{booking_id}/status", get(payment_status))
}

/// Unauthenticated gateway callbacks: browser returns redirect to the
/// frontend, the server-to-server notify answers with a JSON ack.
pub fn callback_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/payments/wallet/return",
            get(wallet_return).post(wallet_return_post),
        )
        .route("/v1/payments/wallet/notify", post(wallet_notify))
        .route("/v1/payments/bank/return", get(bank_return))
}

/// GET /v1/payments/{booking_id}
async fn get_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<PaymentSheet>, AppError> {
    let sheet = state.payments.get_payment(booking_id, &claims.sub).await?;
    Ok(Json(sheet))
}

/// POST /v1/payments/{booking_id}/process
async fn process_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
    Json(req): Json<ProcessPaymentRequest>,
) -> Result<Json<PaymentInitiation>, AppError> {
    let initiation = state
        .payments
        .initiate_payment(booking_id, &claims.sub, req.gateway)
        .await?;
    Ok(Json(initiation))
}

/// GET /v1/payments/{booking_id}/status
async fn payment_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<PaymentStatusView>, AppError> {
    let view = state
        .payments
        .get_payment_status(booking_id, &claims.sub)
        .await?;
    Ok(Json(view))
}

/// GET /v1/payments/wallet/return
async fn wallet_return(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Redirect, AppError> {
    let outcome = state
        .payments
        .handle_callback(GatewayKind::Wallet, &params)
        .await?;
    Ok(redirect_for(&state, &outcome))
}

/// POST /v1/payments/wallet/return
async fn wallet_return_post(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Redirect, AppError> {
    let params = params_from_json(&body);
    let outcome = state
        .payments
        .handle_callback(GatewayKind::Wallet, &params)
        .await?;
    Ok(redirect_for(&state, &outcome))
}

/// POST /v1/payments/wallet/notify
///
/// Always acknowledged with 200 so the gateway stops retrying; the
/// business outcome rides inside the body.
async fn wallet_notify(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let params = params_from_json(&body);
    let outcome = state
        .payments
        .handle_callback(GatewayKind::Wallet, &params)
        .await?;
    Ok(Json(json!({
        "received": true,
        "success": outcome.success,
        "message": outcome.message,
    })))
}

/// GET /v1/payments/bank/return
async fn bank_return(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Redirect, AppError> {
    let outcome = state
        .payments
        .handle_callback(GatewayKind::Bank, &params)
        .await?;
    Ok(redirect_for(&state, &outcome))
}

/// 303 to the frontend's payment result pages.
fn redirect_for(state: &AppState, outcome: &CallbackOutcome) -> Redirect {
    if outcome.success {
        let booking = outcome
            .booking_id
            .map(|id| id.to_string())
            .unwrap_or_default();
        Redirect::to(&format!(
            "{}/payment/success?booking={}",
            state.frontend_base_url, booking
        ))
    } else {
        Redirect::to(&format!(
            "{}/payment/failure?message={}",
            state.frontend_base_url,
            urlencoding::encode(&outcome.message)
        ))
    }
}
