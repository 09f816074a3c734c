use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use uuid::Uuid;
use wayfare_catalog::{Review, ReviewChanges, ReviewDraft};

use crate::error::AppError;
use crate::middleware::Claims;
use crate::state::AppState;

pub fn public_routes() -> Router<AppState> {
    Router::new().route("/v1/tours/{id}/reviews", get(list_reviews))
}

pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/tours/{id}/reviews", post(create_review))
        .route("/v1/reviews/{id}", patch(update_review).delete(delete_review))
}

/// GET /v1/tours/{id}/reviews
async fn list_reviews(
    State(state): State<AppState>,
    Path(tour_id): Path<Uuid>,
) -> Result<Json<Vec<Review>>, AppError> {
    let reviews = state.reviews.list_reviews(tour_id).await?;
    Ok(Json(reviews))
}

/// POST /v1/tours/{id}/reviews
async fn create_review(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(tour_id): Path<Uuid>,
    Json(draft): Json<ReviewDraft>,
) -> Result<(StatusCode, Json<Review>), AppError> {
    let review = state
        .reviews
        .create_review(tour_id, &claims.sub, draft)
        .await?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// PATCH /v1/reviews/{id}
async fn update_review(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(changes): Json<ReviewChanges>,
) -> Result<Json<Review>, AppError> {
    let review = state
        .reviews
        .update_review(id, &claims.sub, claims.is_admin(), changes)
        .await?;
    Ok(Json(review))
}

/// DELETE /v1/reviews/{id}
async fn delete_review(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .reviews
        .delete_review(id, &claims.sub, claims.is_admin())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
