use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;
use wayfare_catalog::{Tour, TourChanges, TourDraft};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TourListQuery {
    pub destination: Option<String>,
}

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/tours", get(list_tours))
        .route("/v1/tours/{id}", get(get_tour))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/tours", post(create_tour))
        .route("/v1/tours/{id}", patch(update_tour).delete(delete_tour))
        .route("/v1/tours/{id}/restore", patch(restore_tour))
}

/// GET /v1/tours?destination=
async fn list_tours(
    State(state): State<AppState>,
    Query(query): Query<TourListQuery>,
) -> Result<Json<Vec<Tour>>, AppError> {
    let tours = state
        .catalog
        .list_tours(query.destination.as_deref())
        .await?;
    Ok(Json(tours))
}

/// GET /v1/tours/{id}
async fn get_tour(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Tour>, AppError> {
    let tour = state.catalog.get_tour(id).await?;
    Ok(Json(tour))
}

/// POST /v1/tours
async fn create_tour(
    State(state): State<AppState>,
    Json(draft): Json<TourDraft>,
) -> Result<(StatusCode, Json<Tour>), AppError> {
    let tour = state.catalog.create_tour(draft).await?;
    Ok((StatusCode::CREATED, Json(tour)))
}

/// PATCH /v1/tours/{id}
async fn update_tour(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(changes): Json<TourChanges>,
) -> Result<Json<Tour>, AppError> {
    let tour = state.catalog.update_tour(id, changes).await?;
    Ok(Json(tour))
}

/// DELETE /v1/tours/{id}
async fn delete_tour(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.catalog.delete_tour(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /v1/tours/{id}/restore
async fn restore_tour(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Tour>, AppError> {
    let tour = state.catalog.restore_tour(id).await?;
    Ok(Json(tour))
}
