use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;
use wayfare_booking::{ExtensionStatus, TourExtension};

use crate::error::AppError;
use crate::middleware::Claims;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ExtensionRequest {
    #[serde(default)]
    pub additional_days: u32,
    #[serde(default)]
    pub additional_people: u32,
}

#[derive(Debug, Default, Deserialize)]
pub struct AdminNote {
    pub admin_note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListExtensionsQuery {
    pub status: Option<ExtensionStatus>,
}

pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings/{id}/extensions", post(request_extension))
        .route("/v1/extensions/mine", get(list_my_extensions))
        .route(
            "/v1/extensions/{id}",
            get(get_extension).delete(cancel_extension),
        )
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/extensions", get(list_extensions))
        .route("/v1/extensions/{id}/approve", patch(approve_extension))
        .route("/v1/extensions/{id}/reject", patch(reject_extension))
}

/// POST /v1/bookings/{id}/extensions
async fn request_extension(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
    Json(req): Json<ExtensionRequest>,
) -> Result<(StatusCode, Json<TourExtension>), AppError> {
    let extension = state
        .extensions
        .request_extension(
            booking_id,
            &claims.sub,
            req.additional_days,
            req.additional_people,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(extension)))
}

/// GET /v1/extensions/mine
async fn list_my_extensions(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<TourExtension>>, AppError> {
    let extensions = state.extensions.list_my_extensions(&claims.sub).await?;
    Ok(Json(extensions))
}

/// GET /v1/extensions/{id} (owner or admin)
async fn get_extension(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<TourExtension>, AppError> {
    let extension = state
        .extensions
        .get_extension(id, &claims.sub, claims.is_admin())
        .await?;
    Ok(Json(extension))
}

/// DELETE /v1/extensions/{id}
async fn cancel_extension(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<TourExtension>, AppError> {
    let extension = state.extensions.cancel_extension(id, &claims.sub).await?;
    Ok(Json(extension))
}

/// GET /v1/extensions?status=
async fn list_extensions(
    State(state): State<AppState>,
    Query(query): Query<ListExtensionsQuery>,
) -> Result<Json<Vec<TourExtension>>, AppError> {
    let extensions = state.extensions.list_extensions(query.status).await?;
    Ok(Json(extensions))
}

/// PATCH /v1/extensions/{id}/approve
async fn approve_extension(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(note): Json<AdminNote>,
) -> Result<Json<TourExtension>, AppError> {
    let extension = state
        .extensions
        .approve_extension(id, note.admin_note)
        .await?;
    Ok(Json(extension))
}

/// PATCH /v1/extensions/{id}/reject
async fn reject_extension(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(note): Json<AdminNote>,
) -> Result<Json<TourExtension>, AppError> {
    let extension = state
        .extensions
        .reject_extension(id, note.admin_note)
        .await?;
    Ok(Json(extension))
}
