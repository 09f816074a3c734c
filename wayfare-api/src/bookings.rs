use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;
use wayfare_booking::{Booking, BookingStatus, BookingStatusPatch, MonthlyRevenue, TourPopularity};

use crate::error::AppError;
use crate::middleware::Claims;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub tour_id: Uuid,
    pub start_date: String,
    pub number_of_people: u32,
}

#[derive(Debug, Deserialize)]
pub struct ListBookingsQuery {
    pub status: Option<BookingStatus>,
}

#[derive(Debug, Deserialize)]
pub struct RevenueQuery {
    pub year: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct PopularQuery {
    pub limit: Option<usize>,
}

pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", post(create_booking))
        .route("/v1/bookings/mine", get(list_my_bookings))
        .route("/v1/bookings/{id}", get(get_booking))
        .route("/v1/bookings/{id}/cancel", patch(cancel_booking))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", get(list_bookings))
        .route("/v1/bookings/{id}", patch(update_booking))
        .route("/v1/bookings/stats/revenue", get(revenue_stats))
        .route("/v1/bookings/stats/popular", get(popular_tours))
}

/// POST /v1/bookings
async fn create_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let booking = state
        .bookings
        .create_booking(req.tour_id, &claims.sub, &req.start_date, req.number_of_people)
        .await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// GET /v1/bookings/mine
async fn list_my_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let bookings = state.bookings.list_my_bookings(&claims.sub).await?;
    Ok(Json(bookings))
}

/// GET /v1/bookings/{id} (owner or admin)
async fn get_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    let booking = state
        .bookings
        .get_booking(id, &claims.sub, claims.is_admin())
        .await?;
    Ok(Json(booking))
}

/// PATCH /v1/bookings/{id}/cancel
async fn cancel_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    let booking = state.bookings.cancel_own_booking(id, &claims.sub).await?;
    Ok(Json(booking))
}

/// GET /v1/bookings?status=
async fn list_bookings(
    State(state): State<AppState>,
    Query(query): Query<ListBookingsQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let bookings = state.bookings.list_bookings(query.status).await?;
    Ok(Json(bookings))
}

/// PATCH /v1/bookings/{id}
async fn update_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<BookingStatusPatch>,
) -> Result<Json<Booking>, AppError> {
    let booking = state.bookings.update_booking_status(id, patch).await?;
    Ok(Json(booking))
}

/// GET /v1/bookings/stats/revenue?year=
async fn revenue_stats(
    State(state): State<AppState>,
    Query(query): Query<RevenueQuery>,
) -> Result<Json<Vec<MonthlyRevenue>>, AppError> {
    let report = state.bookings.revenue_stats(query.year).await?;
    Ok(Json(report))
}

/// GET /v1/bookings/stats/popular?limit=
async fn popular_tours(
    State(state): State<AppState>,
    Query(query): Query<PopularQuery>,
) -> Result<Json<Vec<TourPopularity>>, AppError> {
    let report = state
        .bookings
        .popular_tours(query.limit.unwrap_or(5))
        .await?;
    Ok(Json(report))
}
