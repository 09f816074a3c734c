use crate::models::{Booking, BookingStatus, BookingStatusPatch, MonthlyRevenue, TourPopularity};
use crate::repository::BookingRepository;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;
use wayfare_catalog::TourRepository;
use wayfare_core::{CoreError, CoreResult};
use wayfare_shared::dates;

/// Booking lifecycle over the tour catalog.
pub struct BookingEngine {
    bookings: Arc<dyn BookingRepository>,
    tours: Arc<dyn TourRepository>,
}

impl BookingEngine {
    pub fn new(bookings: Arc<dyn BookingRepository>, tours: Arc<dyn TourRepository>) -> Self {
        Self { bookings, tours }
    }

    /// Create a booking. Checks run in a fixed order and the first failure
    /// wins, so clients see stable error messages.
    pub async fn create_booking(
        &self,
        tour_id: Uuid,
        user_id: &str,
        start_date: &str,
        number_of_people: u32,
    ) -> CoreResult<Booking> {
        // 1. The requested date must parse as a calendar date.
        let start_date = dates::parse_calendar_date(start_date)
            .ok_or_else(|| CoreError::InvalidInput("start date is not a valid date".to_string()))?;

        // 2. No departures in the past.
        if start_date < dates::today_utc() {
            return Err(CoreError::InvalidInput(
                "start date cannot be in the past".to_string(),
            ));
        }

        // 3. The tour must exist and be live.
        let tour = self
            .tours
            .get_tour(tour_id)
            .await
            .map_err(CoreError::storage)?
            .ok_or_else(|| CoreError::NotFound("tour not found".to_string()))?;

        // 4. A tour without departures cannot be booked at all.
        if tour.start_dates.is_empty() {
            return Err(CoreError::InvalidInput(
                "tour has no departure dates".to_string(),
            ));
        }

        // 5. The date must match one of the scheduled departures.
        if !tour.start_dates.contains(&start_date) {
            let scheduled: Vec<String> = tour.start_dates.iter().map(|d| d.to_string()).collect();
            return Err(CoreError::InvalidInput(format!(
                "start date does not match a departure; scheduled dates: {}",
                scheduled.join(", ")
            )));
        }

        // 6. At least one traveller.
        if number_of_people == 0 {
            return Err(CoreError::InvalidInput(
                "number of people must be at least 1".to_string(),
            ));
        }

        // 7. Head count within the tour's capacity.
        if number_of_people > tour.max_group_size {
            return Err(CoreError::InvalidInput(format!(
                "group size exceeds the tour maximum of {}",
                tour.max_group_size
            )));
        }

        let price = tour.price * Decimal::from(number_of_people);
        let booking = Booking::new(
            tour_id,
            user_id.to_string(),
            start_date,
            number_of_people,
            price,
        );
        self.bookings
            .insert_booking(&booking)
            .await
            .map_err(CoreError::storage)?;
        Ok(booking)
    }

    /// Customer-side cancellation. The lookup is filtered by (id, user) in
    /// one query; a miss reads as not found either way, so callers cannot
    /// probe for other users' booking ids.
    pub async fn cancel_own_booking(&self, booking_id: Uuid, user_id: &str) -> CoreResult<Booking> {
        let mut booking = self
            .bookings
            .find_for_user(booking_id, user_id)
            .await
            .map_err(CoreError::storage)?
            .ok_or_else(|| CoreError::NotFound("booking not found".to_string()))?;

        match booking.status {
            BookingStatus::Cancelled => {
                return Err(CoreError::InvalidState(
                    "booking is already cancelled".to_string(),
                ));
            }
            BookingStatus::Completed => {
                return Err(CoreError::InvalidState(
                    "a completed booking cannot be cancelled".to_string(),
                ));
            }
            _ => {}
        }

        booking.status = BookingStatus::Cancelled;
        self.bookings
            .update_booking(&booking)
            .await
            .map_err(CoreError::storage)?;
        Ok(booking)
    }

    /// Admin patch of status and/or paid. The only guarded transition is
    /// into completed, which requires the booking to end up paid.
    pub async fn update_booking_status(
        &self,
        booking_id: Uuid,
        patch: BookingStatusPatch,
    ) -> CoreResult<Booking> {
        let mut booking = self
            .bookings
            .get_booking(booking_id)
            .await
            .map_err(CoreError::storage)?
            .ok_or_else(|| CoreError::NotFound("booking not found".to_string()))?;

        if patch.status.is_none() && patch.paid.is_none() {
            return Err(CoreError::InvalidInput(
                "provide a status or a paid flag to update".to_string(),
            ));
        }

        if patch.status == Some(BookingStatus::Completed) {
            let will_be_paid = patch.paid.unwrap_or(booking.paid);
            if !will_be_paid {
                return Err(CoreError::InvalidState(
                    "a booking must be paid before it can be completed".to_string(),
                ));
            }
        }

        if let Some(status) = patch.status {
            booking.status = status;
        }
        if let Some(paid) = patch.paid {
            booking.paid = paid;
        }

        self.bookings
            .update_booking(&booking)
            .await
            .map_err(CoreError::storage)?;
        Ok(booking)
    }

    /// Owner-or-admin read; owner misses fold into not found.
    pub async fn get_booking(
        &self,
        booking_id: Uuid,
        user_id: &str,
        is_admin: bool,
    ) -> CoreResult<Booking> {
        let booking = if is_admin {
            self.bookings
                .get_booking(booking_id)
                .await
                .map_err(CoreError::storage)?
        } else {
            self.bookings
                .find_for_user(booking_id, user_id)
                .await
                .map_err(CoreError::storage)?
        };
        booking.ok_or_else(|| CoreError::NotFound("booking not found".to_string()))
    }

    pub async fn list_my_bookings(&self, user_id: &str) -> CoreResult<Vec<Booking>> {
        self.bookings
            .list_for_user(user_id)
            .await
            .map_err(CoreError::storage)
    }

    pub async fn list_bookings(&self, status: Option<BookingStatus>) -> CoreResult<Vec<Booking>> {
        self.bookings
            .list_bookings(status)
            .await
            .map_err(CoreError::storage)
    }

    /// Monthly revenue over completed bookings, optionally restricted to
    /// one calendar year of `created_at`.
    pub async fn revenue_stats(&self, year: Option<i32>) -> CoreResult<Vec<MonthlyRevenue>> {
        self.bookings
            .revenue_by_month(year)
            .await
            .map_err(CoreError::storage)
    }

    /// Most-booked tours by completed-booking count.
    pub async fn popular_tours(&self, limit: usize) -> CoreResult<Vec<TourPopularity>> {
        self.bookings
            .popular_tours(limit)
            .await
            .map_err(CoreError::storage)
    }
}
