use crate::models::{
    Booking, ExtensionSnapshot, ExtensionStatus, SnapshotStatus, TourExtension,
};
use crate::repository::{BookingRepository, ExtensionRepository};
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;
use wayfare_catalog::TourRepository;
use wayfare_core::{CoreError, CoreResult};
use wayfare_shared::round2;

/// Per-day and per-person rates derived from the tour sheet, and the price
/// of the requested extension.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionQuote {
    pub price_per_day: Decimal,
    pub price_per_person: Decimal,
    pub extension_price: Decimal,
}

/// Price an extension request. Every component is rounded to two decimal
/// places on its own, then the combination is rounded again, so quoted
/// figures always match what a client can recompute from the tour sheet.
pub fn quote_extension(
    tour_price: Decimal,
    duration_days: u32,
    max_group_size: u32,
    additional_days: u32,
    additional_people: u32,
) -> ExtensionQuote {
    let price_per_day = round2(tour_price / Decimal::from(duration_days));
    let price_per_person = round2(tour_price / Decimal::from(max_group_size));
    let extension_price = round2(
        price_per_day * Decimal::from(additional_days)
            + price_per_person * Decimal::from(additional_people),
    );
    ExtensionQuote {
        price_per_day,
        price_per_person,
        extension_price,
    }
}

/// Extension requests and their admin review. The TourExtension record is
/// authoritative; every transition also writes a snapshot onto the booking
/// so booking reads stay single-lookup.
pub struct ExtensionWorkflow {
    extensions: Arc<dyn ExtensionRepository>,
    bookings: Arc<dyn BookingRepository>,
    tours: Arc<dyn TourRepository>,
}

impl ExtensionWorkflow {
    pub fn new(
        extensions: Arc<dyn ExtensionRepository>,
        bookings: Arc<dyn BookingRepository>,
        tours: Arc<dyn TourRepository>,
    ) -> Self {
        Self {
            extensions,
            bookings,
            tours,
        }
    }

    /// Customer requests extra days and/or extra people on a booking.
    pub async fn request_extension(
        &self,
        booking_id: Uuid,
        user_id: &str,
        additional_days: u32,
        additional_people: u32,
    ) -> CoreResult<TourExtension> {
        // 1. An empty request is meaningless.
        if additional_days == 0 && additional_people == 0 {
            return Err(CoreError::InvalidInput(
                "provide at least one additional day or person".to_string(),
            ));
        }

        // 2. The booking must exist and belong to the caller.
        let mut booking = self
            .bookings
            .get_booking(booking_id)
            .await
            .map_err(CoreError::storage)?
            .ok_or_else(|| CoreError::NotFound("booking not found".to_string()))?;
        if booking.user_id != user_id {
            return Err(CoreError::Forbidden(
                "you can only extend your own booking".to_string(),
            ));
        }

        // 3. The tour sheet drives the rates. Soft-deleted tours still
        //    resolve so old bookings stay extendable.
        let tour = self
            .tours
            .resolve_tour(booking.tour_id)
            .await
            .map_err(CoreError::storage)?
            .ok_or_else(|| CoreError::NotFound("tour not found".to_string()))?;

        // 4. One outstanding request per booking.
        let pending = self
            .extensions
            .find_pending_for_booking(booking_id)
            .await
            .map_err(CoreError::storage)?;
        if pending.is_some() {
            return Err(CoreError::InvalidState(
                "an extension request is already pending for this booking".to_string(),
            ));
        }

        let quote = quote_extension(
            tour.price,
            tour.duration_days,
            tour.max_group_size,
            additional_days,
            additional_people,
        );
        let extension = TourExtension {
            id: Uuid::new_v4(),
            booking_id,
            tour_id: booking.tour_id,
            user_id: user_id.to_string(),
            additional_days,
            additional_people,
            price_per_day: quote.price_per_day,
            price_per_person: quote.price_per_person,
            extension_price: quote.extension_price,
            status: ExtensionStatus::Pending,
            admin_note: None,
            requested_at: Utc::now(),
            approved_at: None,
            rejected_at: None,
        };
        self.extensions
            .insert_extension(&extension)
            .await
            .map_err(CoreError::storage)?;

        booking.extension = ExtensionSnapshot {
            additional_days,
            additional_people,
            extension_price: extension.extension_price,
            total_price: Some(booking.price + extension.extension_price),
            status: SnapshotStatus::Pending,
            requested_at: Some(extension.requested_at),
            approved_at: None,
        };
        self.write_snapshot(&booking).await;

        Ok(extension)
    }

    /// Customer withdraws a pending request. The record keeps the cancelled
    /// status forever; the booking snapshot resets to neutral.
    pub async fn cancel_extension(
        &self,
        extension_id: Uuid,
        user_id: &str,
    ) -> CoreResult<TourExtension> {
        let mut extension = self
            .extensions
            .get_extension(extension_id)
            .await
            .map_err(CoreError::storage)?
            .ok_or_else(|| CoreError::NotFound("extension request not found".to_string()))?;
        if extension.user_id != user_id {
            return Err(CoreError::Forbidden(
                "you can only cancel your own extension request".to_string(),
            ));
        }
        if extension.status != ExtensionStatus::Pending {
            return Err(CoreError::InvalidState(format!(
                "only a pending request can be cancelled, this one is {}",
                extension.status.as_str()
            )));
        }

        extension.status = ExtensionStatus::Cancelled;
        self.extensions
            .update_extension(&extension)
            .await
            .map_err(CoreError::storage)?;

        match self
            .bookings
            .get_booking(extension.booking_id)
            .await
            .map_err(CoreError::storage)?
        {
            Some(mut booking) => {
                booking.extension = ExtensionSnapshot::none();
                booking.extension.total_price = Some(booking.price);
                self.write_snapshot(&booking).await;
            }
            None => {
                warn!(
                    extension_id = %extension.id,
                    booking_id = %extension.booking_id,
                    "booking missing while resetting extension snapshot"
                );
            }
        }

        Ok(extension)
    }

    /// Admin approves a pending request; the booking's total picks up the
    /// extension price.
    pub async fn approve_extension(
        &self,
        extension_id: Uuid,
        admin_note: Option<String>,
    ) -> CoreResult<TourExtension> {
        let mut extension = self.pending_for_review(extension_id).await?;

        extension.status = ExtensionStatus::Approved;
        extension.approved_at = Some(Utc::now());
        if admin_note.is_some() {
            extension.admin_note = admin_note;
        }
        self.extensions
            .update_extension(&extension)
            .await
            .map_err(CoreError::storage)?;

        match self
            .bookings
            .get_booking(extension.booking_id)
            .await
            .map_err(CoreError::storage)?
        {
            Some(mut booking) => {
                booking.extension = ExtensionSnapshot {
                    additional_days: extension.additional_days,
                    additional_people: extension.additional_people,
                    extension_price: extension.extension_price,
                    total_price: Some(booking.price + extension.extension_price),
                    status: SnapshotStatus::Approved,
                    requested_at: Some(extension.requested_at),
                    approved_at: extension.approved_at,
                };
                self.write_snapshot(&booking).await;
            }
            None => {
                warn!(
                    extension_id = %extension.id,
                    booking_id = %extension.booking_id,
                    "booking missing while writing approved snapshot"
                );
            }
        }

        Ok(extension)
    }

    /// Admin rejects a pending request; the booking keeps its base price.
    pub async fn reject_extension(
        &self,
        extension_id: Uuid,
        admin_note: Option<String>,
    ) -> CoreResult<TourExtension> {
        let mut extension = self.pending_for_review(extension_id).await?;

        extension.status = ExtensionStatus::Rejected;
        extension.rejected_at = Some(Utc::now());
        if admin_note.is_some() {
            extension.admin_note = admin_note;
        }
        self.extensions
            .update_extension(&extension)
            .await
            .map_err(CoreError::storage)?;

        match self
            .bookings
            .get_booking(extension.booking_id)
            .await
            .map_err(CoreError::storage)?
        {
            Some(mut booking) => {
                booking.extension.status = SnapshotStatus::Rejected;
                booking.extension.approved_at = None;
                if booking.extension.requested_at.is_none() {
                    booking.extension.requested_at = Some(Utc::now());
                }
                self.write_snapshot(&booking).await;
            }
            None => {
                warn!(
                    extension_id = %extension.id,
                    booking_id = %extension.booking_id,
                    "booking missing while writing rejected snapshot"
                );
            }
        }

        Ok(extension)
    }

    pub async fn list_my_extensions(&self, user_id: &str) -> CoreResult<Vec<TourExtension>> {
        self.extensions
            .list_for_user(user_id)
            .await
            .map_err(CoreError::storage)
    }

    pub async fn list_extensions(
        &self,
        status: Option<ExtensionStatus>,
    ) -> CoreResult<Vec<TourExtension>> {
        self.extensions
            .list_extensions(status)
            .await
            .map_err(CoreError::storage)
    }

    /// Owner-or-admin read of one request.
    pub async fn get_extension(
        &self,
        extension_id: Uuid,
        user_id: &str,
        is_admin: bool,
    ) -> CoreResult<TourExtension> {
        let extension = self
            .extensions
            .get_extension(extension_id)
            .await
            .map_err(CoreError::storage)?
            .ok_or_else(|| CoreError::NotFound("extension request not found".to_string()))?;
        if !is_admin && extension.user_id != user_id {
            return Err(CoreError::Forbidden(
                "you can only view your own extension request".to_string(),
            ));
        }
        Ok(extension)
    }

    async fn pending_for_review(&self, extension_id: Uuid) -> CoreResult<TourExtension> {
        let extension = self
            .extensions
            .get_extension(extension_id)
            .await
            .map_err(CoreError::storage)?
            .ok_or_else(|| CoreError::NotFound("extension request not found".to_string()))?;
        if extension.status != ExtensionStatus::Pending {
            return Err(CoreError::InvalidState(format!(
                "only a pending request can be reviewed, this one is {}",
                extension.status.as_str()
            )));
        }
        Ok(extension)
    }

    /// The extension record is already durable when this runs; a failed
    /// snapshot write is logged and the booking is left behind the record.
    async fn write_snapshot(&self, booking: &Booking) {
        if let Err(err) = self.bookings.update_booking(booking).await {
            warn!(
                booking_id = %booking.id,
                error = %err,
                "extension snapshot write-through failed"
            );
        }
    }
}
