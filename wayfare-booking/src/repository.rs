use crate::models::{
    Booking, BookingStatus, ExtensionStatus, MonthlyRevenue, TourExtension, TourPopularity,
};
use async_trait::async_trait;
use uuid::Uuid;

/// Repository trait for booking documents.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn insert_booking(
        &self,
        booking: &Booking,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    async fn get_booking(
        &self,
        id: Uuid,
    ) -> Result<Option<Booking>, Box<dyn std::error::Error + Send + Sync>>;

    /// Single lookup filtered by (id, user). Callers treat a miss as not
    /// found so ownership probes cannot distinguish "absent" from "not
    /// yours".
    async fn find_for_user(
        &self,
        id: Uuid,
        user_id: &str,
    ) -> Result<Option<Booking>, Box<dyn std::error::Error + Send + Sync>>;

    async fn list_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<Booking>, Box<dyn std::error::Error + Send + Sync>>;

    async fn list_bookings(
        &self,
        status: Option<BookingStatus>,
    ) -> Result<Vec<Booking>, Box<dyn std::error::Error + Send + Sync>>;

    /// Full-document replace keyed by `booking.id`.
    async fn update_booking(
        &self,
        booking: &Booking,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Completed bookings grouped by (year, month), chronological.
    async fn revenue_by_month(
        &self,
        year: Option<i32>,
    ) -> Result<Vec<MonthlyRevenue>, Box<dyn std::error::Error + Send + Sync>>;

    /// Completed bookings grouped by tour, count descending, joined with
    /// the tour sheet. Soft-deleted tours still resolve here.
    async fn popular_tours(
        &self,
        limit: usize,
    ) -> Result<Vec<TourPopularity>, Box<dyn std::error::Error + Send + Sync>>;
}

/// Repository trait for extension request documents.
#[async_trait]
pub trait ExtensionRepository: Send + Sync {
    async fn insert_extension(
        &self,
        extension: &TourExtension,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    async fn get_extension(
        &self,
        id: Uuid,
    ) -> Result<Option<TourExtension>, Box<dyn std::error::Error + Send + Sync>>;

    async fn find_pending_for_booking(
        &self,
        booking_id: Uuid,
    ) -> Result<Option<TourExtension>, Box<dyn std::error::Error + Send + Sync>>;

    async fn list_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<TourExtension>, Box<dyn std::error::Error + Send + Sync>>;

    async fn list_extensions(
        &self,
        status: Option<ExtensionStatus>,
    ) -> Result<Vec<TourExtension>, Box<dyn std::error::Error + Send + Sync>>;

    async fn update_extension(
        &self,
        extension: &TourExtension,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}
