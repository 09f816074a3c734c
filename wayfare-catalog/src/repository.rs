use crate::review::Review;
use crate::tour::Tour;
use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Repository trait for tour documents. Reads split along the soft-delete
/// boundary: `get_tour`/`list_tours` see only live tours, `resolve_tour`
/// also returns soft-deleted ones so historical bookings keep a valid
/// tour reference.
#[async_trait]
pub trait TourRepository: Send + Sync {
    async fn insert_tour(
        &self,
        tour: &Tour,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    async fn get_tour(
        &self,
        id: Uuid,
    ) -> Result<Option<Tour>, Box<dyn std::error::Error + Send + Sync>>;

    async fn resolve_tour(
        &self,
        id: Uuid,
    ) -> Result<Option<Tour>, Box<dyn std::error::Error + Send + Sync>>;

    async fn list_tours(
        &self,
        destination: Option<&str>,
    ) -> Result<Vec<Tour>, Box<dyn std::error::Error + Send + Sync>>;

    /// Full-document replace keyed by `tour.id`.
    async fn update_tour(
        &self,
        tour: &Tour,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Write-through of the derived rating cache.
    async fn set_rating(
        &self,
        id: Uuid,
        average: Decimal,
        count: u32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Store-side multi-update applied when an admin changes a tour's price:
/// pending bookings and unpaid confirmed bookings of the tour are repriced
/// to `new_price x number_of_people`. Returns the number touched.
#[async_trait]
pub trait BookingRepricer: Send + Sync {
    async fn reprice_unpaid_for_tour(
        &self,
        tour_id: Uuid,
        new_price: Decimal,
    ) -> Result<u64, Box<dyn std::error::Error + Send + Sync>>;
}

/// Repository trait for review documents.
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    async fn insert_review(
        &self,
        review: &Review,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    async fn get_review(
        &self,
        id: Uuid,
    ) -> Result<Option<Review>, Box<dyn std::error::Error + Send + Sync>>;

    async fn find_by_user_and_tour(
        &self,
        user_id: &str,
        tour_id: Uuid,
    ) -> Result<Option<Review>, Box<dyn std::error::Error + Send + Sync>>;

    async fn list_for_tour(
        &self,
        tour_id: Uuid,
    ) -> Result<Vec<Review>, Box<dyn std::error::Error + Send + Sync>>;

    async fn update_review(
        &self,
        review: &Review,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    async fn delete_review(
        &self,
        id: Uuid,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>>;

    /// Unrounded mean and count of ratings for a tour, (0, 0) when the
    /// tour has no reviews.
    async fn rating_summary(
        &self,
        tour_id: Uuid,
    ) -> Result<(Decimal, u32), Box<dyn std::error::Error + Send + Sync>>;
}
