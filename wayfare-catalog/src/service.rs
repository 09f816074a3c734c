use crate::repository::{BookingRepricer, ReviewRepository, TourRepository};
use crate::review::{Review, ReviewChanges, ReviewDraft, MAX_REVIEW_IMAGES};
use crate::tour::{Tour, TourChanges, TourDraft};
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use wayfare_core::{CoreError, CoreResult};
use wayfare_shared::round1;

/// Admin-facing tour catalog with soft deletes and the price cascade.
pub struct CatalogService {
    tours: Arc<dyn TourRepository>,
    repricer: Arc<dyn BookingRepricer>,
}

impl CatalogService {
    pub fn new(tours: Arc<dyn TourRepository>, repricer: Arc<dyn BookingRepricer>) -> Self {
        Self { tours, repricer }
    }

    /// Create a tour with a zeroed rating cache.
    pub async fn create_tour(&self, draft: TourDraft) -> CoreResult<Tour> {
        validate_tour_fields(draft.price, draft.duration_days, draft.max_group_size)?;

        let tour = Tour::new(draft);
        self.tours
            .insert_tour(&tour)
            .await
            .map_err(CoreError::storage)?;
        Ok(tour)
    }

    /// Public read; soft-deleted tours are invisible here.
    pub async fn get_tour(&self, id: Uuid) -> CoreResult<Tour> {
        self.tours
            .get_tour(id)
            .await
            .map_err(CoreError::storage)?
            .ok_or_else(|| CoreError::NotFound("tour not found".to_string()))
    }

    /// Internal read that still resolves soft-deleted tours, so historical
    /// bookings never dangle.
    pub async fn resolve_tour(&self, id: Uuid) -> CoreResult<Tour> {
        self.tours
            .resolve_tour(id)
            .await
            .map_err(CoreError::storage)?
            .ok_or_else(|| CoreError::NotFound("tour not found".to_string()))
    }

    pub async fn list_tours(&self, destination: Option<&str>) -> CoreResult<Vec<Tour>> {
        self.tours
            .list_tours(destination)
            .await
            .map_err(CoreError::storage)
    }

    /// Partial update. When the price changes, the tour's open bookings
    /// (pending, or confirmed and unpaid) are repriced to the new price
    /// times their head count; completed, cancelled and paid bookings keep
    /// their historical price.
    pub async fn update_tour(&self, id: Uuid, changes: TourChanges) -> CoreResult<Tour> {
        let mut tour = self.get_tour(id).await?;
        let old_price = tour.price;

        if let Some(name) = changes.name {
            tour.name = name;
        }
        if let Some(destination) = changes.destination {
            tour.destination = destination;
        }
        if let Some(price) = changes.price {
            tour.price = price;
        }
        if let Some(duration_days) = changes.duration_days {
            tour.duration_days = duration_days;
        }
        if let Some(max_group_size) = changes.max_group_size {
            tour.max_group_size = max_group_size;
        }
        if let Some(start_dates) = changes.start_dates {
            tour.start_dates = start_dates;
        }
        if let Some(description) = changes.description {
            tour.description = Some(description);
        }
        if let Some(hotspots) = changes.hotspots {
            tour.hotspots = hotspots;
        }
        validate_tour_fields(tour.price, tour.duration_days, tour.max_group_size)?;

        self.tours
            .update_tour(&tour)
            .await
            .map_err(CoreError::storage)?;

        if tour.price != old_price {
            let touched = self
                .repricer
                .reprice_unpaid_for_tour(tour.id, tour.price)
                .await
                .map_err(CoreError::storage)?;
            info!(tour_id = %tour.id, touched, "repriced open bookings after price change");
        }

        Ok(tour)
    }

    /// Soft delete. The live-read lookup means deleting an already-deleted
    /// tour reports not found.
    pub async fn delete_tour(&self, id: Uuid) -> CoreResult<()> {
        let mut tour = self.get_tour(id).await?;
        tour.deleted_at = Some(Utc::now());
        self.tours
            .update_tour(&tour)
            .await
            .map_err(CoreError::storage)?;
        Ok(())
    }

    pub async fn restore_tour(&self, id: Uuid) -> CoreResult<Tour> {
        let mut tour = self.resolve_tour(id).await?;
        if !tour.is_deleted() {
            return Err(CoreError::InvalidState("tour is not deleted".to_string()));
        }
        tour.deleted_at = None;
        self.tours
            .update_tour(&tour)
            .await
            .map_err(CoreError::storage)?;
        Ok(tour)
    }
}

/// Reviews plus the write-through recompute of each tour's rating cache.
pub struct ReviewService {
    reviews: Arc<dyn ReviewRepository>,
    tours: Arc<dyn TourRepository>,
}

impl ReviewService {
    pub fn new(reviews: Arc<dyn ReviewRepository>, tours: Arc<dyn TourRepository>) -> Self {
        Self { reviews, tours }
    }

    /// One review per user per tour.
    pub async fn create_review(
        &self,
        tour_id: Uuid,
        user_id: &str,
        draft: ReviewDraft,
    ) -> CoreResult<Review> {
        validate_rating(draft.rating)?;
        validate_image_count(&draft.image_urls)?;

        let tour = self
            .tours
            .get_tour(tour_id)
            .await
            .map_err(CoreError::storage)?;
        if tour.is_none() {
            return Err(CoreError::NotFound("tour not found".to_string()));
        }

        let existing = self
            .reviews
            .find_by_user_and_tour(user_id, tour_id)
            .await
            .map_err(CoreError::storage)?;
        if existing.is_some() {
            return Err(CoreError::InvalidState(
                "you have already reviewed this tour".to_string(),
            ));
        }

        let review = Review::new(tour_id, user_id.to_string(), draft);
        self.reviews
            .insert_review(&review)
            .await
            .map_err(CoreError::storage)?;
        self.recompute_rating(tour_id).await;
        Ok(review)
    }

    pub async fn update_review(
        &self,
        review_id: Uuid,
        user_id: &str,
        is_admin: bool,
        changes: ReviewChanges,
    ) -> CoreResult<Review> {
        let mut review = self
            .reviews
            .get_review(review_id)
            .await
            .map_err(CoreError::storage)?
            .ok_or_else(|| CoreError::NotFound("review not found".to_string()))?;

        if review.user_id != user_id && !is_admin {
            return Err(CoreError::Forbidden(
                "you can only edit your own review".to_string(),
            ));
        }

        if let Some(rating) = changes.rating {
            validate_rating(rating)?;
            review.rating = rating;
        }
        if let Some(text) = changes.text {
            review.text = text;
        }
        if let Some(image_urls) = changes.image_urls {
            validate_image_count(&image_urls)?;
            review.image_urls = image_urls;
        }

        self.reviews
            .update_review(&review)
            .await
            .map_err(CoreError::storage)?;
        self.recompute_rating(review.tour_id).await;
        Ok(review)
    }

    pub async fn delete_review(
        &self,
        review_id: Uuid,
        user_id: &str,
        is_admin: bool,
    ) -> CoreResult<()> {
        let review = self
            .reviews
            .get_review(review_id)
            .await
            .map_err(CoreError::storage)?
            .ok_or_else(|| CoreError::NotFound("review not found".to_string()))?;

        if review.user_id != user_id && !is_admin {
            return Err(CoreError::Forbidden(
                "you can only delete your own review".to_string(),
            ));
        }

        let removed = self
            .reviews
            .delete_review(review_id)
            .await
            .map_err(CoreError::storage)?;
        if removed {
            self.recompute_rating(review.tour_id).await;
        }
        Ok(())
    }

    pub async fn list_reviews(&self, tour_id: Uuid) -> CoreResult<Vec<Review>> {
        self.reviews
            .list_for_tour(tour_id)
            .await
            .map_err(CoreError::storage)
    }

    /// The review write is already durable when this runs; a failed
    /// recompute is logged and picked up by the next review write.
    async fn recompute_rating(&self, tour_id: Uuid) {
        let (mean, count) = match self.reviews.rating_summary(tour_id).await {
            Ok(summary) => summary,
            Err(err) => {
                warn!(%tour_id, error = %err, "rating summary failed, cache left stale");
                return;
            }
        };
        if let Err(err) = self.tours.set_rating(tour_id, round1(mean), count).await {
            warn!(%tour_id, error = %err, "rating write-through failed, cache left stale");
        }
    }
}

fn validate_rating(rating: u8) -> CoreResult<()> {
    if !(1..=5).contains(&rating) {
        return Err(CoreError::InvalidInput(
            "rating must be between 1 and 5".to_string(),
        ));
    }
    Ok(())
}

fn validate_image_count(image_urls: &[String]) -> CoreResult<()> {
    if image_urls.len() > MAX_REVIEW_IMAGES {
        return Err(CoreError::InvalidInput(format!(
            "a review can carry at most {} images",
            MAX_REVIEW_IMAGES
        )));
    }
    Ok(())
}

fn validate_tour_fields(price: Decimal, duration_days: u32, max_group_size: u32) -> CoreResult<()> {
    if price <= Decimal::ZERO {
        return Err(CoreError::InvalidInput(
            "price must be greater than 0".to_string(),
        ));
    }
    if duration_days == 0 {
        return Err(CoreError::InvalidInput(
            "duration must be at least 1 day".to_string(),
        ));
    }
    if max_group_size == 0 {
        return Err(CoreError::InvalidInput(
            "max group size must be at least 1".to_string(),
        ));
    }
    Ok(())
}
