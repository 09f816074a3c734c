//! In-memory document store backing every repository trait behind the API.
//! One `RwLock`ed map per collection; the aggregate-style queries scan, the
//! way the production document store runs its pipelines server-side.

use async_trait::async_trait;
use chrono::Datelike;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use uuid::Uuid;
use wayfare_booking::{
    Booking, BookingRepository, BookingStatus, ExtensionRepository, ExtensionStatus,
    MonthlyRevenue, TourExtension, TourPopularity,
};
use wayfare_catalog::{BookingRepricer, Review, ReviewRepository, Tour, TourRepository};

#[derive(Default)]
pub struct MemoryStore {
    tours: RwLock<HashMap<Uuid, Tour>>,
    bookings: RwLock<HashMap<Uuid, Booking>>,
    extensions: RwLock<HashMap<Uuid, TourExtension>>,
    reviews: RwLock<HashMap<Uuid, Review>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TourRepository for MemoryStore {
    async fn insert_tour(
        &self,
        tour: &Tour,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.tours.write().await.insert(tour.id, tour.clone());
        Ok(())
    }

    async fn get_tour(
        &self,
        id: Uuid,
    ) -> Result<Option<Tour>, Box<dyn std::error::Error + Send + Sync>> {
        let tours = self.tours.read().await;
        Ok(tours.get(&id).filter(|t| !t.is_deleted()).cloned())
    }

    async fn resolve_tour(
        &self,
        id: Uuid,
    ) -> Result<Option<Tour>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.tours.read().await.get(&id).cloned())
    }

    async fn list_tours(
        &self,
        destination: Option<&str>,
    ) -> Result<Vec<Tour>, Box<dyn std::error::Error + Send + Sync>> {
        let needle = destination.map(str::to_lowercase);
        let tours = self.tours.read().await;
        let mut live: Vec<Tour> = tours
            .values()
            .filter(|t| !t.is_deleted())
            .filter(|t| match &needle {
                Some(needle) => t.destination.to_lowercase().contains(needle),
                None => true,
            })
            .cloned()
            .collect();
        live.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(live)
    }

    async fn update_tour(
        &self,
        tour: &Tour,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.tours.write().await.insert(tour.id, tour.clone());
        Ok(())
    }

    async fn set_rating(
        &self,
        id: Uuid,
        average: Decimal,
        count: u32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if let Some(tour) = self.tours.write().await.get_mut(&id) {
            tour.average_rating = average;
            tour.rating_count = count;
        }
        Ok(())
    }
}

#[async_trait]
impl BookingRepricer for MemoryStore {
    async fn reprice_unpaid_for_tour(
        &self,
        tour_id: Uuid,
        new_price: Decimal,
    ) -> Result<u64, Box<dyn std::error::Error + Send + Sync>> {
        let mut bookings = self.bookings.write().await;
        let mut touched = 0;
        for booking in bookings.values_mut() {
            if booking.tour_id != tour_id {
                continue;
            }
            let open = booking.status == BookingStatus::Pending
                || (booking.status == BookingStatus::Confirmed && !booking.paid);
            if open {
                booking.price = new_price * Decimal::from(booking.number_of_people);
                touched += 1;
            }
        }
        Ok(touched)
    }
}

#[async_trait]
impl ReviewRepository for MemoryStore {
    async fn insert_review(
        &self,
        review: &Review,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.reviews.write().await.insert(review.id, review.clone());
        Ok(())
    }

    async fn get_review(
        &self,
        id: Uuid,
    ) -> Result<Option<Review>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.reviews.read().await.get(&id).cloned())
    }

    async fn find_by_user_and_tour(
        &self,
        user_id: &str,
        tour_id: Uuid,
    ) -> Result<Option<Review>, Box<dyn std::error::Error + Send + Sync>> {
        let reviews = self.reviews.read().await;
        Ok(reviews
            .values()
            .find(|r| r.user_id == user_id && r.tour_id == tour_id)
            .cloned())
    }

    async fn list_for_tour(
        &self,
        tour_id: Uuid,
    ) -> Result<Vec<Review>, Box<dyn std::error::Error + Send + Sync>> {
        let reviews = self.reviews.read().await;
        let mut matching: Vec<Review> = reviews
            .values()
            .filter(|r| r.tour_id == tour_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(matching)
    }

    async fn update_review(
        &self,
        review: &Review,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.reviews.write().await.insert(review.id, review.clone());
        Ok(())
    }

    async fn delete_review(
        &self,
        id: Uuid,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.reviews.write().await.remove(&id).is_some())
    }

    async fn rating_summary(
        &self,
        tour_id: Uuid,
    ) -> Result<(Decimal, u32), Box<dyn std::error::Error + Send + Sync>> {
        let reviews = self.reviews.read().await;
        let ratings: Vec<u32> = reviews
            .values()
            .filter(|r| r.tour_id == tour_id)
            .map(|r| u32::from(r.rating))
            .collect();
        if ratings.is_empty() {
            return Ok((Decimal::ZERO, 0));
        }
        let count = ratings.len() as u32;
        let sum: u32 = ratings.iter().sum();
        Ok((Decimal::from(sum) / Decimal::from(count), count))
    }
}

#[async_trait]
impl BookingRepository for MemoryStore {
    async fn insert_booking(
        &self,
        booking: &Booking,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.bookings
            .write()
            .await
            .insert(booking.id, booking.clone());
        Ok(())
    }

    async fn get_booking(
        &self,
        id: Uuid,
    ) -> Result<Option<Booking>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.bookings.read().await.get(&id).cloned())
    }

    async fn find_for_user(
        &self,
        id: Uuid,
        user_id: &str,
    ) -> Result<Option<Booking>, Box<dyn std::error::Error + Send + Sync>> {
        let bookings = self.bookings.read().await;
        Ok(bookings
            .get(&id)
            .filter(|b| b.user_id == user_id)
            .cloned())
    }

    async fn list_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<Booking>, Box<dyn std::error::Error + Send + Sync>> {
        let bookings = self.bookings.read().await;
        let mut matching: Vec<Booking> = bookings
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(matching)
    }

    async fn list_bookings(
        &self,
        status: Option<BookingStatus>,
    ) -> Result<Vec<Booking>, Box<dyn std::error::Error + Send + Sync>> {
        let bookings = self.bookings.read().await;
        let mut matching: Vec<Booking> = bookings
            .values()
            .filter(|b| status.map_or(true, |wanted| b.status == wanted))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(matching)
    }

    async fn update_booking(
        &self,
        booking: &Booking,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.bookings
            .write()
            .await
            .insert(booking.id, booking.clone());
        Ok(())
    }

    async fn revenue_by_month(
        &self,
        year: Option<i32>,
    ) -> Result<Vec<MonthlyRevenue>, Box<dyn std::error::Error + Send + Sync>> {
        let bookings = self.bookings.read().await;
        let mut buckets: BTreeMap<(i32, u32), (Decimal, u64)> = BTreeMap::new();
        for booking in bookings.values() {
            if booking.status != BookingStatus::Completed {
                continue;
            }
            let created = booking.created_at;
            if let Some(wanted) = year {
                if created.year() != wanted {
                    continue;
                }
            }
            let bucket = buckets
                .entry((created.year(), created.month()))
                .or_insert((Decimal::ZERO, 0));
            bucket.0 += booking.price;
            bucket.1 += 1;
        }
        Ok(buckets
            .into_iter()
            .map(|((year, month), (revenue, count))| MonthlyRevenue {
                year,
                month,
                revenue,
                bookings: count,
            })
            .collect())
    }

    async fn popular_tours(
        &self,
        limit: usize,
    ) -> Result<Vec<TourPopularity>, Box<dyn std::error::Error + Send + Sync>> {
        let mut counts: HashMap<Uuid, u64> = HashMap::new();
        {
            let bookings = self.bookings.read().await;
            for booking in bookings.values() {
                if booking.status == BookingStatus::Completed {
                    *counts.entry(booking.tour_id).or_insert(0) += 1;
                }
            }
        }
        let mut ranked: Vec<(Uuid, u64)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(limit);

        let tours = self.tours.read().await;
        Ok(ranked
            .into_iter()
            .filter_map(|(tour_id, count)| {
                tours.get(&tour_id).map(|tour| TourPopularity {
                    tour_id,
                    name: tour.name.clone(),
                    destination: tour.destination.clone(),
                    price: tour.price,
                    bookings: count,
                })
            })
            .collect())
    }
}

#[async_trait]
impl ExtensionRepository for MemoryStore {
    async fn insert_extension(
        &self,
        extension: &TourExtension,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.extensions
            .write()
            .await
            .insert(extension.id, extension.clone());
        Ok(())
    }

    async fn get_extension(
        &self,
        id: Uuid,
    ) -> Result<Option<TourExtension>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.extensions.read().await.get(&id).cloned())
    }

    async fn find_pending_for_booking(
        &self,
        booking_id: Uuid,
    ) -> Result<Option<TourExtension>, Box<dyn std::error::Error + Send + Sync>> {
        let extensions = self.extensions.read().await;
        Ok(extensions
            .values()
            .find(|e| e.booking_id == booking_id && e.status == ExtensionStatus::Pending)
            .cloned())
    }

    async fn list_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<TourExtension>, Box<dyn std::error::Error + Send + Sync>> {
        let extensions = self.extensions.read().await;
        let mut matching: Vec<TourExtension> = extensions
            .values()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.requested_at.cmp(&a.requested_at).then(a.id.cmp(&b.id)));
        Ok(matching)
    }

    async fn list_extensions(
        &self,
        status: Option<ExtensionStatus>,
    ) -> Result<Vec<TourExtension>, Box<dyn std::error::Error + Send + Sync>> {
        let extensions = self.extensions.read().await;
        let mut matching: Vec<TourExtension> = extensions
            .values()
            .filter(|e| status.map_or(true, |wanted| e.status == wanted))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.requested_at.cmp(&a.requested_at).then(a.id.cmp(&b.id)));
        Ok(matching)
    }

    async fn update_extension(
        &self,
        extension: &TourExtension,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.extensions
            .write()
            .await
            .insert(extension.id, extension.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, TimeZone, Utc};
    use std::str::FromStr;
    use std::sync::Arc;
    use wayfare_booking::{
        BookingEngine, BookingStatusPatch, ExtensionSnapshot, ExtensionWorkflow, SnapshotStatus,
    };
    use wayfare_catalog::{CatalogService, ReviewDraft, ReviewService, TourChanges, TourDraft};
    use wayfare_core::CoreError;
    use wayfare_shared::dates;

    fn dec(raw: &str) -> Decimal {
        Decimal::from_str(raw).unwrap()
    }

    fn departure() -> NaiveDate {
        dates::today_utc() + Duration::days(30)
    }

    fn draft() -> TourDraft {
        TourDraft {
            name: "Ha Long Bay Cruise".to_string(),
            destination: "Quang Ninh".to_string(),
            price: Decimal::from(1_000_000),
            duration_days: 3,
            max_group_size: 10,
            start_dates: vec![departure()],
            description: Some("Three days on the bay".to_string()),
            hotspots: vec![],
        }
    }

    fn store() -> Arc<MemoryStore> {
        Arc::new(MemoryStore::new())
    }

    fn catalog(store: &Arc<MemoryStore>) -> CatalogService {
        CatalogService::new(store.clone(), store.clone())
    }

    fn reviews(store: &Arc<MemoryStore>) -> ReviewService {
        ReviewService::new(store.clone(), store.clone())
    }

    fn engine(store: &Arc<MemoryStore>) -> BookingEngine {
        BookingEngine::new(store.clone(), store.clone())
    }

    fn workflow(store: &Arc<MemoryStore>) -> ExtensionWorkflow {
        ExtensionWorkflow::new(store.clone(), store.clone(), store.clone())
    }

    fn review_of(rating: u8) -> ReviewDraft {
        ReviewDraft {
            rating,
            text: "Great trip".to_string(),
            image_urls: vec![],
        }
    }

    #[tokio::test]
    async fn test_create_booking_prices_by_head_count() {
        let store = store();
        let tour = catalog(&store).create_tour(draft()).await.unwrap();

        let booking = engine(&store)
            .create_booking(tour.id, "user-1", &departure().to_string(), 2)
            .await
            .unwrap();

        assert_eq!(booking.price, Decimal::from(2_000_000));
        assert_eq!(booking.number_of_people, 2);
        assert_eq!(booking.status, BookingStatus::Pending);
        assert!(!booking.paid);
        assert_eq!(booking.extension, ExtensionSnapshot::none());
    }

    #[tokio::test]
    async fn test_create_booking_rejects_bad_dates() {
        let store = store();
        let tour = catalog(&store).create_tour(draft()).await.unwrap();
        let engine = engine(&store);

        let err = engine
            .create_booking(tour.id, "user-1", "not-a-date", 2)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));

        let yesterday = (dates::today_utc() - Duration::days(1)).to_string();
        let err = engine
            .create_booking(tour.id, "user-1", &yesterday, 2)
            .await
            .unwrap_err();
        match err {
            CoreError::InvalidInput(msg) => assert!(msg.contains("past")),
            other => panic!("unexpected error: {other}"),
        }

        // Valid future date, but not one of the scheduled departures.
        let off_schedule = (departure() + Duration::days(1)).to_string();
        let err = engine
            .create_booking(tour.id, "user-1", &off_schedule, 2)
            .await
            .unwrap_err();
        match err {
            CoreError::InvalidInput(msg) => {
                assert!(msg.contains("does not match a departure"));
                assert!(msg.contains(&departure().to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_create_booking_requires_live_tour() {
        let store = store();
        let catalog = catalog(&store);
        let engine = engine(&store);
        let date = departure().to_string();

        let err = engine
            .create_booking(Uuid::new_v4(), "user-1", &date, 2)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));

        let tour = catalog.create_tour(draft()).await.unwrap();
        catalog.delete_tour(tour.id).await.unwrap();
        let err = engine
            .create_booking(tour.id, "user-1", &date, 2)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_create_booking_needs_departures() {
        let store = store();
        let mut no_dates = draft();
        no_dates.start_dates = vec![];
        let tour = catalog(&store).create_tour(no_dates).await.unwrap();

        let err = engine(&store)
            .create_booking(tour.id, "user-1", &departure().to_string(), 2)
            .await
            .unwrap_err();
        match err {
            CoreError::InvalidInput(msg) => assert_eq!(msg, "tour has no departure dates"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_create_booking_capacity_checks() {
        let store = store();
        let tour = catalog(&store).create_tour(draft()).await.unwrap();
        let engine = engine(&store);
        let date = departure().to_string();

        let err = engine
            .create_booking(tour.id, "user-1", &date, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));

        let err = engine
            .create_booking(tour.id, "user-1", &date, 11)
            .await
            .unwrap_err();
        match err {
            CoreError::InvalidInput(msg) => {
                assert_eq!(msg, "group size exceeds the tour maximum of 10")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_cancel_own_booking_and_ownership_fold() {
        let store = store();
        let tour = catalog(&store).create_tour(draft()).await.unwrap();
        let engine = engine(&store);
        let booking = engine
            .create_booking(tour.id, "user-1", &departure().to_string(), 2)
            .await
            .unwrap();

        // Someone else's id reads as not found, not forbidden.
        let err = engine
            .cancel_own_booking(booking.id, "user-2")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));

        let cancelled = engine
            .cancel_own_booking(booking.id, "user-1")
            .await
            .unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);

        let err = engine
            .cancel_own_booking(booking.id, "user-1")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_completed_requires_paid() {
        let store = store();
        let tour = catalog(&store).create_tour(draft()).await.unwrap();
        let engine = engine(&store);
        let booking = engine
            .create_booking(tour.id, "user-1", &departure().to_string(), 2)
            .await
            .unwrap();

        let err = engine
            .update_booking_status(booking.id, BookingStatusPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));

        let err = engine
            .update_booking_status(
                booking.id,
                BookingStatusPatch {
                    status: Some(BookingStatus::Completed),
                    paid: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidState(_)));

        let updated = engine
            .update_booking_status(
                booking.id,
                BookingStatusPatch {
                    status: Some(BookingStatus::Completed),
                    paid: Some(true),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, BookingStatus::Completed);
        assert!(updated.paid);

        let err = engine
            .cancel_own_booking(booking.id, "user-1")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_price_cascade_spares_paid_and_closed_bookings() {
        let store = store();
        let catalog = catalog(&store);
        let engine = engine(&store);
        let tour = catalog.create_tour(draft()).await.unwrap();
        let date = departure().to_string();

        let pending = engine
            .create_booking(tour.id, "user-1", &date, 2)
            .await
            .unwrap();
        let confirmed = engine
            .create_booking(tour.id, "user-2", &date, 1)
            .await
            .unwrap();
        let paid = engine
            .create_booking(tour.id, "user-3", &date, 2)
            .await
            .unwrap();
        let cancelled = engine
            .create_booking(tour.id, "user-4", &date, 2)
            .await
            .unwrap();

        engine
            .update_booking_status(
                confirmed.id,
                BookingStatusPatch {
                    status: Some(BookingStatus::Confirmed),
                    paid: None,
                },
            )
            .await
            .unwrap();
        engine
            .update_booking_status(
                paid.id,
                BookingStatusPatch {
                    status: Some(BookingStatus::Confirmed),
                    paid: Some(true),
                },
            )
            .await
            .unwrap();
        engine
            .cancel_own_booking(cancelled.id, "user-4")
            .await
            .unwrap();

        catalog
            .update_tour(
                tour.id,
                TourChanges {
                    price: Some(Decimal::from(1_200_000)),
                    ..TourChanges::default()
                },
            )
            .await
            .unwrap();

        let fetched = store.get_booking(pending.id).await.unwrap().unwrap();
        assert_eq!(fetched.price, Decimal::from(2_400_000));
        let fetched = store.get_booking(confirmed.id).await.unwrap().unwrap();
        assert_eq!(fetched.price, Decimal::from(1_200_000));
        let fetched = store.get_booking(paid.id).await.unwrap().unwrap();
        assert_eq!(fetched.price, Decimal::from(2_000_000));
        let fetched = store.get_booking(cancelled.id).await.unwrap().unwrap();
        assert_eq!(fetched.price, Decimal::from(2_000_000));
    }

    #[tokio::test]
    async fn test_soft_delete_hides_and_restore_revives() {
        let store = store();
        let catalog = catalog(&store);
        let tour = catalog.create_tour(draft()).await.unwrap();
        let mut other = draft();
        other.destination = "Da Nang".to_string();
        catalog.create_tour(other).await.unwrap();

        catalog.delete_tour(tour.id).await.unwrap();
        assert_eq!(catalog.list_tours(None).await.unwrap().len(), 1);
        assert!(matches!(
            catalog.get_tour(tour.id).await.unwrap_err(),
            CoreError::NotFound(_)
        ));
        assert!(catalog.resolve_tour(tour.id).await.unwrap().is_deleted());

        // Deleting twice reports not found, same as any other dead id.
        assert!(matches!(
            catalog.delete_tour(tour.id).await.unwrap_err(),
            CoreError::NotFound(_)
        ));

        let restored = catalog.restore_tour(tour.id).await.unwrap();
        assert!(!restored.is_deleted());
        assert_eq!(catalog.list_tours(None).await.unwrap().len(), 2);

        assert!(matches!(
            catalog.restore_tour(tour.id).await.unwrap_err(),
            CoreError::InvalidState(_)
        ));
    }

    #[tokio::test]
    async fn test_list_tours_filters_destination() {
        let store = store();
        let catalog = catalog(&store);
        catalog.create_tour(draft()).await.unwrap();
        let mut other = draft();
        other.name = "Marble Mountains".to_string();
        other.destination = "Da Nang".to_string();
        catalog.create_tour(other).await.unwrap();

        assert_eq!(catalog.list_tours(None).await.unwrap().len(), 2);
        let hits = catalog.list_tours(Some("NINH")).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].destination, "Quang Ninh");
        assert!(catalog.list_tours(Some("hanoi")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_extension_flow_approval() {
        let store = store();
        let tour = catalog(&store).create_tour(draft()).await.unwrap();
        let booking = engine(&store)
            .create_booking(tour.id, "user-1", &departure().to_string(), 2)
            .await
            .unwrap();
        let workflow = workflow(&store);

        let extension = workflow
            .request_extension(booking.id, "user-1", 1, 0)
            .await
            .unwrap();
        assert_eq!(extension.price_per_day, dec("333333.33"));
        assert_eq!(extension.price_per_person, dec("100000.00"));
        assert_eq!(extension.extension_price, dec("333333.33"));
        assert_eq!(extension.status, ExtensionStatus::Pending);

        // Pending snapshot carries the would-be total but the effective
        // price stays at the base until approval.
        let fetched = store.get_booking(booking.id).await.unwrap().unwrap();
        assert_eq!(fetched.extension.status, SnapshotStatus::Pending);
        assert_eq!(fetched.extension.total_price, Some(dec("2333333.33")));
        assert_eq!(fetched.final_price(), Decimal::from(2_000_000));

        let approved = workflow
            .approve_extension(extension.id, Some("have a good trip".to_string()))
            .await
            .unwrap();
        assert_eq!(approved.status, ExtensionStatus::Approved);
        assert!(approved.approved_at.is_some());
        assert_eq!(approved.admin_note.as_deref(), Some("have a good trip"));

        let fetched = store.get_booking(booking.id).await.unwrap().unwrap();
        assert_eq!(fetched.extension.status, SnapshotStatus::Approved);
        assert_eq!(fetched.final_price(), dec("2333333.33"));
        assert_eq!(fetched.final_duration(tour.duration_days), 4);

        // A reviewed request cannot be reviewed again.
        let err = workflow
            .approve_extension(extension.id, None)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_extension_reject_keeps_base_price() {
        let store = store();
        let tour = catalog(&store).create_tour(draft()).await.unwrap();
        let booking = engine(&store)
            .create_booking(tour.id, "user-1", &departure().to_string(), 2)
            .await
            .unwrap();
        let workflow = workflow(&store);

        let extension = workflow
            .request_extension(booking.id, "user-1", 0, 3)
            .await
            .unwrap();
        assert_eq!(extension.extension_price, dec("300000.00"));

        let rejected = workflow
            .reject_extension(extension.id, Some("tour is full".to_string()))
            .await
            .unwrap();
        assert_eq!(rejected.status, ExtensionStatus::Rejected);
        assert!(rejected.rejected_at.is_some());

        let fetched = store.get_booking(booking.id).await.unwrap().unwrap();
        assert_eq!(fetched.extension.status, SnapshotStatus::Rejected);
        assert!(fetched.extension.approved_at.is_none());
        assert!(fetched.extension.requested_at.is_some());
        assert_eq!(fetched.final_price(), Decimal::from(2_000_000));
    }

    #[tokio::test]
    async fn test_extension_cancel_resets_snapshot() {
        let store = store();
        let tour = catalog(&store).create_tour(draft()).await.unwrap();
        let booking = engine(&store)
            .create_booking(tour.id, "user-1", &departure().to_string(), 2)
            .await
            .unwrap();
        let workflow = workflow(&store);

        let extension = workflow
            .request_extension(booking.id, "user-1", 1, 0)
            .await
            .unwrap();

        let err = workflow
            .cancel_extension(extension.id, "user-2")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(_)));

        let cancelled = workflow
            .cancel_extension(extension.id, "user-1")
            .await
            .unwrap();
        assert_eq!(cancelled.status, ExtensionStatus::Cancelled);

        let fetched = store.get_booking(booking.id).await.unwrap().unwrap();
        assert_eq!(fetched.extension.status, SnapshotStatus::None);
        assert_eq!(fetched.extension.extension_price, Decimal::ZERO);
        assert_eq!(fetched.extension.total_price, Some(Decimal::from(2_000_000)));

        let err = workflow
            .cancel_extension(extension.id, "user-1")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidState(_)));

        // The cancelled record no longer blocks a fresh request.
        workflow
            .request_extension(booking.id, "user-1", 0, 1)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_extension_request_guards() {
        let store = store();
        let tour = catalog(&store).create_tour(draft()).await.unwrap();
        let booking = engine(&store)
            .create_booking(tour.id, "user-1", &departure().to_string(), 2)
            .await
            .unwrap();
        let workflow = workflow(&store);

        let err = workflow
            .request_extension(booking.id, "user-1", 0, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));

        let err = workflow
            .request_extension(Uuid::new_v4(), "user-1", 1, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));

        let err = workflow
            .request_extension(booking.id, "user-2", 1, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(_)));

        workflow
            .request_extension(booking.id, "user-1", 1, 0)
            .await
            .unwrap();
        let err = workflow
            .request_extension(booking.id, "user-1", 2, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_extension_survives_tour_soft_delete() {
        let store = store();
        let catalog = catalog(&store);
        let tour = catalog.create_tour(draft()).await.unwrap();
        let booking = engine(&store)
            .create_booking(tour.id, "user-1", &departure().to_string(), 2)
            .await
            .unwrap();

        catalog.delete_tour(tour.id).await.unwrap();

        // Rates still come off the archived tour sheet.
        let extension = workflow(&store)
            .request_extension(booking.id, "user-1", 1, 0)
            .await
            .unwrap();
        assert_eq!(extension.extension_price, dec("333333.33"));
    }

    #[tokio::test]
    async fn test_revenue_groups_by_month() {
        let store = store();
        let engine = engine(&store);

        let seed = |year, month, amount: i64, status| {
            let mut booking = Booking::new(
                Uuid::new_v4(),
                "user-1".to_string(),
                departure(),
                1,
                Decimal::from(amount),
            );
            booking.status = status;
            booking.created_at = Utc.with_ymd_and_hms(year, month, 10, 8, 0, 0).unwrap();
            booking
        };
        let rows = vec![
            seed(2025, 3, 100, BookingStatus::Completed),
            seed(2025, 3, 150, BookingStatus::Completed),
            seed(2025, 4, 200, BookingStatus::Completed),
            seed(2025, 3, 999, BookingStatus::Pending),
            seed(2024, 12, 400, BookingStatus::Completed),
        ];
        for row in &rows {
            store.insert_booking(row).await.unwrap();
        }

        let report = engine.revenue_stats(Some(2025)).await.unwrap();
        assert_eq!(report.len(), 2);
        assert_eq!(report[0].month, 3);
        assert_eq!(report[0].revenue, Decimal::from(250));
        assert_eq!(report[0].bookings, 2);
        assert_eq!(report[1].month, 4);
        assert_eq!(report[1].revenue, Decimal::from(200));

        let all = engine.revenue_stats(None).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!((all[0].year, all[0].month), (2024, 12));
    }

    #[tokio::test]
    async fn test_popular_tours_ranked_and_limited() {
        let store = store();
        let catalog = catalog(&store);
        let engine = engine(&store);
        let quiet = catalog.create_tour(draft()).await.unwrap();
        let mut busy_draft = draft();
        busy_draft.name = "Mekong Delta".to_string();
        busy_draft.destination = "Can Tho".to_string();
        let busy = catalog.create_tour(busy_draft).await.unwrap();

        let completed = |tour_id| {
            let mut booking = Booking::new(
                tour_id,
                "user-1".to_string(),
                departure(),
                1,
                Decimal::from(1_000_000),
            );
            booking.status = BookingStatus::Completed;
            booking
        };
        store.insert_booking(&completed(quiet.id)).await.unwrap();
        store.insert_booking(&completed(busy.id)).await.unwrap();
        store.insert_booking(&completed(busy.id)).await.unwrap();
        // Open bookings never count towards popularity.
        store
            .insert_booking(&Booking::new(
                busy.id,
                "user-2".to_string(),
                departure(),
                1,
                Decimal::from(1_000_000),
            ))
            .await
            .unwrap();

        let top = engine.popular_tours(5).await.unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].tour_id, busy.id);
        assert_eq!(top[0].bookings, 2);
        assert_eq!(top[0].name, "Mekong Delta");
        assert_eq!(top[1].tour_id, quiet.id);

        let top = engine.popular_tours(1).await.unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].tour_id, busy.id);

        // A retired tour keeps its history in the report.
        catalog.delete_tour(busy.id).await.unwrap();
        let top = engine.popular_tours(5).await.unwrap();
        assert_eq!(top[0].tour_id, busy.id);
    }

    #[tokio::test]
    async fn test_review_rating_write_through() {
        let store = store();
        let catalog = catalog(&store);
        let reviews = reviews(&store);
        let tour = catalog.create_tour(draft()).await.unwrap();

        reviews
            .create_review(tour.id, "user-1", review_of(5))
            .await
            .unwrap();
        let second = reviews
            .create_review(tour.id, "user-2", review_of(4))
            .await
            .unwrap();

        let fetched = catalog.get_tour(tour.id).await.unwrap();
        assert_eq!(fetched.average_rating, dec("4.5"));
        assert_eq!(fetched.rating_count, 2);

        // 5 + 4 + 5 over three reviews rounds to one decimal place.
        let third = reviews
            .create_review(tour.id, "user-3", review_of(5))
            .await
            .unwrap();
        let fetched = catalog.get_tour(tour.id).await.unwrap();
        assert_eq!(fetched.average_rating, dec("4.7"));
        assert_eq!(fetched.rating_count, 3);

        reviews
            .delete_review(third.id, "admin-1", true)
            .await
            .unwrap();
        reviews
            .delete_review(second.id, "user-2", false)
            .await
            .unwrap();
        let fetched = catalog.get_tour(tour.id).await.unwrap();
        assert_eq!(fetched.average_rating, dec("5.0"));
        assert_eq!(fetched.rating_count, 1);
    }

    #[tokio::test]
    async fn test_rating_resets_when_last_review_goes() {
        let store = store();
        let catalog = catalog(&store);
        let reviews = reviews(&store);
        let tour = catalog.create_tour(draft()).await.unwrap();

        let only = reviews
            .create_review(tour.id, "user-1", review_of(3))
            .await
            .unwrap();
        reviews
            .delete_review(only.id, "user-1", false)
            .await
            .unwrap();

        let fetched = catalog.get_tour(tour.id).await.unwrap();
        assert_eq!(fetched.average_rating, Decimal::ZERO);
        assert_eq!(fetched.rating_count, 0);
    }

    #[tokio::test]
    async fn test_one_review_per_user_per_tour() {
        let store = store();
        let catalog = catalog(&store);
        let reviews = reviews(&store);
        let tour = catalog.create_tour(draft()).await.unwrap();

        reviews
            .create_review(tour.id, "user-1", review_of(4))
            .await
            .unwrap();
        let err = reviews
            .create_review(tour.id, "user-1", review_of(5))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidState(_)));

        let err = reviews
            .create_review(Uuid::new_v4(), "user-1", review_of(4))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_review_ownership_checks() {
        let store = store();
        let catalog = catalog(&store);
        let reviews = reviews(&store);
        let tour = catalog.create_tour(draft()).await.unwrap();

        let review = reviews
            .create_review(tour.id, "user-1", review_of(4))
            .await
            .unwrap();

        let changes = wayfare_catalog::ReviewChanges {
            rating: Some(2),
            ..Default::default()
        };
        let err = reviews
            .update_review(review.id, "user-2", false, changes.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(_)));

        // Admins moderate anyone's review.
        let updated = reviews
            .update_review(review.id, "admin-1", true, changes)
            .await
            .unwrap();
        assert_eq!(updated.rating, 2);
        let fetched = catalog.get_tour(tour.id).await.unwrap();
        assert_eq!(fetched.average_rating, dec("2.0"));

        let err = reviews
            .delete_review(review.id, "user-2", false)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(_)));
        reviews
            .delete_review(review.id, "admin-1", true)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_find_for_user_scopes_lookups() {
        let store = store();
        let booking = Booking::new(
            Uuid::new_v4(),
            "user-1".to_string(),
            departure(),
            1,
            Decimal::from(500),
        );
        store.insert_booking(&booking).await.unwrap();

        assert!(store
            .find_for_user(booking.id, "user-2")
            .await
            .unwrap()
            .is_none());
        assert!(store
            .find_for_user(booking.id, "user-1")
            .await
            .unwrap()
            .is_some());

        assert_eq!(
            BookingRepository::list_for_user(&*store, "user-1")
                .await
                .unwrap()
                .len(),
            1
        );
        assert!(BookingRepository::list_for_user(&*store, "user-2")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_rating_summary_with_no_reviews() {
        let store = store();
        let (mean, count) = store.rating_summary(Uuid::new_v4()).await.unwrap();
        assert_eq!(mean, Decimal::ZERO);
        assert_eq!(count, 0);
    }
}
