pub mod repository;
pub mod review;
pub mod service;
pub mod tour;

pub use repository::{BookingRepricer, ReviewRepository, TourRepository};
pub use review::{Review, ReviewChanges, ReviewDraft};
pub use service::{CatalogService, ReviewService};
pub use tour::{Hotspot, Tour, TourChanges, TourDraft};
