pub mod engine;
pub mod extension;
pub mod models;
pub mod repository;

pub use engine::BookingEngine;
pub use extension::{quote_extension, ExtensionQuote, ExtensionWorkflow};
pub use models::{
    Booking, BookingStatus, BookingStatusPatch, ExtensionSnapshot, ExtensionStatus,
    MonthlyRevenue, SnapshotStatus, TourExtension, TourPopularity,
};
pub use repository::{BookingRepository, ExtensionRepository};
