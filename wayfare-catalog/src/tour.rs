use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Panoramic scene marker attached to a tour. Stored verbatim; rendering
/// is entirely front-end concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hotspot {
    pub scene_id: String,
    pub image_url: String,
    pub yaw: f64,
    pub pitch: f64,
    #[serde(default)]
    pub target_scene: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tour {
    pub id: Uuid,
    pub name: String,
    pub destination: String,
    pub price: Decimal,
    pub duration_days: u32,
    pub max_group_size: u32,
    pub start_dates: Vec<NaiveDate>,
    pub description: Option<String>,
    pub hotspots: Vec<Hotspot>,
    /// Derived from reviews, one decimal place. 0 with no reviews.
    pub average_rating: Decimal,
    pub rating_count: u32,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Tour {
    pub fn new(draft: TourDraft) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: draft.name,
            destination: draft.destination,
            price: draft.price,
            duration_days: draft.duration_days,
            max_group_size: draft.max_group_size,
            start_dates: draft.start_dates,
            description: draft.description,
            hotspots: draft.hotspots,
            average_rating: Decimal::ZERO,
            rating_count: 0,
            deleted_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Admin payload for creating a tour.
#[derive(Debug, Clone, Deserialize)]
pub struct TourDraft {
    pub name: String,
    pub destination: String,
    pub price: Decimal,
    pub duration_days: u32,
    pub max_group_size: u32,
    #[serde(default)]
    pub start_dates: Vec<NaiveDate>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub hotspots: Vec<Hotspot>,
}

/// Admin payload for a partial tour update. Absent fields stay untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TourChanges {
    pub name: Option<String>,
    pub destination: Option<String>,
    pub price: Option<Decimal>,
    pub duration_days: Option<u32>,
    pub max_group_size: Option<u32>,
    pub start_dates: Option<Vec<NaiveDate>>,
    pub description: Option<String>,
    pub hotspots: Option<Vec<Hotspot>>,
}
