use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MAX_REVIEW_IMAGES: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub tour_id: Uuid,
    pub user_id: String,
    /// Whole-star rating, 1 through 5.
    pub rating: u8,
    pub text: String,
    pub image_urls: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Review {
    pub fn new(tour_id: Uuid, user_id: String, draft: ReviewDraft) -> Self {
        Self {
            id: Uuid::new_v4(),
            tour_id,
            user_id,
            rating: draft.rating,
            text: draft.text,
            image_urls: draft.image_urls,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewDraft {
    pub rating: u8,
    pub text: String,
    #[serde(default)]
    pub image_urls: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewChanges {
    pub rating: Option<u8>,
    pub text: Option<String>,
    pub image_urls: Option<Vec<String>>,
}
