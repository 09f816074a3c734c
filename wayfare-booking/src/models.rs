use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Booking status in the lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

/// Status of the extension snapshot embedded in a booking. There is no
/// cancelled member: cancelling a request resets the snapshot to `None`,
/// and the TourExtension record keeps the history.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotStatus {
    None,
    Pending,
    Approved,
    Rejected,
}

/// Write-through projection of a booking's latest extension outcome. The
/// TourExtension collection stays authoritative; this copy exists so a
/// booking read needs no second lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtensionSnapshot {
    pub additional_days: u32,
    pub additional_people: u32,
    pub extension_price: Decimal,
    pub total_price: Option<Decimal>,
    pub status: SnapshotStatus,
    pub requested_at: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
}

impl ExtensionSnapshot {
    /// Neutral snapshot carried by every new booking.
    pub fn none() -> Self {
        Self {
            additional_days: 0,
            additional_people: 0,
            extension_price: Decimal::ZERO,
            total_price: None,
            status: SnapshotStatus::None,
            requested_at: None,
            approved_at: None,
        }
    }
}

impl Default for ExtensionSnapshot {
    fn default() -> Self {
        Self::none()
    }
}

/// A customer's reservation of one tour departure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub tour_id: Uuid,
    pub user_id: String,
    /// tour.price x number_of_people at creation; the catalog cascade may
    /// reprice it while the booking is still unpaid.
    pub price: Decimal,
    pub number_of_people: u32,
    pub start_date: NaiveDate,
    pub status: BookingStatus,
    pub paid: bool,
    #[serde(default)]
    pub extension: ExtensionSnapshot,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn new(
        tour_id: Uuid,
        user_id: String,
        start_date: NaiveDate,
        number_of_people: u32,
        price: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tour_id,
            user_id,
            price,
            number_of_people,
            start_date,
            status: BookingStatus::Pending,
            paid: false,
            extension: ExtensionSnapshot::none(),
            created_at: Utc::now(),
        }
    }

    /// Price including an approved extension; the base price otherwise.
    pub fn final_price(&self) -> Decimal {
        if self.extension.status != SnapshotStatus::Approved {
            return self.price;
        }
        match self.extension.total_price {
            Some(total) if total > Decimal::ZERO => total,
            _ => self.price + self.extension.extension_price,
        }
    }

    /// Trip length in days once an approved extension is counted in.
    pub fn final_duration(&self, tour_duration_days: u32) -> u32 {
        if self.extension.status == SnapshotStatus::Approved && self.extension.additional_days > 0 {
            tour_duration_days + self.extension.additional_days
        } else {
            tour_duration_days
        }
    }
}

/// Admin patch for a booking; at least one field must be supplied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingStatusPatch {
    pub status: Option<BookingStatus>,
    pub paid: Option<bool>,
}

/// Lifecycle of an extension request. Unlike the snapshot this keeps a
/// cancelled member; records are never deleted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExtensionStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl ExtensionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtensionStatus::Pending => "pending",
            ExtensionStatus::Approved => "approved",
            ExtensionStatus::Rejected => "rejected",
            ExtensionStatus::Cancelled => "cancelled",
        }
    }
}

/// Authoritative record of one extension request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TourExtension {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub tour_id: Uuid,
    pub user_id: String,
    pub additional_days: u32,
    pub additional_people: u32,
    pub price_per_day: Decimal,
    pub price_per_person: Decimal,
    pub extension_price: Decimal,
    pub status: ExtensionStatus,
    pub admin_note: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
}

/// One month of completed-booking revenue.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MonthlyRevenue {
    pub year: i32,
    pub month: u32,
    pub revenue: Decimal,
    pub bookings: u64,
}

/// Completed-booking count per tour, for the popularity report.
#[derive(Debug, Clone, Serialize)]
pub struct TourPopularity {
    pub tour_id: Uuid,
    pub name: String,
    pub destination: String,
    pub price: Decimal,
    pub bookings: u64,
}
