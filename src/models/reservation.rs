use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A bike reservation. Start and end are stored in UTC; all local-time
/// rules (opening hours, day boundaries) are applied in the services layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: String,
    pub bike_id: i64,
    pub location_id: i64,
    pub volunteer_id: i64,
    pub start_datetime: NaiveDateTime,
    pub end_datetime: NaiveDateTime,
    pub status: ReservationStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Booked,
    Completed,
    Canceled,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Booked => "BOOKED",
            ReservationStatus::Completed => "COMPLETED",
            ReservationStatus::Canceled => "CANCELED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "BOOKED" => Some(ReservationStatus::Booked),
            "COMPLETED" => Some(ReservationStatus::Completed),
            "CANCELED" => Some(ReservationStatus::Canceled),
            _ => None,
        }
    }
}
