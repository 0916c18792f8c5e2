use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bike {
    pub id: i64,
    pub code: String,
    pub name: Option<String>,
    pub location_id: i64,
    pub status: BikeStatus,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BikeStatus {
    Available,
    OutOfService,
    InRepair,
    Retired,
}

impl BikeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BikeStatus::Available => "AVAILABLE",
            BikeStatus::OutOfService => "OUT_OF_SERVICE",
            BikeStatus::InRepair => "IN_REPAIR",
            BikeStatus::Retired => "RETIRED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "AVAILABLE" => Some(BikeStatus::Available),
            "OUT_OF_SERVICE" => Some(BikeStatus::OutOfService),
            "IN_REPAIR" => Some(BikeStatus::InRepair),
            "RETIRED" => Some(BikeStatus::Retired),
            _ => None,
        }
    }
}
