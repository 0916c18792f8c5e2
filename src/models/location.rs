use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: i64,
    pub name: String,
    pub address: Option<String>,
    pub hours_type: HoursType,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HoursType {
    Scheduled,
    AlwaysOpen,
}

impl HoursType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HoursType::Scheduled => "SCHEDULED",
            HoursType::AlwaysOpen => "ALWAYS_OPEN",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SCHEDULED" => Some(HoursType::Scheduled),
            "ALWAYS_OPEN" => Some(HoursType::AlwaysOpen),
            _ => None,
        }
    }
}

/// Regular hours for one weekday. Weekday 0 is Monday, 6 is Sunday.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyHours {
    pub id: i64,
    pub location_id: i64,
    pub weekday: u8,
    pub is_closed: bool,
    pub open_time: Option<String>,
    pub close_time: Option<String>,
}

/// Date-specific override that replaces the weekly row for that date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourException {
    pub id: i64,
    pub location_id: i64,
    pub date: NaiveDate,
    pub is_closed: bool,
    pub open_time: Option<String>,
    pub close_time: Option<String>,
    pub reason: Option<String>,
}
