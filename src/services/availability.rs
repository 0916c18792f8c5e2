use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::BikeStatus;
use crate::services::clock;
use crate::services::hours::{self, DayHours};

pub const MIN_BOOKING_MINUTES: i64 = 60;
pub const BUFFER_MINUTES: i64 = 30;
pub const TIME_INCREMENT_MINUTES: i64 = 30;

/// Why a requested slot was turned down. The `Display` strings are part
/// of the API contract; `code` gives clients a stable machine tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    TooShort,
    Misaligned,
    MultiDay,
    HoursNotFound,
    LocationClosed,
    OutsideHours {
        open: chrono::NaiveTime,
        close: chrono::NaiveTime,
    },
    BikeNotFound,
    BikeUnavailable {
        status: BikeStatus,
    },
    TimeConflict,
}

impl RejectReason {
    pub fn code(&self) -> &'static str {
        match self {
            RejectReason::TooShort => "minimum_duration",
            RejectReason::Misaligned => "misaligned",
            RejectReason::MultiDay => "multi_day",
            RejectReason::HoursNotFound => "hours_not_found",
            RejectReason::LocationClosed => "closed",
            RejectReason::OutsideHours { .. } => "outside_hours",
            RejectReason::BikeNotFound => "bike_not_found",
            RejectReason::BikeUnavailable { .. } => "bike_unavailable",
            RejectReason::TimeConflict => "time_conflict",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::TooShort => {
                write!(f, "Minimum booking duration is {MIN_BOOKING_MINUTES} minutes")
            }
            RejectReason::Misaligned => {
                write!(
                    f,
                    "Times must align to {TIME_INCREMENT_MINUTES}-minute increments"
                )
            }
            RejectReason::MultiDay => write!(f, "Reservations cannot span multiple days"),
            RejectReason::HoursNotFound => write!(f, "Location hours not found"),
            RejectReason::LocationClosed => write!(f, "Location is closed on this date"),
            RejectReason::OutsideHours { open, close } => write!(
                f,
                "Reservation must be within location hours ({} - {})",
                open.format("%H:%M"),
                close.format("%H:%M")
            ),
            RejectReason::BikeNotFound => write!(f, "Bike not found"),
            RejectReason::BikeUnavailable { status } => write!(f, "Bike is {}", status.as_str()),
            RejectReason::TimeConflict => write!(f, "Bike is not available during this time"),
        }
    }
}

impl std::error::Error for RejectReason {}

/// Duration, alignment and same-local-day checks. Pure; no database.
pub fn check_slot(tz: Tz, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), RejectReason> {
    if end.signed_duration_since(start) < Duration::minutes(MIN_BOOKING_MINUTES) {
        return Err(RejectReason::TooShort);
    }
    if !clock::is_aligned(start, tz, TIME_INCREMENT_MINUTES)
        || !clock::is_aligned(end, tz, TIME_INCREMENT_MINUTES)
    {
        return Err(RejectReason::Misaligned);
    }
    if !clock::same_local_day(start, end, tz) {
        return Err(RejectReason::MultiDay);
    }
    Ok(())
}

pub fn check_opening_hours(
    conn: &Connection,
    tz: Tz,
    location_id: i64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<(), AppError> {
    let date = clock::local_date(start, tz);
    match hours::resolve_hours(conn, location_id, date)? {
        None => Err(RejectReason::HoursNotFound.into()),
        Some(DayHours::Closed) => Err(RejectReason::LocationClosed.into()),
        Some(DayHours::Open { open, close }) => {
            let start_local = clock::local_time(start, tz);
            let end_local = clock::local_time(end, tz);
            if start_local < open || end_local > close {
                return Err(RejectReason::OutsideHours { open, close }.into());
            }
            Ok(())
        }
    }
}

pub fn check_bike(conn: &Connection, bike_id: i64) -> Result<(), AppError> {
    let Some(bike) = queries::get_bike(conn, bike_id)? else {
        return Err(RejectReason::BikeNotFound.into());
    };
    if bike.status != BikeStatus::Available {
        return Err(RejectReason::BikeUnavailable {
            status: bike.status,
        }
        .into());
    }
    Ok(())
}

/// The candidate window widened by the turnaround buffer on both sides.
pub fn buffered_window(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> (DateTime<Utc>, DateTime<Utc>) {
    (
        start - Duration::minutes(BUFFER_MINUTES),
        end + Duration::minutes(BUFFER_MINUTES),
    )
}

pub fn check_conflicts(
    conn: &Connection,
    bike_id: i64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<(), AppError> {
    let (buffered_start, buffered_end) = buffered_window(start, end);
    let conflict = queries::has_conflicting_reservation(
        conn,
        bike_id,
        &buffered_start.naive_utc(),
        &buffered_end.naive_utc(),
    )?;
    if conflict {
        return Err(RejectReason::TimeConflict.into());
    }
    Ok(())
}

/// Full pre-booking validation in contract order: slot shape, opening
/// hours, bike status, then overlap. The first failure wins so clients
/// always see the most specific reason.
pub fn validate_reservation(
    conn: &Connection,
    tz: Tz,
    bike_id: i64,
    location_id: i64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<(), AppError> {
    check_slot(tz, start, end)?;
    check_opening_hours(conn, tz, location_id, start, end)?;
    check_bike(conn, bike_id)?;
    check_conflicts(conn, bike_id, start, end)?;
    Ok(())
}
