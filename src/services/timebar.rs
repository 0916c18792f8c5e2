use chrono::{Duration, NaiveDate, NaiveTime};
use chrono_tz::Tz;
use rusqlite::Connection;
use serde::Serialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::services::availability::{self, TIME_INCREMENT_MINUTES};
use crate::services::clock;
use crate::services::hours::{self, DayHours};

#[derive(Debug, Clone, Serialize)]
pub struct TimebarSlot {
    pub time: String,
    pub available: bool,
    pub available_count: i64,
}

/// Slot grid for one location and date: every increment start gets the
/// number of bikes that could take a booking of `duration_minutes`
/// beginning there, using the same buffered-overlap rule the booking
/// validator applies.
///
/// Closed and unknown days produce the full-day grid with every slot
/// unavailable rather than an error, so clients always render a bar.
pub fn timebar(
    conn: &Connection,
    tz: Tz,
    location_id: i64,
    date: NaiveDate,
    duration_minutes: i64,
) -> Result<Vec<TimebarSlot>, AppError> {
    let (open_minute, close_minute, bookable) =
        match hours::resolve_hours(conn, location_id, date)? {
            Some(DayHours::Open { open, close }) => {
                (clock::minute_of_day(open), clock::minute_of_day(close), true)
            }
            Some(DayHours::Closed) | None => (0, 24 * 60, false),
        };

    let mut slots = vec![];
    let mut minute = open_minute;
    while minute < close_minute {
        let time = format!("{:02}:{:02}", minute / 60, minute % 60);
        let available_count = if bookable {
            slot_count(conn, tz, location_id, date, minute, close_minute, duration_minutes)?
        } else {
            0
        };
        slots.push(TimebarSlot {
            available: available_count > 0,
            available_count,
            time,
        });
        minute += TIME_INCREMENT_MINUTES;
    }

    Ok(slots)
}

fn slot_count(
    conn: &Connection,
    tz: Tz,
    location_id: i64,
    date: NaiveDate,
    minute: i64,
    close_minute: i64,
    duration_minutes: i64,
) -> Result<i64, AppError> {
    // A booking starting here must still end by closing time. Comparing
    // against the remaining minutes keeps an arbitrarily large duration
    // from overflowing the addition.
    if duration_minutes > close_minute - minute {
        return Ok(0);
    }

    let slot_time = NaiveTime::from_hms_opt((minute / 60) as u32, (minute % 60) as u32, 0);
    // Local times swallowed by a DST gap cannot be booked.
    let Some(start) = slot_time.and_then(|t| clock::local_to_utc(date, t, tz)) else {
        return Ok(0);
    };
    let end = start + Duration::minutes(duration_minutes);

    let (buffered_start, buffered_end) = availability::buffered_window(start, end);
    let count = queries::count_available_bikes(
        conn,
        location_id,
        &buffered_start.naive_utc(),
        &buffered_end.naive_utc(),
    )?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::{BikeStatus, HoursType, Reservation, ReservationStatus, Role};
    use chrono::{DateTime, TimeZone, Utc};

    const AMS: Tz = chrono_tz::Europe::Amsterdam;

    fn utc(s: &str) -> DateTime<Utc> {
        let naive = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap();
        Utc.from_utc_datetime(&naive)
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn setup() -> (Connection, i64) {
        let conn = db::init_db(":memory:").unwrap();
        let loc = queries::create_location(&conn, "Depot", None, HoursType::Scheduled).unwrap();
        for weekday in 0..7 {
            queries::upsert_weekly_hours(&conn, loc, weekday, false, Some("09:00"), Some("17:00"))
                .unwrap();
        }
        (conn, loc)
    }

    fn add_bike(conn: &Connection, loc: i64, code: &str) -> i64 {
        queries::create_bike(conn, code, None, loc, BikeStatus::Available, None).unwrap()
    }

    fn add_reservation(conn: &Connection, bike: i64, loc: i64, start: &str, end: &str) {
        let vol = queries::create_user(
            conn,
            &format!("v{bike}@example.org"),
            "Vol",
            Role::Volunteer,
            0,
        )
        .unwrap();
        let now = Utc::now().naive_utc();
        let reservation = Reservation {
            id: uuid::Uuid::new_v4().to_string(),
            bike_id: bike,
            location_id: loc,
            volunteer_id: vol,
            start_datetime: utc(start).naive_utc(),
            end_datetime: utc(end).naive_utc(),
            status: ReservationStatus::Booked,
            created_at: now,
            updated_at: now,
        };
        queries::create_reservation(conn, &reservation).unwrap();
    }

    fn slot<'a>(slots: &'a [TimebarSlot], time: &str) -> &'a TimebarSlot {
        slots.iter().find(|s| s.time == time).unwrap()
    }

    #[test]
    fn test_grid_spans_open_hours() {
        let (conn, loc) = setup();
        add_bike(&conn, loc, "DB-01");

        let slots = timebar(&conn, AMS, loc, date("2026-06-15"), 60).unwrap();
        // 09:00 through 16:30 in half-hour steps.
        assert_eq!(slots.len(), 16);
        assert_eq!(slots[0].time, "09:00");
        assert_eq!(slots[15].time, "16:30");
    }

    #[test]
    fn test_last_slots_cut_off_by_closing() {
        let (conn, loc) = setup();
        add_bike(&conn, loc, "DB-01");

        let slots = timebar(&conn, AMS, loc, date("2026-06-15"), 60).unwrap();
        // 16:00 + 60min ends exactly at close and is fine; 16:30 is not.
        assert!(slot(&slots, "16:00").available);
        assert!(!slot(&slots, "16:30").available);
        assert_eq!(slot(&slots, "16:30").available_count, 0);
    }

    #[test]
    fn test_reservation_blocks_buffered_slots() {
        let (conn, loc) = setup();
        let bike = add_bike(&conn, loc, "DB-01");
        // 10:00-11:00 local is 08:00-09:00 UTC in June.
        add_reservation(&conn, bike, loc, "2026-06-15 08:00", "2026-06-15 09:00");

        let slots = timebar(&conn, AMS, loc, date("2026-06-15"), 60).unwrap();
        // Anything whose buffered window touches 10:00-11:00 is out.
        assert!(!slot(&slots, "09:00").available);
        assert!(!slot(&slots, "10:30").available);
        assert!(!slot(&slots, "11:00").available);
        // Half an hour of turnaround after the ride is enough again.
        assert!(slot(&slots, "11:30").available);
        assert!(slot(&slots, "12:00").available);
    }

    #[test]
    fn test_counts_follow_fleet_size() {
        let (conn, loc) = setup();
        let bike = add_bike(&conn, loc, "DB-01");
        add_bike(&conn, loc, "DB-02");
        add_reservation(&conn, bike, loc, "2026-06-15 08:00", "2026-06-15 09:00");

        let slots = timebar(&conn, AMS, loc, date("2026-06-15"), 60).unwrap();
        // The second bike keeps the slot bookable.
        assert_eq!(slot(&slots, "10:00").available_count, 1);
        assert!(slot(&slots, "10:00").available);
        assert_eq!(slot(&slots, "12:00").available_count, 2);
    }

    #[test]
    fn test_out_of_service_bike_never_counts() {
        let (conn, loc) = setup();
        queries::create_bike(&conn, "DB-01", None, loc, BikeStatus::InRepair, None).unwrap();

        let slots = timebar(&conn, AMS, loc, date("2026-06-15"), 60).unwrap();
        assert!(slots.iter().all(|s| s.available_count == 0));
    }

    #[test]
    fn test_closed_day_renders_full_grid_unavailable() {
        let (conn, loc) = setup();
        add_bike(&conn, loc, "DB-01");
        queries::upsert_hour_exception(&conn, loc, date("2026-06-15"), true, None, None, None)
            .unwrap();

        let slots = timebar(&conn, AMS, loc, date("2026-06-15"), 60).unwrap();
        assert_eq!(slots.len(), 48);
        assert_eq!(slots[0].time, "00:00");
        assert_eq!(slots[47].time, "23:30");
        assert!(slots.iter().all(|s| !s.available && s.available_count == 0));
    }

    #[test]
    fn test_unknown_location_renders_full_grid_unavailable() {
        let conn = db::init_db(":memory:").unwrap();
        let slots = timebar(&conn, AMS, 999, date("2026-06-15"), 60).unwrap();
        assert_eq!(slots.len(), 48);
        assert!(slots.iter().all(|s| !s.available));
    }

    #[test]
    fn test_agrees_with_the_booking_validator() {
        let (conn, loc) = setup();
        let bike = add_bike(&conn, loc, "DB-01");
        add_reservation(&conn, bike, loc, "2026-06-15 08:00", "2026-06-15 09:00");

        let slots = timebar(&conn, AMS, loc, date("2026-06-15"), 60).unwrap();

        // 11:30 local is 09:30 UTC; the validator agrees it is free.
        assert!(slot(&slots, "11:30").available);
        assert!(availability::validate_reservation(
            &conn, AMS, bike, loc,
            utc("2026-06-15 09:30"), utc("2026-06-15 10:30"),
        )
        .is_ok());

        // 11:00 local is inside the buffer; the validator agrees.
        assert!(!slot(&slots, "11:00").available);
        assert!(availability::validate_reservation(
            &conn, AMS, bike, loc,
            utc("2026-06-15 09:00"), utc("2026-06-15 10:00"),
        )
        .is_err());
    }

    #[test]
    fn test_longer_duration_shrinks_availability() {
        let (conn, loc) = setup();
        add_bike(&conn, loc, "DB-01");

        let slots = timebar(&conn, AMS, loc, date("2026-06-15"), 120).unwrap();
        assert!(slot(&slots, "15:00").available); // ends 17:00
        assert!(!slot(&slots, "15:30").available); // would end 17:30
    }

    #[test]
    fn test_absurd_duration_yields_empty_grid_without_overflow() {
        let (conn, loc) = setup();
        add_bike(&conn, loc, "DB-01");

        let slots = timebar(&conn, AMS, loc, date("2026-06-15"), i64::MAX).unwrap();
        assert_eq!(slots.len(), 16);
        assert!(slots.iter().all(|s| !s.available && s.available_count == 0));
    }

    #[test]
    fn test_spring_forward_gap_slots_unavailable() {
        let (conn, loc) = setup();
        add_bike(&conn, loc, "DB-01");
        // Clocks jump 02:00 -> 03:00 on 2026-03-29; open the morning across it.
        queries::upsert_weekly_hours(&conn, loc, 6, false, Some("00:00"), Some("09:00")).unwrap();

        let slots = timebar(&conn, AMS, loc, date("2026-03-29"), 60).unwrap();
        assert_eq!(slots.len(), 18);
        assert!(slot(&slots, "01:30").available);
        // 02:00 and 02:30 never happen on this date.
        assert!(!slot(&slots, "02:00").available);
        assert_eq!(slot(&slots, "02:00").available_count, 0);
        assert!(!slot(&slots, "02:30").available);
        assert!(slot(&slots, "03:00").available);
    }
}
