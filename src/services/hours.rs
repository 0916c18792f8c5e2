use chrono::{NaiveDate, NaiveTime};
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::HoursType;
use crate::services::clock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayHours {
    Open { open: NaiveTime, close: NaiveTime },
    Closed,
}

/// Effective opening hours for a location on a calendar date.
///
/// An ALWAYS_OPEN location is open the whole day regardless of any hour
/// rows. Otherwise an exception row for the exact date fully decides the
/// day, else the weekly row for that weekday (Monday = 0) decides.
/// `None` means no hours are known: unknown location, no matching row,
/// or a non-closed row without usable open/close bounds.
pub fn resolve_hours(
    conn: &Connection,
    location_id: i64,
    date: NaiveDate,
) -> Result<Option<DayHours>, AppError> {
    let Some(location) = queries::get_location(conn, location_id)? else {
        return Ok(None);
    };

    if location.hours_type == HoursType::AlwaysOpen {
        return Ok(day_from_bounds(false, Some("00:00"), Some("23:59:59")));
    }

    if let Some(exception) = queries::get_hour_exception(conn, location_id, date)? {
        return Ok(day_from_bounds(
            exception.is_closed,
            exception.open_time.as_deref(),
            exception.close_time.as_deref(),
        ));
    }

    let weekday = clock::weekday_index(date);
    if let Some(weekly) = queries::get_weekly_hours(conn, location_id, weekday)? {
        return Ok(day_from_bounds(
            weekly.is_closed,
            weekly.open_time.as_deref(),
            weekly.close_time.as_deref(),
        ));
    }

    Ok(None)
}

fn day_from_bounds(is_closed: bool, open: Option<&str>, close: Option<&str>) -> Option<DayHours> {
    if is_closed {
        return Some(DayHours::Closed);
    }
    let open = parse_bound(open?)?;
    let close = parse_bound(close?)?;
    Some(DayHours::Open { open, close })
}

// Hour bounds are stored as "HH:MM"; "HH:MM:SS" is accepted too.
pub(crate) fn parse_bound(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::HoursType;

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn time(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M:%S").unwrap()
    }

    #[test]
    fn test_unknown_location_has_no_hours() {
        let conn = setup_db();
        let resolved = resolve_hours(&conn, 999, date("2026-06-15")).unwrap();
        assert_eq!(resolved, None);
    }

    #[test]
    fn test_no_rows_means_no_hours() {
        let conn = setup_db();
        let loc =
            queries::create_location(&conn, "Depot", None, HoursType::Scheduled).unwrap();
        let resolved = resolve_hours(&conn, loc, date("2026-06-15")).unwrap();
        assert_eq!(resolved, None);
    }

    #[test]
    fn test_weekly_row_applies_on_its_weekday() {
        let conn = setup_db();
        let loc =
            queries::create_location(&conn, "Depot", None, HoursType::Scheduled).unwrap();
        // 2026-06-15 is a Monday.
        queries::upsert_weekly_hours(&conn, loc, 0, false, Some("09:00"), Some("17:00")).unwrap();

        let resolved = resolve_hours(&conn, loc, date("2026-06-15")).unwrap();
        assert_eq!(
            resolved,
            Some(DayHours::Open {
                open: time("09:00:00"),
                close: time("17:00:00"),
            })
        );

        // Tuesday has no row.
        assert_eq!(resolve_hours(&conn, loc, date("2026-06-16")).unwrap(), None);
    }

    #[test]
    fn test_closed_weekly_row() {
        let conn = setup_db();
        let loc =
            queries::create_location(&conn, "Depot", None, HoursType::Scheduled).unwrap();
        queries::upsert_weekly_hours(&conn, loc, 0, true, None, None).unwrap();

        let resolved = resolve_hours(&conn, loc, date("2026-06-15")).unwrap();
        assert_eq!(resolved, Some(DayHours::Closed));
    }

    #[test]
    fn test_exception_overrides_weekly_row() {
        let conn = setup_db();
        let loc =
            queries::create_location(&conn, "Depot", None, HoursType::Scheduled).unwrap();
        queries::upsert_weekly_hours(&conn, loc, 0, true, None, None).unwrap();
        // The Monday is normally closed, but this one opens for a morning.
        queries::upsert_hour_exception(
            &conn,
            loc,
            date("2026-06-15"),
            false,
            Some("10:00"),
            Some("13:00"),
            Some("volunteer day"),
        )
        .unwrap();

        let resolved = resolve_hours(&conn, loc, date("2026-06-15")).unwrap();
        assert_eq!(
            resolved,
            Some(DayHours::Open {
                open: time("10:00:00"),
                close: time("13:00:00"),
            })
        );

        // The following Monday falls back to the weekly row.
        assert_eq!(
            resolve_hours(&conn, loc, date("2026-06-22")).unwrap(),
            Some(DayHours::Closed)
        );
    }

    #[test]
    fn test_closing_exception_overrides_open_weekly_row() {
        let conn = setup_db();
        let loc =
            queries::create_location(&conn, "Depot", None, HoursType::Scheduled).unwrap();
        queries::upsert_weekly_hours(&conn, loc, 0, false, Some("09:00"), Some("17:00")).unwrap();
        queries::upsert_hour_exception(&conn, loc, date("2026-06-15"), true, None, None, None)
            .unwrap();

        let resolved = resolve_hours(&conn, loc, date("2026-06-15")).unwrap();
        assert_eq!(resolved, Some(DayHours::Closed));
    }

    #[test]
    fn test_always_open_ignores_hour_rows() {
        let conn = setup_db();
        let loc =
            queries::create_location(&conn, "Hub", None, HoursType::AlwaysOpen).unwrap();
        queries::upsert_weekly_hours(&conn, loc, 0, true, None, None).unwrap();
        queries::upsert_hour_exception(&conn, loc, date("2026-06-15"), true, None, None, None)
            .unwrap();

        let resolved = resolve_hours(&conn, loc, date("2026-06-15")).unwrap();
        assert_eq!(
            resolved,
            Some(DayHours::Open {
                open: time("00:00:00"),
                close: time("23:59:59"),
            })
        );
    }

    #[test]
    fn test_open_row_without_bounds_resolves_to_none() {
        let conn = setup_db();
        let loc =
            queries::create_location(&conn, "Depot", None, HoursType::Scheduled).unwrap();
        queries::upsert_weekly_hours(&conn, loc, 0, false, None, None).unwrap();

        assert_eq!(resolve_hours(&conn, loc, date("2026-06-15")).unwrap(), None);
    }

    #[test]
    fn test_upsert_replaces_weekly_row() {
        let conn = setup_db();
        let loc =
            queries::create_location(&conn, "Depot", None, HoursType::Scheduled).unwrap();
        queries::upsert_weekly_hours(&conn, loc, 0, false, Some("09:00"), Some("17:00")).unwrap();
        queries::upsert_weekly_hours(&conn, loc, 0, false, Some("08:00"), Some("12:00")).unwrap();

        let rows = queries::list_weekly_hours(&conn, loc).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].open_time.as_deref(), Some("08:00"));

        let resolved = resolve_hours(&conn, loc, date("2026-06-15")).unwrap();
        assert_eq!(
            resolved,
            Some(DayHours::Open {
                open: time("08:00:00"),
                close: time("12:00:00"),
            })
        );
    }
}
