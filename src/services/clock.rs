use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

/// Calendar date of an instant in the project time zone.
pub fn local_date(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// Wall-clock time of an instant in the project time zone.
pub fn local_time(instant: DateTime<Utc>, tz: Tz) -> NaiveTime {
    instant.with_timezone(&tz).time()
}

pub fn same_local_day(a: DateTime<Utc>, b: DateTime<Utc>, tz: Tz) -> bool {
    local_date(a, tz) == local_date(b, tz)
}

/// Weekday index with Monday as 0 and Sunday as 6, matching the
/// weekly-hours rows.
pub fn weekday_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_monday() as u8
}

/// True when the zoned wall-clock time sits on an increment boundary
/// with zero seconds.
pub fn is_aligned(instant: DateTime<Utc>, tz: Tz, increment_minutes: i64) -> bool {
    let local = instant.with_timezone(&tz);
    local.minute() as i64 % increment_minutes == 0 && local.second() == 0
}

pub fn minute_of_day(t: NaiveTime) -> i64 {
    t.hour() as i64 * 60 + t.minute() as i64
}

/// UTC instant for a local wall-clock time on a date. A spring-forward gap
/// has no such instant and yields `None`; an ambiguous fall-back time
/// resolves to the earlier offset.
pub fn local_to_utc(date: NaiveDate, time: NaiveTime, tz: Tz) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&date.and_time(time))
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    const AMS: Tz = chrono_tz::Europe::Amsterdam;

    fn utc(s: &str) -> DateTime<Utc> {
        let naive = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap();
        Utc.from_utc_datetime(&naive)
    }

    #[test]
    fn test_local_date_crosses_midnight() {
        // 23:30 UTC in June is 01:30 next day in Amsterdam (UTC+2).
        let instant = utc("2026-06-15 23:30:00");
        assert_eq!(
            local_date(instant, AMS),
            NaiveDate::from_ymd_opt(2026, 6, 16).unwrap()
        );
        assert_eq!(instant.date_naive(), NaiveDate::from_ymd_opt(2026, 6, 15).unwrap());
    }

    #[test]
    fn test_same_local_day_differs_from_utc_day() {
        let a = utc("2026-06-15 21:00:00"); // 23:00 local
        let b = utc("2026-06-15 22:30:00"); // 00:30 local, next day
        assert!(!same_local_day(a, b, AMS));
        assert!(same_local_day(a, utc("2026-06-15 21:30:00"), AMS));
    }

    #[test]
    fn test_weekday_index_monday_is_zero() {
        assert_eq!(weekday_index(NaiveDate::from_ymd_opt(2026, 6, 15).unwrap()), 0); // Monday
        assert_eq!(weekday_index(NaiveDate::from_ymd_opt(2026, 6, 21).unwrap()), 6); // Sunday
    }

    #[test]
    fn test_alignment_uses_local_minutes() {
        assert!(is_aligned(utc("2026-06-15 08:00:00"), AMS, 30));
        assert!(is_aligned(utc("2026-06-15 08:30:00"), AMS, 30));
        assert!(!is_aligned(utc("2026-06-15 08:15:00"), AMS, 30));
        assert!(!is_aligned(utc("2026-06-15 08:30:01"), AMS, 30));
    }

    #[test]
    fn test_local_to_utc_summer_offset() {
        let date = NaiveDate::from_ymd_opt(2026, 6, 15).unwrap();
        let time = NaiveTime::from_hms_opt(10, 0, 0).unwrap();
        assert_eq!(local_to_utc(date, time, AMS), Some(utc("2026-06-15 08:00:00")));
    }

    #[test]
    fn test_local_to_utc_dst_gap_is_none() {
        // Clocks jump 02:00 -> 03:00 on 2026-03-29 in Amsterdam.
        let date = NaiveDate::from_ymd_opt(2026, 3, 29).unwrap();
        let gap = NaiveTime::from_hms_opt(2, 30, 0).unwrap();
        assert_eq!(local_to_utc(date, gap, AMS), None);
    }
}
