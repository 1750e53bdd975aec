use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone};
use chrono_tz::Tz;

use crate::{Error, RawCourseRow, RefinedCourseRow, Result};

/// Date format of the `scheduleDate` parameter and the schedule header
pub const SCHEDULE_DATE_FORMAT: &str = "%m/%d/%Y";
/// 12-hour wall-clock format used by the bell schedule, e.g. "8:05AM"
pub const SCHEDULE_TIME_FORMAT: &str = "%I:%M%p";

/// Parse a `MM/DD/YYYY` schedule date
pub fn parse_schedule_date(date: &str) -> Result<NaiveDate> {
    let date = date.trim();
    NaiveDate::parse_from_str(date, SCHEDULE_DATE_FORMAT).map_err(|e| Error::date_time(date, e))
}

/// Parse a bell time such as "8:05AM"
pub fn parse_schedule_time(time: &str) -> Result<NaiveTime> {
    let time = time.trim();
    NaiveTime::parse_from_str(time, SCHEDULE_TIME_FORMAT).map_err(|e| Error::date_time(time, e))
}

/// Anchor every row of one day to `date` (MM/DD/YYYY) in `tz`, keeping order.
///
/// A single malformed time fails the whole day.
pub fn refine_rows(date: &str, rows: Vec<RawCourseRow>, tz: Tz) -> Result<Vec<RefinedCourseRow>> {
    let date = parse_schedule_date(date)?;
    refine_rows_on(date, rows, tz)
}

/// Same as [`refine_rows`] with an already parsed date
pub fn refine_rows_on(
    date: NaiveDate,
    rows: Vec<RawCourseRow>,
    tz: Tz,
) -> Result<Vec<RefinedCourseRow>> {
    rows.into_iter()
        .map(|row| {
            let start_time = localize(date.and_time(parse_schedule_time(&row.start_time)?), tz);
            let end_time = localize(date.and_time(parse_schedule_time(&row.end_time)?), tz);

            Ok(RefinedCourseRow {
                block: row.block,
                start_time,
                end_time,
                course_name: row.course_name,
                teacher: row.teacher,
                room: row.room,
                color: row.color,
            })
        })
        .collect()
}

/// Attach `tz` to a wall-clock time.
///
/// Repeated times at a fall-back transition resolve to standard time (the
/// later instant). Times skipped by a spring-forward transition keep the
/// offset that was in effect before the gap.
pub fn localize(naive: NaiveDateTime, tz: Tz) -> DateTime<Tz> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(_, standard) => standard,
        LocalResult::None => {
            let before_gap = tz
                .offset_from_utc_datetime(&(naive - Duration::days(1)))
                .fix();
            tz.from_utc_datetime(&(naive - before_gap))
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Timelike};

    use super::*;

    fn row(start: &str, end: &str) -> RawCourseRow {
        RawCourseRow {
            block: "1".to_string(),
            start_time: start.to_string(),
            end_time: end.to_string(),
            course_name: "ap biology".to_string(),
            teacher: "Smith".to_string(),
            room: "204".to_string(),
            color: "#aabbcc".to_string(),
        }
    }

    #[test]
    fn test_refine_daylight_time() {
        let refined = refine_rows(
            "09/03/2024",
            vec![row("8:05AM", "8:55AM")],
            Tz::America__New_York,
        )
        .unwrap();

        let course = &refined[0];
        assert_eq!(
            (course.start_time.year(), course.start_time.month(), course.start_time.day()),
            (2024, 9, 3)
        );
        assert_eq!((course.start_time.hour(), course.start_time.minute()), (8, 5));
        assert_eq!((course.end_time.hour(), course.end_time.minute()), (8, 55));
        assert_eq!(course.start_time.offset().fix().local_minus_utc(), -4 * 3600);
        assert_eq!(course.room, "204");
    }

    #[test]
    fn test_refine_standard_time_and_afternoon() {
        let refined = refine_rows(
            "12/02/2024",
            vec![row("12:30PM", "1:15PM")],
            Tz::America__New_York,
        )
        .unwrap();

        let course = &refined[0];
        assert_eq!((course.start_time.hour(), course.start_time.minute()), (12, 30));
        assert_eq!((course.end_time.hour(), course.end_time.minute()), (13, 15));
        assert_eq!(course.start_time.offset().fix().local_minus_utc(), -5 * 3600);
    }

    #[test]
    fn test_refine_keeps_order() {
        let refined = refine_rows(
            "09/03/2024",
            vec![row("10:00AM", "10:50AM"), row("8:05AM", "8:55AM")],
            Tz::America__New_York,
        )
        .unwrap();

        assert_eq!(refined[0].start_time.hour(), 10);
        assert_eq!(refined[1].start_time.hour(), 8);
    }

    #[test]
    fn test_malformed_time_fails_the_day() {
        let result = refine_rows(
            "09/03/2024",
            vec![row("8:05AM", "8:55AM"), row("8:05", "8:55AM")],
            Tz::America__New_York,
        );
        assert!(matches!(result, Err(Error::DateTime { ref value, .. }) if value == "8:05"));
    }

    #[test]
    fn test_malformed_date_fails() {
        let result = refine_rows("2024-09-03", vec![row("8:05AM", "8:55AM")], Tz::UTC);
        assert!(matches!(result, Err(Error::DateTime { .. })));
    }

    #[test]
    fn test_localize_transitions() {
        let tz = Tz::America__New_York;

        // 2024-11-03 01:30 happens twice; standard time is UTC-5
        let ambiguous = NaiveDate::from_ymd_opt(2024, 11, 3)
            .unwrap()
            .and_hms_opt(1, 30, 0)
            .unwrap();
        assert_eq!(localize(ambiguous, tz).offset().fix().local_minus_utc(), -5 * 3600);

        // 2024-03-10 02:30 never happens; read with the pre-gap offset
        let skipped = NaiveDate::from_ymd_opt(2024, 3, 10)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        let dt = localize(skipped, tz);
        assert_eq!(dt.naive_utc().hour(), 7);
        assert_eq!(dt.minute(), 30);
    }
}
