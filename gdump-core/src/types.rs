use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Label the portal shows for a day the school is closed
pub const SCHOOL_CLOSED: &str = "School Closed";
/// Label used when a page carries no recognizable schedule
pub const NO_SCHEDULE: &str = "No Schedule";

/// One schedule row as scraped from the page, all strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCourseRow {
    /// Period slot, e.g. "Period 3"
    pub block: String,
    /// Wall-clock start, e.g. "8:05AM"
    pub start_time: String,
    /// Wall-clock end
    pub end_time: String,
    pub course_name: String,
    pub teacher: String,
    pub room: String,
    /// Hex color from the course block, may be empty
    pub color: String,
}

/// A schedule row anchored to its calendar date in a concrete timezone
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefinedCourseRow {
    pub block: String,
    pub start_time: DateTime<Tz>,
    pub end_time: DateTime<Tz>,
    pub course_name: String,
    pub teacher: String,
    pub room: String,
    pub color: String,
}

/// State of one day's schedule page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleState {
    Closed,
    NoSchedule,
    /// A regular schedule, carrying its display name (e.g. "Day 1")
    Named(String),
}

impl ScheduleState {
    /// Map a schedule label to a state; the sentinel labels map to their states.
    pub fn from_label(label: &str) -> Self {
        match label {
            SCHOOL_CLOSED => Self::Closed,
            NO_SCHEDULE => Self::NoSchedule,
            name => Self::Named(name.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Closed => SCHOOL_CLOSED,
            Self::NoSchedule => NO_SCHEDULE,
            Self::Named(name) => name,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Self::Named(_))
    }
}

/// Result of extracting one day's markup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSchedule {
    pub state: ScheduleState,
    /// Date embedded in the schedule header (MM/DD/YYYY), empty unless named
    pub date: String,
    pub rows: Vec<RawCourseRow>,
}

impl ParsedSchedule {
    pub fn closed() -> Self {
        Self {
            state: ScheduleState::Closed,
            date: String::new(),
            rows: Vec::new(),
        }
    }

    pub fn no_schedule() -> Self {
        Self {
            state: ScheduleState::NoSchedule,
            date: String::new(),
            rows: Vec::new(),
        }
    }
}

/// One fetched calendar date with its refined rows
#[derive(Debug, Clone)]
pub struct ScheduleDay {
    pub date: NaiveDate,
    pub state: ScheduleState,
    pub rows: Vec<RefinedCourseRow>,
}

impl ScheduleDay {
    pub fn skipped(date: NaiveDate, state: ScheduleState) -> Self {
        Self {
            date,
            state,
            rows: Vec::new(),
        }
    }

    /// Whether this day adds events to the calendar
    pub fn contributes(&self) -> bool {
        self.state.is_open() && !self.rows.is_empty()
    }
}

/// Authenticated portal session, shared read-only by all fetch tasks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// `JSESSIONID` cookie value
    pub session_id: String,
    pub student_id: String,
}

/// Login credentials for the portal
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// One calendar entry built from a refined row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarEvent {
    /// "<category tag> <cased course name>"
    pub title: String,
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    pub description: String,
    pub location: String,
    /// Upper-cased hex color, empty if the row had none
    pub color: String,
}

/// The whole calendar for one run
#[derive(Debug, Clone, Default, Serialize)]
pub struct CalendarDocument {
    /// Display name (`X-WR-CALNAME`)
    pub name: String,
    pub events: Vec<CalendarEvent>,
}
