use std::{fmt, str::FromStr};

use chrono::{Datelike, Local, NaiveDate};
use chrono_tz::Tz;

use crate::{Error, Result};

/// Genesis instance used when none is given
pub const DEFAULT_BASE_URL: &str = "https://students.livingston.org/livingston";
pub const DEFAULT_TIMEZONE: &str = "America/New_York";

/// Month/day the default fetch range starts on, in the first year
const DEFAULT_START: (u32, u32) = (9, 1);
/// Month/day the default fetch range ends on, in the second year
const DEFAULT_END: (u32, u32) = (6, 30);

/// Portal connection settings
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// Base URL of the Genesis instance, without trailing slash
    pub base_url: String,
    /// Per-request timeout in seconds; `None` waits indefinitely
    pub timeout: Option<u64>,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
        }
    }
}

/// School year written as two hyphen-separated years, e.g. "2024-2025"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchoolYear {
    pub start: i32,
    pub end: i32,
}

impl SchoolYear {
    pub fn new(start: i32) -> Self {
        Self {
            start,
            end: start + 1,
        }
    }

    /// The school year in progress today
    pub fn detect_current() -> Self {
        Self::detect_from_date(Local::now().date_naive())
    }

    /// September onward belongs to the year starting that autumn;
    /// January through August to the one that started the previous autumn.
    pub fn detect_from_date(date: NaiveDate) -> Self {
        match date.month() {
            9..=12 => Self::new(date.year()),
            _ => Self::new(date.year() - 1),
        }
    }
}

impl FromStr for SchoolYear {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (start, end) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| Error::Config(format!("Invalid school year '{s}', expected YYYY-YYYY")))?;

        let parse = |part: &str| {
            part.trim()
                .parse::<i32>()
                .map_err(|_| Error::Config(format!("Invalid year '{part}' in school year '{s}'")))
        };
        let (start, end) = (parse(start)?, parse(end)?);

        if end != start + 1 {
            return Err(Error::Config(format!(
                "School year '{s}' must span two consecutive years"
            )));
        }

        Ok(Self { start, end })
    }
}

impl fmt::Display for SchoolYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Inclusive range of calendar dates to fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Fill in missing bounds from the school year (Sep 1 .. Jun 30).
    pub fn resolve(
        year: SchoolYear,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Self> {
        let start = match start {
            Some(date) => date,
            None => NaiveDate::from_ymd_opt(year.start, DEFAULT_START.0, DEFAULT_START.1)
                .ok_or_else(|| Error::Config(format!("Invalid start year {}", year.start)))?,
        };
        let end = match end {
            Some(date) => date,
            None => NaiveDate::from_ymd_opt(year.end, DEFAULT_END.0, DEFAULT_END.1)
                .ok_or_else(|| Error::Config(format!("Invalid end year {}", year.end)))?,
        };

        if start > end {
            return Err(Error::Config(format!(
                "Start date {start} is after end date {end}"
            )));
        }

        Ok(Self { start, end })
    }

    /// Every date from `start` through `end`
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }

    pub fn len(&self) -> usize {
        usize::try_from((self.end - self.start).num_days() + 1).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Resolve an IANA timezone name such as "America/New_York".
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| Error::Timezone(name.to_string()))
}
