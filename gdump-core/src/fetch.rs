//! Concurrent per-day fetching.
//!
//! Every date becomes its own task that fetches, extracts and refines one day
//! and returns a [`ScheduleDay`]. Results are merged once tasks finish; the
//! order of days in the output is unspecified.

use std::{num::NonZeroUsize, sync::Arc};

use chrono::NaiveDate;
use chrono_tz::Tz;
use tokio::task::JoinSet;

use crate::{
    Error, RefinedCourseRow, Result, ScheduleDay, Session,
    config::DateRange,
    extract::ScheduleExtractor,
    portal::ScheduleSource,
    refine::{SCHEDULE_DATE_FORMAT, refine_rows},
};

/// Matches the usual thread-pool default: cores + 4, at most 32.
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map_or(1, NonZeroUsize::get)
        .saturating_add(4)
        .min(32)
}

/// Called once for every day that finishes successfully
pub type ProgressHook = Arc<dyn Fn(&ScheduleDay) + Send + Sync>;

/// Fetches and processes a range of days from a [`ScheduleSource`]
pub struct Fetcher {
    source: Arc<dyn ScheduleSource>,
    extractor: Arc<dyn ScheduleExtractor>,
    timezone: Tz,
    concurrency: usize,
    progress: Option<ProgressHook>,
}

impl Fetcher {
    /// Fetcher with [`default_concurrency`] workers
    pub fn new(
        source: Arc<dyn ScheduleSource>,
        extractor: Arc<dyn ScheduleExtractor>,
        timezone: Tz,
    ) -> Self {
        Self {
            source,
            extractor,
            timezone,
            concurrency: default_concurrency(),
            progress: None,
        }
    }

    /// Cap the number of days fetched at once (minimum 1)
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Report each finished day, e.g. to drive a progress bar
    pub fn on_progress(mut self, hook: impl Fn(&ScheduleDay) + Send + Sync + 'static) -> Self {
        self.progress = Some(Arc::new(hook));
        self
    }

    /// Fetch every day in `range`.
    ///
    /// The first failing day aborts all queued and in-flight days and its
    /// error is returned.
    pub async fn fetch_range(&self, session: &Session, range: DateRange) -> Result<Vec<ScheduleDay>> {
        tracing::info!(
            "Fetching {} days ({} to {}) from {} with {} workers",
            range.len(),
            range.start,
            range.end,
            self.source.name(),
            self.concurrency
        );

        let session = Arc::new(session.clone());
        let mut dates = range.days();
        let mut tasks = JoinSet::new();
        let mut days = Vec::with_capacity(range.len());

        for date in dates.by_ref().take(self.concurrency) {
            self.spawn_day(&mut tasks, &session, date);
        }

        while let Some(joined) = tasks.join_next().await {
            let day = joined.map_err(|e| Error::Internal(format!("Fetch task failed: {e}")))?;
            match day {
                Ok(day) => {
                    if let Some(progress) = &self.progress {
                        progress(&day);
                    }
                    days.push(day);
                }
                Err(e) => {
                    tracing::error!("Aborting fetch: {}", e);
                    return Err(e);
                }
            }

            if let Some(date) = dates.next() {
                self.spawn_day(&mut tasks, &session, date);
            }
        }

        tracing::info!(
            "Fetched {} days, {} with classes",
            days.len(),
            days.iter().filter(|d| d.contributes()).count()
        );

        Ok(days)
    }

    fn spawn_day(
        &self,
        tasks: &mut JoinSet<Result<ScheduleDay>>,
        session: &Arc<Session>,
        date: NaiveDate,
    ) {
        let source = Arc::clone(&self.source);
        let extractor = Arc::clone(&self.extractor);
        let session = Arc::clone(session);
        let timezone = self.timezone;

        tasks.spawn(async move {
            let markup = source.fetch_day(&session, date).await?;
            process_day(extractor.as_ref(), date, &markup, timezone)
        });
    }
}

/// Extract and refine one fetched page.
///
/// Closed and scheduleless days come back with no rows.
pub fn process_day(
    extractor: &dyn ScheduleExtractor,
    date: NaiveDate,
    markup: &str,
    timezone: Tz,
) -> Result<ScheduleDay> {
    let parsed = extractor.extract(markup);

    if !parsed.state.is_open() || parsed.rows.is_empty() {
        tracing::debug!("{}: {}, skipping", date, parsed.state.label());
        return Ok(ScheduleDay::skipped(date, parsed.state));
    }

    let schedule_date = date.format(SCHEDULE_DATE_FORMAT).to_string();
    if parsed.date != schedule_date {
        tracing::warn!(
            "{}: page reports date '{}', using the requested date",
            date,
            parsed.date
        );
    }

    let rows = refine_rows(&schedule_date, parsed.rows, timezone).inspect_err(|e| {
        tracing::error!("{}: failed to read schedule times: {}", date, e);
    })?;
    tracing::debug!("{}: {} with {} rows", date, parsed.state.label(), rows.len());

    Ok(ScheduleDay {
        date,
        state: parsed.state,
        rows,
    })
}

/// Rows of every day that contributes to the calendar
pub fn contributing_rows(days: &[ScheduleDay]) -> impl Iterator<Item = &RefinedCourseRow> {
    days.iter()
        .filter(|day| day.contributes())
        .flat_map(|day| day.rows.iter())
}
