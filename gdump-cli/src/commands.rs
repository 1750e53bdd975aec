use std::{fs, sync::Arc};

use anyhow::{Result, bail};
use chrono::NaiveDate;
use gdump_core::prelude::*;
use indicatif::{ProgressBar, ProgressStyle};

const BAR_TEMPLATE: &str = "{msg:>10} [{bar:40.cyan/blue}] {pos}/{len} ({percent}%)";

fn progress_bar(len: usize, message: &'static str) -> Result<ProgressBar> {
    let bar = ProgressBar::new(len as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template(BAR_TEMPLATE)?
            .progress_chars("█▓▒░  "),
    );
    bar.set_message(message);
    Ok(bar)
}

/// Arguments of the generate command
pub struct GenerateParams {
    pub base_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub session_id: Option<String>,
    pub student_id: Option<String>,
    pub school_year: Option<SchoolYear>,
    pub timezone: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub output: Option<String>,
    pub concurrency: Option<usize>,
    pub timeout: Option<u64>,
}

/// Fetch the schedule and write the ICS file
pub async fn generate_command(params: GenerateParams) -> Result<()> {
    println!("Genesis Dumper 📆");
    println!("Using URL: {}", params.base_url);
    println!("To change the URL, use the --base-url flag");

    // Validate everything local before touching the network
    let timezone = parse_timezone(&params.timezone)?;
    let school_year = match params.school_year {
        Some(year) => {
            tracing::info!("Using school year {}", year);
            year
        }
        None => {
            let year = SchoolYear::detect_current();
            tracing::info!("Detected school year {}", year);
            year
        }
    };
    let range = DateRange::resolve(school_year, params.start_date, params.end_date)?;

    let portal = Arc::new(GenesisPortal::new(&PortalConfig {
        base_url: params.base_url,
        timeout: params.timeout,
    })?);

    let session = match (params.session_id, params.student_id) {
        (Some(session_id), Some(student_id)) => Session {
            session_id,
            student_id,
        },
        (Some(_), None) => bail!("--student-id is required with --session-id"),
        (None, student_id) => {
            let (Some(username), Some(password)) = (params.username, params.password) else {
                bail!("Pass --username and --password, or --session-id and --student-id");
            };

            println!("Logging in...");
            let mut session = portal
                .authenticate(&Credentials { username, password })
                .await?;
            if let Some(student_id) = student_id {
                session.student_id = student_id;
            }
            println!("✓ Logged in as student {}", session.student_id);
            session
        }
    };

    println!(
        "Fetching schedules from {} to {}...",
        range.start, range.end
    );
    let fetch_bar = progress_bar(range.len(), "Fetching")?;

    let tick = fetch_bar.clone();
    let mut fetcher = Fetcher::new(portal, Arc::new(GenesisExtractor::new()), timezone)
        .on_progress(move |_| tick.inc(1));
    if let Some(concurrency) = params.concurrency {
        fetcher = fetcher.with_concurrency(concurrency);
    }

    let days = fetcher
        .fetch_range(&session, range)
        .await
        .inspect_err(|_| fetch_bar.abandon())?;
    fetch_bar.finish_and_clear();
    let closed = days
        .iter()
        .filter(|d| d.state == ScheduleState::Closed)
        .count();
    let with_classes = days.iter().filter(|d| d.contributes()).count();
    println!(
        "✓ Schedule fetching complete! {} days with classes, {} closed",
        with_classes, closed
    );

    let calendar_name = format!(
        "Schedule for Student {} ({})",
        session.student_id, school_year
    );
    let rows: Vec<_> = contributing_rows(&days).collect();
    let save_bar = progress_bar(rows.len(), "Saving")?;
    let mut calendar = CalendarDocument::new(calendar_name);
    for row in rows {
        calendar.extend([row]);
        save_bar.inc(1);
    }
    save_bar.finish_and_clear();

    let generator = IcsGenerator::new(IcsOptions {
        timezone: Some(timezone.name().to_string()),
    });
    let ics_content = generator.generate(&calendar)?;

    let output_file = params
        .output
        .unwrap_or_else(|| format!("schedule_{}_{}.ics", session.student_id, school_year));
    fs::write(&output_file, ics_content)?;

    println!("✓ Calendar created and saved as '{}'", output_file);
    println!("Total events added: {}", calendar.len());

    Ok(())
}

/// Check credentials and print the resulting session
pub async fn login_command(base_url: String, username: String, password: String) -> Result<()> {
    tracing::info!("Checking credentials for {} at {}", username, base_url);

    let portal = GenesisPortal::new(&PortalConfig {
        base_url,
        timeout: None,
    })?;

    println!("Logging in...");
    let session = portal
        .authenticate(&Credentials { username, password })
        .await?;

    println!("✓ Login succeeded");
    println!("  Student ID: {}", session.student_id);
    println!("  Session ID: {}", session.session_id);

    Ok(())
}

/// Print the cased title and category of a course name
pub fn classify_command(name: &str) -> Result<()> {
    let title = title_case(name);
    let category = classify(&title);

    println!("Original: {}", name);
    println!("Title:    {} {}", category.tag(), title);
    println!("Category: {:?}", category);

    Ok(())
}
