mod commands;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use gdump_core::config::{DEFAULT_BASE_URL, DEFAULT_TIMEZONE, SchoolYear};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "gdump")]
#[command(about = "📆 Dump your Genesis class schedule into an ICS calendar")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the schedule for a date range and write an ICS file
    Generate {
        /// Genesis base URL
        #[arg(long, default_value = DEFAULT_BASE_URL)]
        base_url: String,

        /// Portal username
        #[arg(short, long)]
        username: Option<String>,

        /// Portal password
        #[arg(short = 'P', long)]
        password: Option<String>,

        /// Reuse an existing JSESSIONID instead of logging in
        #[arg(long, requires = "student_id")]
        session_id: Option<String>,

        /// Student id (required with --session-id)
        #[arg(long)]
        student_id: Option<String>,

        /// School year, e.g. 2024-2025 (defaults to the current one)
        #[arg(short = 'y', long)]
        school_year: Option<SchoolYear>,

        /// IANA timezone of the school
        #[arg(short, long, default_value = DEFAULT_TIMEZONE)]
        timezone: String,

        /// First day to fetch (YYYY-MM-DD), defaults to September 1
        #[arg(short = 's', long)]
        start_date: Option<NaiveDate>,

        /// Last day to fetch (YYYY-MM-DD), defaults to June 30
        #[arg(short = 'e', long)]
        end_date: Option<NaiveDate>,

        /// Output file path
        #[arg(short, long)]
        output: Option<String>,

        /// Days fetched at once
        #[arg(short, long)]
        concurrency: Option<usize>,

        /// Request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Log in and print the session and student id
    Login {
        /// Genesis base URL
        #[arg(long, default_value = DEFAULT_BASE_URL)]
        base_url: String,

        /// Portal username
        #[arg(short, long)]
        username: String,

        /// Portal password
        #[arg(short = 'P', long)]
        password: String,
    },

    /// Show the calendar title a course name turns into
    Classify {
        /// Course name as shown in the portal
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG overrides the default level
    let log_level = if cli.verbose { "debug" } else { "info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("gdump_cli={log_level},gdump_core={log_level}").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Generate {
            base_url,
            username,
            password,
            session_id,
            student_id,
            school_year,
            timezone,
            start_date,
            end_date,
            output,
            concurrency,
            timeout,
        } => {
            commands::generate_command(commands::GenerateParams {
                base_url,
                username,
                password,
                session_id,
                student_id,
                school_year,
                timezone,
                start_date,
                end_date,
                output,
                concurrency,
                timeout,
            })
            .await
        }

        Commands::Login {
            base_url,
            username,
            password,
        } => commands::login_command(base_url, username, password).await,

        Commands::Classify { name } => commands::classify_command(&name),
    }
}
