use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::{FixedOffset, NaiveDate};
use clap::{Args, Parser, Subcommand, ValueEnum};
use habit_core::model::Habit;
use habit_core::progress::{ProgressSettings, parse_today};
use habit_core::search::{CategoryFilter, HabitFilter, filter_habits};
use habit_core::{Clock, DayBoundary};
use services::{ApiConfig, HabitApiClient, HabitOverview};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod report;

#[derive(Debug, Parser)]
#[command(name = "habit", about = "Streaks and progress for tracked habits")]
struct Cli {
    /// Log at debug level (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show streak, progress and today's status for habits in a JSON file.
    Stats {
        /// JSON array of habits as returned by the habit API.
        #[arg(short, long)]
        file: PathBuf,
        #[command(flatten)]
        progress: ProgressArgs,
    },
    /// Search and filter public habits in a JSON file.
    Browse {
        #[arg(short, long)]
        file: PathBuf,
        /// Keyword matched against title and description.
        #[arg(short, long, default_value = "")]
        search: String,
        /// Category name, or "All".
        #[arg(short, long, default_value = "All")]
        category: CategoryFilter,
    },
    /// Fetch habits from the habit API and show their stats.
    Remote {
        #[arg(value_enum)]
        list: RemoteList,
        /// Overrides HABIT_API_BASE_URL.
        #[arg(long)]
        base_url: Option<String>,
        /// Overrides HABIT_API_TOKEN.
        #[arg(long)]
        token: Option<String>,
        #[command(flatten)]
        progress: ProgressArgs,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RemoteList {
    Public,
    Featured,
    Mine,
}

#[derive(Debug, Args)]
struct ProgressArgs {
    /// Reference day (YYYY-MM-DD); defaults to the current day.
    #[arg(long)]
    today: Option<String>,
    /// Offset at which days roll over, e.g. +05:30 or -04:00; defaults to UTC.
    #[arg(long, value_parser = parse_boundary, default_value = "UTC", allow_hyphen_values = true)]
    utc_offset: DayBoundary,
    /// Trailing window for the completion percentage.
    #[arg(long, default_value_t = habit_core::progress::DEFAULT_WINDOW_DAYS)]
    window: u32,
}

impl ProgressArgs {
    fn settings(&self) -> Result<ProgressSettings> {
        Ok(ProgressSettings::new(self.utc_offset, self.window)?)
    }

    fn today(&self) -> Result<NaiveDate> {
        match &self.today {
            Some(raw) => Ok(parse_today(raw)?),
            None => Ok(Clock::default_clock().today(self.utc_offset)),
        }
    }
}

fn parse_boundary(raw: &str) -> Result<DayBoundary, String> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("utc") || raw.eq_ignore_ascii_case("z") {
        return Ok(DayBoundary::Utc);
    }
    raw.parse::<FixedOffset>()
        .map(DayBoundary::Offset)
        .map_err(|_| format!("expected an offset like +05:30 or UTC, got {raw:?}"))
}

/// Flags take precedence over the environment.
fn api_config(
    env: ApiConfig,
    base_url: Option<String>,
    token: Option<String>,
) -> Result<ApiConfig> {
    Ok(ApiConfig::new(
        base_url.unwrap_or(env.base_url),
        token.or(env.token),
    )?)
}

fn load_habits(path: &Path) -> Result<Vec<Habit>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading habits from {}", path.display()))?;
    let habits: Vec<Habit> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing habits in {}", path.display()))?;
    debug!(count = habits.len(), path = %path.display(), "loaded habits");
    Ok(habits)
}

fn print_stats(habits: Vec<Habit>, progress: &ProgressArgs) -> Result<()> {
    let settings = progress.settings()?;
    let today = progress.today()?;
    info!(%today, boundary = ?settings.boundary(), "computing habit stats");
    let rows: Vec<HabitOverview> = habits
        .into_iter()
        .map(|h| HabitOverview::build(h, today, &settings))
        .collect();
    print!("{}", report::stats_table(&rows, settings.window_days().get()));
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Stats { file, progress } => print_stats(load_habits(&file)?, &progress),
        Command::Browse {
            file,
            search,
            category,
        } => {
            let habits = load_habits(&file)?;
            let public: Vec<Habit> = habits.into_iter().filter(Habit::is_public).collect();
            let filter = HabitFilter::new(search, category);
            print!("{}", report::habit_cards(&filter_habits(&public, &filter)));
            Ok(())
        }
        Command::Remote {
            list,
            base_url,
            token,
            progress,
        } => {
            let config = api_config(ApiConfig::from_env()?, base_url, token)?;
            if matches!(list, RemoteList::Mine) && config.token.is_none() {
                bail!("listing your habits needs HABIT_API_TOKEN or --token");
            }
            let api = HabitApiClient::new(config);
            debug!(base_url = %api.config().base_url, ?list, "fetching habits");
            let habits = match list {
                RemoteList::Public => api.public_habits().await?,
                RemoteList::Featured => api.featured_habits().await?,
                RemoteList::Mine => api.my_habits().await?,
            };
            print_stats(habits, &progress)
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(cli).await {
        eprintln!("{err:#}");
        std::process::exit(2);
    }
}
