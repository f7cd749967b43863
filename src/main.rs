use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, ensure, Context};
use chrono::{Local, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use sqlx::SqlitePool;
use tracing_subscriber::EnvFilter;

mod analysis;
mod breathing;
mod config;
mod db;
mod error;
mod models;
mod recommend;
mod report;
mod sample;

use breathing::{BreathingPattern, BreathingTimer};
use config::Config;
use models::{AnalysisResult, DateRange, NewStressRecord, StressRecord};
use recommend::{Catalog, StressBand};
use report::Dashboard;

#[derive(Parser)]
#[command(name = "stress-tracker")]
#[command(about = "Personal stress, sleep and mood journal with trend analysis", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the local database schema
    InitDb,
    /// Log a check-in; out-of-range values are clamped
    Add {
        #[arg(long, allow_negative_numbers = true)]
        stress: i32,
        #[arg(long, default_value_t = 7.0, allow_negative_numbers = true)]
        sleep: f64,
        #[arg(long, default_value_t = 3, allow_negative_numbers = true)]
        mood: i32,
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        activity: i32,
        #[arg(long)]
        notes: Option<String>,
        /// Defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// List recent check-ins, or those between two dates
    List {
        #[arg(long, conflicts_with_all = ["from", "to"])]
        limit: Option<usize>,
        #[arg(long, requires = "to")]
        from: Option<NaiveDate>,
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,
    },
    /// Show one check-in by id
    Show {
        #[arg(long)]
        id: i64,
    },
    /// Delete one check-in by id
    Delete {
        #[arg(long)]
        id: i64,
    },
    /// Delete every check-in
    Clear {
        #[arg(long)]
        yes: bool,
    },
    /// Count stored check-ins
    Count,
    /// Summarise recent check-ins, or those between two dates
    Analyze {
        #[arg(long, conflicts_with_all = ["from", "to"])]
        limit: Option<usize>,
        #[arg(long, requires = "to")]
        from: Option<NaiveDate>,
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,
        #[arg(long)]
        json: bool,
    },
    /// Relaxation suggestions for a stress level (today's peak by default)
    Recommend {
        #[arg(long, allow_negative_numbers = true)]
        level: Option<i32>,
        #[arg(long)]
        json: bool,
    },
    /// Print the mindfulness tips
    Tips,
    /// Guided 4-7-8 breathing; Ctrl-C stops it
    Breathe {
        #[arg(long)]
        cycles: Option<u32>,
    },
    /// Insert generated sample check-ins for demos
    Seed {
        #[arg(
            long,
            default_value_t = 14,
            value_parser = clap::value_parser!(u32).range(1..=i64::from(sample::MAX_SAMPLE_DAYS))
        )]
        days: u32,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Import check-ins from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Export all check-ins to a CSV file
    Export {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Generate a markdown report
    Report {
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "stress_tracker=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("invalid configuration")?;
    let today = Local::now().date_naive();

    match cli.command {
        Commands::InitDb => {
            open_store(&config).await?;
            println!("Schema ready.");
        }
        Commands::Add {
            stress,
            sleep,
            mood,
            activity,
            notes,
            date,
        } => {
            let draft = NewStressRecord {
                date: date.unwrap_or(today),
                stress_level: stress,
                sleep_hours: sleep,
                mood,
                activity_minutes: activity,
                notes,
            };
            if !draft.is_normalized() {
                tracing::warn!("some values were outside their range and have been clamped");
            }

            let pool = open_store(&config).await?;
            let record = db::insert_record(&pool, &draft.normalized(), Utc::now())
                .await
                .context("failed to save check-in")?;
            println!("Saved check-in #{} for {}.", record.id, record.date);
        }
        Commands::List { limit, from, to } => {
            let pool = open_store(&config).await?;
            let (records, _) = load_records(&pool, &config, limit, from, to).await?;

            if records.is_empty() {
                println!("No check-ins found.");
                return Ok(());
            }
            for record in &records {
                print_record(record);
            }
        }
        Commands::Show { id } => {
            let pool = open_store(&config).await?;
            match db::fetch_by_id(&pool, id)
                .await
                .context("failed to load check-in")?
            {
                Some(record) => print_record(&record),
                None => println!("No check-in with id {id}."),
            }
        }
        Commands::Delete { id } => {
            let pool = open_store(&config).await?;
            let deleted = db::delete_by_id(&pool, id)
                .await
                .context("failed to delete check-in")?;

            if deleted {
                println!("Deleted check-in #{id}.");
            } else {
                println!("No check-in with id {id}.");
            }
        }
        Commands::Clear { yes } => {
            if !yes {
                bail!("refusing to delete every check-in without --yes");
            }
            let pool = open_store(&config).await?;
            let deleted = db::delete_all(&pool)
                .await
                .context("failed to clear check-ins")?;
            println!("Deleted {deleted} check-ins.");
        }
        Commands::Count => {
            let pool = open_store(&config).await?;
            let total = db::count(&pool).await.context("failed to count check-ins")?;
            println!("{total} check-ins stored.");
        }
        Commands::Analyze {
            limit,
            from,
            to,
            json,
        } => {
            let pool = open_store(&config).await?;
            let (records, range) = load_records(&pool, &config, limit, from, to).await?;
            let result = analysis::analyze(&records, range, today);

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_analysis(&result);
            }
        }
        Commands::Recommend { level, json } => {
            let catalog = load_catalog(&config)?;
            let level = match level {
                Some(level) => level,
                None => {
                    let pool = open_store(&config).await?;
                    let todays = db::fetch_by_date(&pool, today)
                        .await
                        .context("failed to load today's check-ins")?;
                    analysis::today_peak(&todays, today).unwrap_or(0)
                }
            };
            let recommendations = catalog.recommend(level);

            if json {
                println!("{}", serde_json::to_string_pretty(recommendations)?);
                return Ok(());
            }

            println!(
                "Suggestions for {} stress (level {}):",
                StressBand::from_level(level).label(),
                level
            );
            for rec in recommendations {
                println!(
                    "{}. {} ({}, {} min)\n   {}",
                    rec.priority,
                    rec.title,
                    rec.category.label(),
                    rec.duration_minutes,
                    rec.description
                );
            }
        }
        Commands::Tips => {
            let catalog = load_catalog(&config)?;
            for tip in catalog.mindfulness_tips() {
                println!("- {tip}");
            }
        }
        Commands::Breathe { cycles } => {
            let mut timer = BreathingTimer::new(BreathingPattern::default());
            let pattern = timer.pattern();
            println!(
                "Breathe in for {}s, hold for {}s, out for {}s ({}s per cycle). Ctrl-C to stop.",
                pattern.inhale,
                pattern.hold,
                pattern.exhale,
                pattern.cycle_length()
            );

            let cancel = async {
                if let Err(err) = tokio::signal::ctrl_c().await {
                    tracing::warn!(error = %err, "cannot listen for Ctrl-C");
                    std::future::pending::<()>().await;
                }
            };
            let completed = breathing::run_session(
                &mut timer,
                Duration::from_secs(1),
                cycles,
                cancel,
                |tick| println!("{:<7} {:>2}", tick.phase, tick.seconds_remaining),
            )
            .await;
            println!("Completed {completed} cycles.");
        }
        Commands::Seed { days, seed } => {
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let records = sample::generate_sample_records(days, today, &mut rng);
            let pool = open_store(&config).await?;
            let inserted = db::insert_records(&pool, &records, Utc::now())
                .await
                .context("failed to insert sample data")?;
            println!("Inserted {inserted} sample check-ins.");
        }
        Commands::Import { csv } => {
            let pool = open_store(&config).await?;
            let inserted = db::import_csv(&pool, &csv, Utc::now())
                .await
                .with_context(|| format!("failed to import {}", csv.display()))?;
            println!("Inserted {inserted} check-ins from {}.", csv.display());
        }
        Commands::Export { csv } => {
            let pool = open_store(&config).await?;
            let exported = db::export_csv(&pool, &csv)
                .await
                .with_context(|| format!("failed to export to {}", csv.display()))?;
            println!("Exported {exported} check-ins to {}.", csv.display());
        }
        Commands::Report { limit, out } => {
            let catalog = load_catalog(&config)?;
            let pool = open_store(&config).await?;
            let records = db::fetch_recent(&pool, limit.unwrap_or(config.recent_limit))
                .await
                .context("failed to load check-ins")?;
            let dashboard = Dashboard::build(&records, today, &catalog);
            let report = report::build_report(&dashboard, &records);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

async fn open_store(config: &Config) -> anyhow::Result<SqlitePool> {
    let pool = db::connect(&config.database_url)
        .await
        .with_context(|| format!("failed to open {}", config.database_url))?;
    db::init_db(&pool)
        .await
        .context("failed to prepare the database schema")?;
    Ok(pool)
}

fn load_catalog(config: &Config) -> anyhow::Result<Catalog> {
    match &config.catalog_path {
        Some(path) => Catalog::from_path(path),
        None => Ok(Catalog::default()),
    }
}

async fn load_records(
    pool: &SqlitePool,
    config: &Config,
    limit: Option<usize>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> anyhow::Result<(Vec<StressRecord>, Option<DateRange>)> {
    match (from, to) {
        (Some(from), Some(to)) => {
            ensure!(from <= to, "--from {from} is after --to {to}");
            let records = db::fetch_between(pool, from, to)
                .await
                .context("failed to load check-ins")?;
            Ok((records, Some(DateRange::new(from, to))))
        }
        _ => {
            let records = db::fetch_recent(pool, limit.unwrap_or(config.recent_limit))
                .await
                .context("failed to load check-ins")?;
            Ok((records, None))
        }
    }
}

fn print_record(record: &StressRecord) {
    let notes = record
        .notes
        .as_deref()
        .map(|note| format!(" - {note}"))
        .unwrap_or_default();
    println!(
        "#{} {} stress {}/10, sleep {:.1}h, mood {}/5, activity {} min{}",
        record.id,
        record.date,
        record.stress_level,
        record.sleep_hours,
        record.mood,
        record.activity_minutes,
        notes
    );
}

fn print_analysis(result: &AnalysisResult) {
    println!(
        "{} check-ins from {} to {}",
        result.total_records, result.date_range.start, result.date_range.end
    );
    println!("Average stress: {:.1}", result.average_stress);
    match result.weekly_average {
        Some(weekly) => println!("Last 7 days: {weekly:.1}"),
        None => println!("Last 7 days: no check-ins"),
    }
    println!("High-stress days: {}", result.high_stress_days);
    println!("Trend: {}", result.trend.label());

    if !result.stress_peaks.is_empty() {
        println!("Peaks:");
        for peak in &result.stress_peaks {
            let marker = if peak.is_high_stress { " (high)" } else { "" };
            println!("- {}: {}/10{}", peak.date, peak.stress_level, marker);
        }
    }
}
