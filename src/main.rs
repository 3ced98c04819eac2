use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

mod aggregate;
mod classify;
mod config;
mod dashboard;
mod db;
mod error;
mod ingest;
mod logging;
mod metrics;
mod models;
mod pipeline;
mod report;
mod tables;
mod trend;

use config::{PipelineConfig, BENCHMARK, DAILY_FILE, DEFAULT_CAMPAIGN_COLUMN, MONTHLY_FILE};
use models::{Channel, Platform, Product};

#[derive(Parser)]
#[command(name = "cpl-dashboard")]
#[command(
    about = "Cost-per-lead aggregation and dashboard queries for lead gen campaigns",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate source partitions into the daily and monthly CPL tables
    Build {
        /// CSV export of one source sheet; repeat for each partition
        #[arg(long = "source", required = true)]
        sources: Vec<PathBuf>,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
        #[arg(long, default_value_t = BENCHMARK)]
        benchmark: f64,
        #[arg(long, default_value = DEFAULT_CAMPAIGN_COLUMN)]
        campaign_column: String,
    },
    /// Filter the tables and print chart series plus the benchmark alert
    Dashboard {
        #[arg(long, default_value = DAILY_FILE)]
        daily: PathBuf,
        #[arg(long, default_value = MONTHLY_FILE)]
        monthly: PathBuf,
        #[arg(long = "product")]
        products: Vec<Product>,
        #[arg(long = "platform")]
        platforms: Vec<Platform>,
        #[arg(long = "channel")]
        channels: Vec<Channel>,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(long, default_value_t = BENCHMARK)]
        benchmark: f64,
        /// Emit the view as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown report from the monthly table
    Report {
        #[arg(long, default_value = MONTHLY_FILE)]
        monthly: PathBuf,
        #[arg(long, default_value_t = BENCHMARK)]
        benchmark: f64,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Create or upgrade the database schema
    InitDb,
    /// Store the daily and monthly tables in Postgres as a new run
    Publish {
        #[arg(long, default_value = DAILY_FILE)]
        daily: PathBuf,
        #[arg(long, default_value = MONTHLY_FILE)]
        monthly: PathBuf,
        #[arg(long, default_value_t = BENCHMARK)]
        benchmark: f64,
    },
}

async fn connect() -> anyhow::Result<PgPool> {
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a production Postgres instance")?;

    PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            sources,
            out_dir,
            benchmark,
            campaign_column,
        } => {
            let config = PipelineConfig {
                benchmark,
                campaign_column,
                ..PipelineConfig::default()
            };
            let ingested = ingest::load_partitions(&sources, &config.campaign_column)?;
            info!(
                partitions = ingested.partitions_read.len(),
                skipped = ingested.partitions_skipped.len(),
                rows = ingested.events.len(),
                "loaded source rows"
            );

            let tables = pipeline::build_tables(&ingested.events, &config);
            let (daily_path, monthly_path) = tables::write_tables(&out_dir, &tables)?;

            println!(
                "Read {} rows from {} partitions ({} skipped).",
                ingested.events.len(),
                ingested.partitions_read.len(),
                ingested.partitions_skipped.len()
            );
            if !ingested.rejections.is_empty() {
                println!("Rejected {} rows:", ingested.rejections.len());
                for rejection in ingested.rejections.iter().take(10) {
                    println!(
                        "- {} line {}: {}",
                        rejection.partition, rejection.line, rejection.reason
                    );
                }
            }
            println!(
                "Wrote {} daily rows to {}.",
                tables.daily.len(),
                daily_path.display()
            );
            println!(
                "Wrote {} monthly rows to {}.",
                tables.monthly.len(),
                monthly_path.display()
            );
        }
        Commands::Dashboard {
            daily,
            monthly,
            products,
            platforms,
            channels,
            start,
            end,
            benchmark,
            json,
        } => {
            let tables = tables::load_tables(&daily, &monthly)?;
            let state = dashboard::DashboardState::new(tables, benchmark);
            let filters = dashboard::Filters {
                products: products.into_iter().collect::<BTreeSet<_>>(),
                platforms: platforms.into_iter().collect::<BTreeSet<_>>(),
                channels: channels.into_iter().collect::<BTreeSet<_>>(),
                start,
                end,
            };
            let view = dashboard::render(&state, &filters);

            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
                return Ok(());
            }

            println!("{} daily rows, {} monthly rows match.", view.daily_rows, view.monthly_rows);
            println!("Daily CPL:");
            for series in &view.daily_cpl {
                for point in &series.points {
                    println!("- {} {}: ${:.2}", point.x, series.platform, point.y);
                }
            }
            println!("Monthly average CPL:");
            for series in &view.monthly_cpl {
                for point in &series.points {
                    println!("- {} {}: ${:.2}", point.x, series.platform, point.y);
                }
            }
            println!("{}", view.alert.message);
        }
        Commands::Report {
            monthly,
            benchmark,
            out,
        } => {
            let file = std::fs::File::open(&monthly)
                .with_context(|| format!("failed to open {}", monthly.display()))?;
            let rows: Vec<models::MonthlyAggregate> = tables::read_rows(file)?;
            let report = report::build_report(&rows, benchmark);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
        Commands::InitDb => {
            let pool = connect().await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Publish {
            daily,
            monthly,
            benchmark,
        } => {
            let tables = tables::load_tables(&daily, &monthly)?;
            let pool = connect().await?;
            let run_id = db::publish(&pool, &tables, benchmark).await?;
            println!(
                "Published {} daily and {} monthly rows as run {run_id}.",
                tables.daily.len(),
                tables.monthly.len()
            );
        }
    }

    Ok(())
}
