use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use jobscan_core::aggregator::{Aggregator, ScanOutcome};
use jobscan_core::config::EngineConfig;
use jobscan_core::filter::EligibilityFilter;
use jobscan_core::models::{JobRecord, SearchQuery};
use jobscan_providers::{AnyProvider, ProviderCredentials, build_providers};

#[derive(Parser)]
#[command(name = "jobscan", version, about = "Multi-provider job listing aggregator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query all providers and print the merged listings
    Search {
        /// Search keywords, e.g. "rust developer"
        #[arg(short, long)]
        keywords: String,

        /// Target location (defaults to the configured country)
        #[arg(short, long)]
        location: Option<String>,

        /// Maximum number of results
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Bypass the response cache
        #[arg(long, default_value_t = false)]
        force: bool,

        /// Print records as JSON instead of a listing
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Search, then keep only records passing the eligibility filter
    /// (FILTER_INCLUDE / FILTER_EXCLUDE)
    Scan {
        /// Search keywords
        #[arg(short, long)]
        keywords: String,

        /// Target location (defaults to the configured country)
        #[arg(short, long)]
        location: Option<String>,

        /// Print records as JSON instead of a listing
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("jobscan=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Search {
            keywords,
            location,
            limit,
            force,
            json,
        } => {
            let engine = build_engine()?;
            let outcome = run_search(&engine, &keywords, location.as_deref(), limit, force).await?;
            if json {
                print_json(&outcome.records)?;
            } else {
                print_listing(&outcome.records);
                if outcome.cache_hit {
                    eprintln!("(served from cache)");
                }
            }
        }
        Commands::Scan {
            keywords,
            location,
            json,
        } => {
            let engine = build_engine()?;
            let filter = EligibilityFilter::from_env();
            let outcome = run_search(&engine, &keywords, location.as_deref(), None, false).await?;
            let total = outcome.records.len();
            let matches = filter.apply(outcome.records);

            if json {
                let records: Vec<JobRecord> =
                    matches.into_iter().map(|(record, _)| record).collect();
                print_json(&records)?;
            } else {
                for (record, reason) in &matches {
                    println!(
                        "  {} @ {} ({}) [{}]\n    {}",
                        record.title, record.company, record.location, reason, record.url
                    );
                }
                println!("\n{} eligible of {} scanned", matches.len(), total);
            }
        }
    }

    Ok(())
}

/// Build the aggregation engine from environment configuration.
fn build_engine() -> Result<Aggregator<AnyProvider>> {
    let config = EngineConfig::from_env().context("Invalid engine configuration")?;
    let credentials = ProviderCredentials::from_env()?;
    let providers =
        build_providers(&credentials, &config).context("No usable provider configured")?;
    Ok(Aggregator::new(providers, config)?)
}

async fn run_search(
    engine: &Aggregator<AnyProvider>,
    keywords: &str,
    location: Option<&str>,
    limit: Option<usize>,
    force: bool,
) -> Result<ScanOutcome> {
    let config = engine.config();
    let location = location.unwrap_or(&config.default_country);
    let limit = limit.unwrap_or(config.max_results);

    let query = SearchQuery::new(keywords, location, limit)?;
    let outcome = engine.scan(&query, force).await;

    for failure in &outcome.failures {
        tracing::warn!(provider = %failure.provider, error = %failure.error, "Provider failed");
    }
    if outcome.exhausted {
        tracing::warn!("Every provider failed; result list is empty");
    }

    Ok(outcome)
}

fn print_json(records: &[JobRecord]) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(records)?);
    Ok(())
}

fn print_listing(records: &[JobRecord]) {
    if records.is_empty() {
        println!("No jobs found.");
        return;
    }
    for record in records {
        let posted = record
            .posted_at
            .map(|ts| ts.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "unknown date".to_string());
        println!(
            "  [{}] {} @ {} ({}, {})\n    {}",
            record.source, record.title, record.company, record.location, posted, record.url
        );
    }
    println!("\nTotal: {} jobs", records.len());
}
