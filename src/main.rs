use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

use jobdex::{DeltaBadge, EngineConfig, SearchEngine, StoreState};

#[derive(Parser)]
#[command(name = "jobdex")]
#[command(about = "Job search engine - fuzzy title search with salary context")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the current dataset
    Search {
        /// Free-text query; salary constraints like "70k-90k" or ">80k" are understood
        query: String,

        /// Country filter (name, alias, or code)
        #[arg(short, long)]
        country: Option<String>,

        /// Page number, starting at 0
        #[arg(short, long, default_value = "0")]
        page: i64,

        /// Emit the page as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Load the dataset and keep refreshing it on the configured interval
    Watch,

    /// Show dataset status
    Stats,

    /// Encrypt a source file with the configured key
    Encrypt {
        /// Plaintext input file
        input: PathBuf,

        /// Encrypted output file
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = EngineConfig::from_env();

    match cli.command {
        Commands::Search {
            query,
            country,
            page,
            json,
        } => {
            let engine = SearchEngine::new(config);
            let result = engine.search(&query, country.as_deref(), page);

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
                return Ok(());
            }

            if result.total == 0 {
                if engine.store().state() == StoreState::Failed {
                    println!("No dataset available (initial load failed).");
                } else {
                    println!("No matching jobs.");
                }
                return Ok(());
            }

            println!(
                "{:<8} {:<30} {:<18} {:<14} {:>12} {:<12} {:>6}",
                "ID", "TITLE", "COMPANY", "LOCATION", "SALARY", "BADGE", "SCORE"
            );
            println!("{}", "-".repeat(106));
            for r in &result.results {
                let salary = match &r.salary {
                    Some(est) => format!("{} {}", est.amount, est.currency),
                    None => "-".to_string(),
                };
                println!(
                    "{:<8} {:<30} {:<18} {:<14} {:>12} {:<12} {:>6.2}",
                    truncate(&r.job.id, 8),
                    truncate(&r.job.title, 28),
                    truncate(&r.job.company, 16),
                    truncate(&r.job.city, 12),
                    salary,
                    badge_label(r.badge),
                    r.score
                );
            }
            println!(
                "\nPage {}/{} - {} match(es) total (generation {})",
                result.page + 1,
                result.pages.max(1),
                result.total,
                result.generation
            );
        }

        Commands::Watch => {
            let engine = SearchEngine::new(config.clone());
            let snap = engine.store().snapshot();
            println!(
                "Loaded {} jobs (generation {}); refreshing every {} minute(s). Ctrl-C to stop.",
                snap.jobs.len(),
                snap.generation,
                config.refresh_minutes
            );
            let scheduler = engine.start_refresh();
            tokio::signal::ctrl_c().await?;
            scheduler.shutdown();
            println!("Stopped.");
        }

        Commands::Stats => {
            let engine = SearchEngine::new(config);
            let snap = engine.store().snapshot();
            println!("State:      {:?}", engine.store().state());
            println!("Generation: {}", snap.generation);
            println!("Jobs:       {}", snap.jobs.len());
            println!("Salaries:   {} indexed rows", snap.salaries.len());
            println!("Loaded at:  {}", snap.loaded_at.format("%Y-%m-%d %H:%M:%S UTC"));
        }

        Commands::Encrypt { input, output } => {
            let key = config
                .key
                .context("JOBDEX_KEY must be set to encrypt")?;
            let plain = std::fs::read(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let cipher = jobdex::crypto::encrypt(&plain, &key)?;
            std::fs::write(&output, cipher)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("Encrypted {} -> {}", input.display(), output.display());
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

fn badge_label(badge: DeltaBadge) -> &'static str {
    match badge {
        DeltaBadge::MuchBelow => "much below",
        DeltaBadge::Below => "below",
        DeltaBadge::Near => "near",
        DeltaBadge::Above => "above",
        DeltaBadge::MuchAbove => "much above",
        DeltaBadge::Unavailable => "-",
    }
}

fn truncate(s: &str, max: usize) -> String {
    // Count chars, not bytes; slicing byte offsets panics on multi-byte input.
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
