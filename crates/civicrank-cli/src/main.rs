//! Civicrank batch runner.
//!
//! Run with: cargo run -p civicrank-cli -- leaderboard

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use civicrank_ranker::{artifact_source, features::SinglePrediction};

#[derive(Debug, Parser)]
#[command(name = "civicrank", version, about = "Score and rank civic workers")]
struct Cli {
    /// Path to a civicrank TOML config file
    #[arg(long, global = true, env = "CIVICRANK_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build the worker leaderboard CSV
    Leaderboard {
        /// Input dataset (overrides the config)
        #[arg(long)]
        dataset: Option<PathBuf>,
        /// Output CSV (overrides the config)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Build the worker recommendation CSV
    Recommend {
        #[arg(long)]
        dataset: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Score a single worker with the leaderboard model
    Predict {
        completion_ratio: f64,
        citizen_rating: i64,
        locality_rating: i64,
        task_difficulty: i64,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = commands::load_config(cli.config.as_deref())?;
    let artifacts = artifact_source(false);

    match cli.command {
        Command::Leaderboard { dataset, output } => {
            commands::apply_overrides(&mut config.leaderboard, dataset, output);
            let path = commands::leaderboard(&config, artifacts.as_ref())?;
            println!("Leaderboard saved as {}", path.display());
        }
        Command::Recommend { dataset, output } => {
            commands::apply_overrides(&mut config.recommendation, dataset, output);
            let path = commands::recommend(&config, artifacts.as_ref())?;
            println!("Recommendations saved as {}", path.display());
        }
        Command::Predict {
            completion_ratio,
            citizen_rating,
            locality_rating,
            task_difficulty,
        } => {
            let input = SinglePrediction {
                completion_ratio,
                citizen_rating,
                locality_rating,
                task_difficulty,
            };
            let score = commands::predict(&config, artifacts.as_ref(), &input)?;
            println!("{}", score_line(score));
        }
    }

    Ok(())
}

/// Bare number, so callers can parse stdout as a float.
fn score_line(score: f64) -> String {
    score.to_string()
}
