//! statline: operator CLI.
//!
//! Runs the engine against a JSON fixture and prints results as JSON.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;

use statline::providers::StaticProvider;
use statline::query::{QueryEntities, SortOrder};
use statline::{Config, LeadersRequest, ResolveContext, StatEngine};

/// Statline CLI
#[derive(Parser)]
#[command(name = "statline")]
#[command(version)]
#[command(about = "Resolve players, classify questions and rank leaders")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON fixture with teams, players and stats.
    #[arg(short, long, env = "STATLINE_FIXTURE")]
    fixture: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a player name
    Resolve {
        /// Sport code (e.g. NFL)
        sport: String,
        /// Player name, typos allowed
        name: String,
        /// Team hint for common names
        #[arg(long)]
        team: Option<String>,
        /// Position hint for common names
        #[arg(long)]
        position: Option<String>,
        /// Metric the question is about (repeatable)
        #[arg(long = "metric")]
        metrics: Vec<String>,
    },

    /// Classify a question
    Classify {
        /// Question text
        question: String,
        /// Player mentioned in the question (repeatable)
        #[arg(long = "player")]
        players: Vec<String>,
        /// Team mentioned in the question (repeatable)
        #[arg(long = "team")]
        teams: Vec<String>,
        /// Metric the question asks about (repeatable)
        #[arg(long = "metric")]
        metrics: Vec<String>,
        /// Also run the ranking when the question is one, for this sport
        #[arg(long)]
        sport: Option<String>,
    },

    /// Rank players on a metric
    Leaders {
        /// Sport code (e.g. NFL)
        sport: String,
        /// Metric to rank on
        metric: String,
        /// Restrict to a position (repeatable)
        #[arg(long = "position")]
        positions: Vec<String>,
        /// Season (defaults to the configured season)
        #[arg(long)]
        season: Option<String>,
        /// Number of entries
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Rank smallest values first
        #[arg(long)]
        ascending: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();

    let config = Config::load(args.config.as_deref())?;
    let provider = Arc::new(StaticProvider::from_path(&args.fixture)?);
    let engine = StatEngine::builder()
        .config(&config)
        .provider(provider)
        .build()?;

    match args.command {
        Command::Resolve {
            sport,
            name,
            team,
            position,
            metrics,
        } => {
            let context = ResolveContext {
                metrics,
                team,
                position,
            };
            let result = engine.resolve_with_context(&sport, &name, &context).await?;
            print_json(&result)?;
        }
        Command::Classify {
            question,
            players,
            teams,
            metrics,
            sport,
        } => {
            let entities = QueryEntities {
                players,
                teams,
                metrics,
                ..QueryEntities::default()
            };
            let plan = engine.classify(&question, &entities)?;
            print_json(&plan)?;
            if let Some(sport) = sport
                && plan.query_type.is_ranking()
            {
                print_json(&engine.leaders_for_plan(&sport, &plan).await?)?;
            }
        }
        Command::Leaders {
            sport,
            metric,
            positions,
            season,
            limit,
            ascending,
        } => {
            let request = LeadersRequest {
                sport,
                season,
                metric,
                positions,
                threshold: None,
                limit,
                order: if ascending {
                    SortOrder::Ascending
                } else {
                    SortOrder::Descending
                },
            };
            print_json(&engine.leaders(&request).await?)?;
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
