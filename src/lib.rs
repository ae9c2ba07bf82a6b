//! Statline - shared statistics cache and identity resolution for sports stats
//!
//! This crate sits between a question-answering front end and a slow,
//! rate-limited stats API. It provides:
//!
//! - a namespace-aware TTL cache shared by every concurrent caller
//! - resolution of free-text player names, with typo tolerance and
//!   deterministic disambiguation of common names
//! - classification of questions into a closed set of query types
//! - league-wide leaderboards built from cached stat lines
//!
//! The upstream API is abstracted behind [`RosterProvider`] and
//! [`StatsProvider`]; any REST client can be plugged in.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use statline::{QueryEntities, StatEngine, providers::StaticProvider};
//!
//! #[tokio::main]
//! async fn main() -> statline::Result<()> {
//!     let provider = Arc::new(StaticProvider::from_path("fixture.json".as_ref())?);
//!     let engine = StatEngine::builder().provider(provider).build()?;
//!
//!     let result = engine.resolve("NFL", "Micah Parsons").await?;
//!     println!("{:?} ({:.2})", result.chosen, result.confidence);
//!
//!     let plan = engine.classify(
//!         "Who leads the league in sacks?",
//!         &QueryEntities::new().metric("sacks"),
//!     )?;
//!     let leaders = engine.leaders_for_plan("NFL", &plan).await?;
//!     for entry in &leaders.entries {
//!         println!("{}. {} {}", entry.rank, entry.player.name, entry.value);
//!     }
//!     Ok(())
//! }
//! ```

pub mod aggregate;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod providers;
pub mod query;
pub mod resolve;
pub mod telemetry;
pub mod types;

// Re-export main types at crate root
pub use aggregate::{Leaderboard, LeadersRequest, RankedEntry};
pub use cache::{CacheStatsSnapshot, DomainCache, Namespace, TtlPolicy};
pub use config::Config;
pub use engine::{StatEngine, StatEngineBuilder};
pub use error::{Result, StatlineError};
pub use providers::{RosterProvider, StatsProvider};
pub use query::{QueryEntities, QueryPlan, QueryType, classify};
pub use resolve::{ResolutionResult, ResolutionStatus, ResolveContext};
pub use types::{PlayerRecord, Roster, StatLine, Team};
