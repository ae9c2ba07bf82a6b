//! Public types for the Statline API.

mod player;
mod stats;

pub use player::{PlayerRecord, Roster, Team};
pub use stats::{StatLine, canonical_metric, metric_components};
