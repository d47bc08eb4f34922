//! Query layer: pattern building and result aggregation
//!
//! The matcher turns free-text filters into the regex patterns the
//! store evaluates; the aggregator folds the store's flat rows into
//! deduplicated, grouped response shapes.

mod aggregate;
mod matcher;

pub use aggregate::{AggregateError, RowAggregator};
pub use matcher::{build_pattern, compile_full_match, MatchConfig};
