//! Public types for the Muninn API.

mod analysis;
mod stats;

pub use analysis::AnalysisRecord;
pub use stats::BatchingStats;
