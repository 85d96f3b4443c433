//! Document analysis data model

mod segments;
mod types;

#[cfg(test)]
mod tests;

pub use segments::{is_partition_of, reconcile_segments, reconstruct};
pub use types::{
    clamp_score, AnalysisResult, HighlightType, HighlightedSegment, RiskLevel, MAX_RISK_SCORE,
};
