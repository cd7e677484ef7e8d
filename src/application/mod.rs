//! Application Layer - Decision Engine and Analysis Use Case

pub mod engine;
pub mod analysis;

pub use engine::{round_price, Advance, DecisionEngine, RoundOutcome};
pub use analysis::{AnalysisError, AnalysisReport, AnalysisService};
