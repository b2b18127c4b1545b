pub mod trend;
pub mod viability;

pub use trend::{EngagementBaseline, TrendConfig, TrendScorer};
pub use viability::{ViabilityConfig, ViabilityScorer, ViabilitySignals};
