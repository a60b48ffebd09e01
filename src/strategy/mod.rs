// Signal scoring and outcome-weighted strategy attribution.
pub mod scoring;
pub mod weights;

pub use scoring::{entry_direction, score_candles, MarketAnalysis};
pub use weights::{StrategyWeights, DEFAULT_STRATEGIES, MAX_WEIGHT, MIN_WEIGHT};
