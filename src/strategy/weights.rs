use rand::Rng;
use serde::Serialize;

/// Strategy labels used for outcome attribution. These are heuristic
/// buckets, not distinct algorithms: each opened position is tagged with
/// a weighted draw from this set and the weight adapts to realized
/// results.
pub const DEFAULT_STRATEGIES: &[&str] = &[
    "Trend Following",
    "Mean Reversion",
    "Breakout",
    "Scalping",
];

pub const MIN_WEIGHT: f64 = 0.1;
pub const MAX_WEIGHT: f64 = 3.0;

const WIN_ADJUSTMENT: f64 = 0.15;
const LOSS_ADJUSTMENT: f64 = -0.05;

/// Ordered label → weight pairs forming the sampling distribution for
/// strategy attribution. Order is fixed so a seeded RNG draws
/// reproducibly.
#[derive(Debug, Clone, Serialize)]
pub struct StrategyWeights {
    entries: Vec<(String, f64)>,
}

impl Default for StrategyWeights {
    fn default() -> Self {
        Self {
            entries: DEFAULT_STRATEGIES
                .iter()
                .map(|label| (label.to_string(), 1.0))
                .collect(),
        }
    }
}

impl StrategyWeights {
    /// Weighted roulette draw over the current weights.
    ///
    /// Floating-point accumulation can overshoot the total on the last
    /// comparison; that edge falls back to the first label.
    pub fn pick<R: Rng>(&self, rng: &mut R) -> String {
        let total: f64 = self.entries.iter().map(|(_, weight)| weight).sum();
        let draw = rng.gen::<f64>() * total;

        let mut cumulative = 0.0;
        for (label, weight) in &self.entries {
            cumulative += weight;
            if draw <= cumulative {
                return label.clone();
            }
        }

        self.entries[0].0.clone()
    }

    /// Nudge a strategy's weight after a closed trade and clamp it into
    /// [MIN_WEIGHT, MAX_WEIGHT]. Unknown labels are ignored.
    pub fn record_outcome(&mut self, label: &str, won: bool) {
        let adjustment = if won { WIN_ADJUSTMENT } else { LOSS_ADJUSTMENT };
        if let Some((_, weight)) = self.entries.iter_mut().find(|(l, _)| l == label) {
            *weight = (*weight + adjustment).clamp(MIN_WEIGHT, MAX_WEIGHT);
        }
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, weight)| *weight)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries
            .iter()
            .map(|(label, weight)| (label.as_str(), *weight))
    }
}
