use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViabilityConfig {
    pub base: f64,
    pub problem_bonus: f64,
    pub product_bonus: f64,
    pub actual_product_bonus: f64,
    pub engagement_bonus: f64,
    pub engagement_threshold: f64,
    pub trend_bonus: f64,
    pub trend_threshold: f64,
}

impl Default for ViabilityConfig {
    fn default() -> Self {
        Self {
            base: 50.0,
            problem_bonus: 20.0,
            product_bonus: 15.0,
            actual_product_bonus: 25.0,
            engagement_bonus: 10.0,
            engagement_threshold: 1000.0,
            trend_bonus: 15.0,
            trend_threshold: 70.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ViabilitySignals {
    pub has_problems: bool,
    pub is_product_related: bool,
    pub has_actual_products: bool,
    pub avg_engagement: f64,
    pub trend_score: f64,
}

#[derive(Debug, Clone)]
pub struct ViabilityScorer {
    config: ViabilityConfig,
}

impl Default for ViabilityScorer {
    fn default() -> Self {
        Self::new(ViabilityConfig::default())
    }
}

impl ViabilityScorer {
    pub fn new(config: ViabilityConfig) -> Self {
        Self { config }
    }

    /// Bonuses accumulate unclamped; only the final sum is clamped to 0..=100.
    pub fn score(&self, signals: &ViabilitySignals) -> f64 {
        let mut score = self.config.base;

        if signals.has_problems {
            score += self.config.problem_bonus;
        }
        if signals.is_product_related {
            score += self.config.product_bonus;
        }
        if signals.has_actual_products {
            score += self.config.actual_product_bonus;
        }
        if signals.avg_engagement > self.config.engagement_threshold {
            score += self.config.engagement_bonus;
        }
        if signals.trend_score > self.config.trend_threshold {
            score += self.config.trend_bonus;
        }

        if score.is_nan() {
            return 0.0;
        }
        score.clamp(0.0, 100.0)
    }
}
