use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{ContentItem, Platform};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    pub base: f64,
    pub engagement_cap: f64,
    pub engagement_scale: f64,
    pub recency_max: f64,
    pub recency_decay_per_day: f64,
    pub hashtag_weight: f64,
    pub hashtag_cap: f64,
    pub max_score: f64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            base: 50.0,
            engagement_cap: 40.0,
            engagement_scale: 20.0,
            recency_max: 20.0,
            recency_decay_per_day: 2.0,
            hashtag_weight: 4.0,
            hashtag_cap: 20.0,
            max_score: 100.0,
        }
    }
}

/// Mean engagement per platform over a pool of items.
#[derive(Debug, Clone, Default)]
pub struct EngagementBaseline {
    means: HashMap<Platform, f64>,
}

impl EngagementBaseline {
    pub fn from_items(items: &[ContentItem]) -> Self {
        let mut totals: HashMap<Platform, (f64, usize)> = HashMap::new();
        for item in items {
            let entry = totals.entry(item.platform.clone()).or_insert((0.0, 0));
            entry.0 += item.engagement.total();
            entry.1 += 1;
        }

        let means = totals
            .into_iter()
            .map(|(platform, (total, count))| (platform, total / count as f64))
            .collect();
        Self { means }
    }

    pub fn mean(&self, platform: &Platform) -> f64 {
        self.means.get(platform).copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone)]
pub struct TrendScorer {
    config: TrendConfig,
}

impl Default for TrendScorer {
    fn default() -> Self {
        Self::new(TrendConfig::default())
    }
}

impl TrendScorer {
    pub fn new(config: TrendConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrendConfig {
        &self.config
    }

    pub fn score(&self, item: &ContentItem, pool: &[ContentItem], now: DateTime<Utc>) -> f64 {
        let baseline = EngagementBaseline::from_items(pool);
        self.score_with_baseline(item, &baseline, now)
    }

    pub fn score_with_baseline(
        &self,
        item: &ContentItem,
        baseline: &EngagementBaseline,
        now: DateTime<Utc>,
    ) -> f64 {
        let engagement =
            self.engagement_component(item.engagement.total(), baseline.mean(&item.platform));
        let recency = self.recency_component(item.posted_at, now);
        let hashtags = self.hashtag_component(item.hashtag_count());
        (self.config.base + engagement + recency + hashtags).min(self.config.max_score)
    }

    pub fn engagement_component(&self, engagement: f64, mean_engagement: f64) -> f64 {
        if mean_engagement <= 0.0 || !mean_engagement.is_finite() || !engagement.is_finite() {
            return 0.0;
        }
        let ratio = engagement / mean_engagement;
        (ratio * self.config.engagement_scale)
            .min(self.config.engagement_cap)
            .max(0.0)
    }

    pub fn recency_component(&self, posted_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
        let Some(posted_at) = posted_at else {
            return 0.0;
        };
        let days = (now - posted_at).num_milliseconds() as f64 / MILLIS_PER_DAY;
        (self.config.recency_max - days.max(0.0) * self.config.recency_decay_per_day).max(0.0)
    }

    pub fn hashtag_component(&self, hashtag_count: usize) -> f64 {
        (hashtag_count as f64 * self.config.hashtag_weight).min(self.config.hashtag_cap)
    }
}
