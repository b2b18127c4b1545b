use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::clustering::Cluster;
use crate::scoring::{EngagementBaseline, TrendScorer, ViabilityScorer, ViabilitySignals};
use crate::signals::{ProductCategory, ProductMention, SignalDetector};
use crate::{mean, ContentItem, Platform};

const TOP_PRODUCTS: usize = 5;
const SAMPLE_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedContent {
    pub index: usize,
    pub id: String,
    pub platform: Platform,
    pub text: String,
    pub engagement: f64,
    pub trend_score: f64,
    pub mentioned_products: Vec<ProductMention>,
    pub has_actual_products: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductFrequency {
    pub product: String,
    pub category: ProductCategory,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterStats {
    pub cluster_id: usize,
    pub size: usize,
    pub avg_engagement: f64,
    pub trend_score: f64,
    pub viability_score: f64,
    pub problems: Vec<String>,
    pub problem_score: f64,
    pub product_keywords: Vec<String>,
    pub product_score: f64,
    pub top_products: Vec<ProductFrequency>,
    pub total_mentions: usize,
    pub related_content: Vec<RelatedContent>,
    pub sample_text: String,
}

impl ClusterStats {
    pub fn has_actual_products(&self) -> bool {
        self.total_mentions > 0
    }
}

#[derive(Debug, Clone, Default)]
pub struct OpportunityEvaluator {
    detector: SignalDetector,
    trend: TrendScorer,
    viability: ViabilityScorer,
}

impl OpportunityEvaluator {
    pub fn new(detector: SignalDetector, trend: TrendScorer, viability: ViabilityScorer) -> Self {
        Self {
            detector,
            trend,
            viability,
        }
    }

    pub fn detector(&self) -> &SignalDetector {
        &self.detector
    }

    /// Space-joined text of every member, in member order.
    pub fn cluster_text(cluster: &Cluster, items: &[ContentItem]) -> String {
        cluster
            .members
            .iter()
            .filter_map(|&index| items.get(index))
            .map(|item| item.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn evaluate(&self, cluster: &Cluster, items: &[ContentItem], now: DateTime<Utc>) -> ClusterStats {
        let baseline = EngagementBaseline::from_items(items);
        self.evaluate_with_baseline(cluster, items, &baseline, now)
    }

    pub fn evaluate_with_baseline(
        &self,
        cluster: &Cluster,
        items: &[ContentItem],
        baseline: &EngagementBaseline,
        now: DateTime<Utc>,
    ) -> ClusterStats {
        let members: Vec<(usize, &ContentItem)> = cluster
            .members
            .iter()
            .filter_map(|&index| items.get(index).map(|item| (index, item)))
            .collect();

        let combined_text = Self::cluster_text(cluster, items);
        let problem_signals = self.detector.detect_problem_keywords(&combined_text);
        let product_signals = self.detector.detect_product_keywords(&combined_text);

        let mut related_content = Vec::with_capacity(members.len());
        let mut engagements = Vec::with_capacity(members.len());
        let mut trend_scores = Vec::with_capacity(members.len());
        let mut frequencies: Vec<ProductFrequency> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut total_mentions = 0usize;

        for (index, item) in members {
            let mentioned_products = self.detector.extract_actual_products(&item.text);
            for mention in &mentioned_products {
                total_mentions += 1;
                match positions.get(&mention.product) {
                    Some(&position) => frequencies[position].count += 1,
                    None => {
                        positions.insert(mention.product.clone(), frequencies.len());
                        frequencies.push(ProductFrequency {
                            product: mention.product.clone(),
                            category: mention.category,
                            count: 1,
                        });
                    }
                }
            }

            let engagement = item.engagement.total();
            let trend_score = self.trend.score_with_baseline(item, baseline, now);
            engagements.push(engagement);
            trend_scores.push(trend_score);

            related_content.push(RelatedContent {
                index,
                id: item.id.clone(),
                platform: item.platform.clone(),
                text: item.text.clone(),
                engagement,
                trend_score,
                has_actual_products: !mentioned_products.is_empty(),
                mentioned_products,
            });
        }

        // Stable sort keeps first-seen order among equal counts.
        frequencies.sort_by(|a, b| b.count.cmp(&a.count));
        frequencies.truncate(TOP_PRODUCTS);

        let avg_engagement = mean(&engagements);
        let trend_score = mean(&trend_scores);
        let viability_score = self.viability.score(&ViabilitySignals {
            has_problems: problem_signals.has_problems,
            is_product_related: product_signals.is_product_related,
            has_actual_products: total_mentions > 0 || !product_signals.actual_products.is_empty(),
            avg_engagement,
            trend_score,
        });

        ClusterStats {
            cluster_id: cluster.id,
            size: related_content.len(),
            avg_engagement,
            trend_score,
            viability_score,
            problems: problem_signals.problems,
            problem_score: problem_signals.problem_score,
            product_keywords: product_signals.keywords,
            product_score: product_signals.product_score,
            top_products: frequencies,
            total_mentions,
            related_content,
            sample_text: combined_text.chars().take(SAMPLE_CHARS).collect(),
        }
    }
}
