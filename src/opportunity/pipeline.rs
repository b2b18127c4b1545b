use chrono::{DateTime, Utc};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, info, warn};

use crate::clustering::{Cluster, KMeansClusterer};
use crate::config::DiscoveryConfig;
use crate::error::DiscoveryError;
use crate::opportunity::catalog::{MatchSource, ProductCatalog, ProductCatalogEntry};
use crate::opportunity::evaluator::{ClusterStats, OpportunityEvaluator};
use crate::scoring::{EngagementBaseline, TrendScorer, ViabilityScorer};
use crate::signals::{SignalDetector, Vocabulary};
use crate::ContentItem;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    pub rank: usize,
    pub cluster_id: usize,
    pub product: ProductCatalogEntry,
    pub match_source: MatchSource,
    pub margin: f64,
    pub margin_rate: f64,
    pub stats: ClusterStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpportunityReport {
    pub generated_at: DateTime<Utc>,
    pub items_total: usize,
    pub items_clustered: usize,
    pub items_skipped: usize,
    pub clusters: usize,
    pub opportunities: Vec<Opportunity>,
}

#[derive(Debug, Clone)]
pub struct DiscoveryPipeline {
    clusterer: KMeansClusterer,
    evaluator: OpportunityEvaluator,
    catalog: ProductCatalog,
    k: usize,
    seed: Option<u64>,
    max_products_per_cluster: usize,
    fallback_slice: usize,
}

impl DiscoveryPipeline {
    pub fn new(config: &DiscoveryConfig, vocabulary: Vocabulary, catalog: ProductCatalog) -> Self {
        let clusterer = KMeansClusterer::new(config.clustering.max_iterations)
            .with_time_budget(config.clustering.time_budget());
        let evaluator = OpportunityEvaluator::new(
            SignalDetector::new(vocabulary),
            TrendScorer::new(config.trend.clone()),
            ViabilityScorer::new(config.viability.clone()),
        );
        Self {
            clusterer,
            evaluator,
            catalog,
            k: config.clustering.k,
            seed: config.clustering.seed,
            max_products_per_cluster: config.catalog.max_products_per_cluster,
            fallback_slice: config.catalog.fallback_slice,
        }
    }

    /// Builds the pipeline, reading vocabulary and catalog overrides from the
    /// paths named in the config.
    pub fn from_config(config: &DiscoveryConfig) -> Result<Self, DiscoveryError> {
        let vocabulary = match config.vocabulary.path.as_deref() {
            Some(path) => Vocabulary::load(path)?,
            None => Vocabulary::default(),
        };
        let catalog = match config.catalog.path.as_deref() {
            Some(path) => ProductCatalog::load(path)?,
            None => ProductCatalog::default(),
        };
        Ok(Self::new(config, vocabulary, catalog))
    }

    pub fn with_defaults(config: &DiscoveryConfig) -> Self {
        Self::new(config, Vocabulary::default(), ProductCatalog::default())
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn catalog(&self) -> &ProductCatalog {
        &self.catalog
    }

    pub fn evaluator(&self) -> &OpportunityEvaluator {
        &self.evaluator
    }

    /// Seeded when a seed is given here or in the config, otherwise from entropy.
    pub fn rng(&self, seed_override: Option<u64>) -> StdRng {
        match seed_override.or(self.seed) {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    pub fn run(&self, items: &[ContentItem], now: DateTime<Utc>) -> OpportunityReport {
        let mut rng = self.rng(None);
        self.run_with_rng(items, self.k, &mut rng, now)
    }

    pub fn run_with_rng<R: Rng + ?Sized>(
        &self,
        items: &[ContentItem],
        k: usize,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> OpportunityReport {
        let (vectors, positions) = collect_vectors(items);
        let items_skipped = items.len() - vectors.len();

        let clusters: Vec<Cluster> = self
            .clusterer
            .cluster(&vectors, k, rng)
            .into_iter()
            .map(|mut cluster| {
                cluster.members = cluster
                    .members
                    .iter()
                    .map(|&member| positions[member])
                    .collect();
                cluster
            })
            .collect();

        let baseline = EngagementBaseline::from_items(items);
        let mut opportunities = Vec::new();

        for (position, cluster) in clusters.iter().enumerate() {
            let stats = self
                .evaluator
                .evaluate_with_baseline(cluster, items, &baseline, now);
            let text = OpportunityEvaluator::cluster_text(cluster, items);
            let matched = self.catalog.match_cluster(
                &text,
                &stats.problems,
                position,
                self.fallback_slice,
                self.max_products_per_cluster,
            );

            debug!(
                cluster_id = cluster.id,
                size = stats.size,
                viability = stats.viability_score,
                trend = stats.trend_score,
                products = matched.entries.len(),
                source = matched.source.label(),
                "evaluated cluster"
            );
            if matched.source == MatchSource::Fallback {
                warn!(
                    cluster_id = cluster.id,
                    "no catalog keyword matched; using fallback catalog slice"
                );
            }

            for product in matched.entries {
                opportunities.push(Opportunity {
                    rank: 0,
                    cluster_id: cluster.id,
                    product: product.clone(),
                    match_source: matched.source,
                    margin: product.margin(),
                    margin_rate: product.margin_rate(),
                    stats: stats.clone(),
                });
            }
        }

        rank_opportunities(&mut opportunities);

        info!(
            items = items.len(),
            clustered = vectors.len(),
            skipped = items_skipped,
            clusters = clusters.len(),
            opportunities = opportunities.len(),
            "discovery run complete"
        );

        OpportunityReport {
            generated_at: now,
            items_total: items.len(),
            items_clustered: vectors.len(),
            items_skipped,
            clusters: clusters.len(),
            opportunities,
        }
    }
}

/// Parses every embedding and keeps those matching the first usable
/// dimension. Returns the vectors with their positions in `items`.
fn collect_vectors(items: &[ContentItem]) -> (Vec<Vec<f64>>, Vec<usize>) {
    let mut vectors = Vec::new();
    let mut positions = Vec::new();
    let mut dimension: Option<usize> = None;

    for (index, item) in items.iter().enumerate() {
        let vector = item.vector();
        if vector.is_empty() {
            continue;
        }
        let expected = *dimension.get_or_insert(vector.len());
        if vector.len() != expected {
            warn!(
                item_id = %item.id,
                dimension = vector.len(),
                expected,
                "skipping embedding with mismatched dimension"
            );
            continue;
        }
        vectors.push(vector);
        positions.push(index);
    }

    (vectors, positions)
}

fn rank_opportunities(opportunities: &mut [Opportunity]) {
    opportunities.sort_by(|a, b| {
        b.stats
            .viability_score
            .partial_cmp(&a.stats.viability_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                b.stats
                    .trend_score
                    .partial_cmp(&a.stats.trend_score)
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| {
                b.margin_rate
                    .partial_cmp(&a.margin_rate)
                    .unwrap_or(Ordering::Equal)
            })
    });
    for (index, opportunity) in opportunities.iter_mut().enumerate() {
        opportunity.rank = index + 1;
    }
}
