pub mod clustering;
pub mod config;
pub mod error;
pub mod opportunity;
pub mod scoring;
pub mod signals;
pub mod sources;
pub mod vector;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::DiscoveryConfig;
use crate::error::DiscoveryError;
use crate::opportunity::DiscoveryPipeline;
use crate::vector::{parse_vector, RawEmbedding};

pub use crate::opportunity::{Opportunity, OpportunityReport};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Platform {
    Instagram,
    TikTok,
    ProductHunt,
    HuggingFace,
    Other(String),
}

impl Platform {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "instagram" | "ig" => Platform::Instagram,
            "tiktok" => Platform::TikTok,
            "producthunt" | "product_hunt" | "product-hunt" => Platform::ProductHunt,
            "huggingface" | "hugging_face" | "hf" => Platform::HuggingFace,
            other => Platform::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Platform::Instagram => "instagram",
            Platform::TikTok => "tiktok",
            Platform::ProductHunt => "producthunt",
            Platform::HuggingFace => "huggingface",
            Platform::Other(label) => label.as_str(),
        }
    }
}

impl From<String> for Platform {
    fn from(value: String) -> Self {
        Platform::parse(&value)
    }
}

impl From<Platform> for String {
    fn from(platform: Platform) -> Self {
        platform.label().to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Engagement {
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
    pub views: u64,
    /// Explicit engagement figure; when absent likes + comments stand in.
    pub score: Option<f64>,
}

impl Engagement {
    pub fn total(&self) -> f64 {
        match self.score {
            Some(score) if score.is_finite() => score,
            _ => self.likes.saturating_add(self.comments) as f64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: String,
    pub platform: Platform,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub embedding: Option<RawEmbedding>,
    #[serde(default)]
    pub engagement: Engagement,
    #[serde(default)]
    pub posted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub hashtags: Vec<String>,
}

impl ContentItem {
    pub fn new(id: impl Into<String>, platform: Platform, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            platform,
            text: text.into(),
            embedding: None,
            engagement: Engagement::default(),
            posted_at: None,
            hashtags: Vec::new(),
        }
    }

    pub fn vector(&self) -> Vec<f64> {
        self.embedding.as_ref().map(parse_vector).unwrap_or_default()
    }

    pub fn hashtag_count(&self) -> usize {
        if !self.hashtags.is_empty() {
            return self.hashtags.len();
        }
        self.text
            .split_whitespace()
            .filter(|word| word.starts_with('#') && word.chars().count() > 1)
            .count()
    }
}

fn load_discovery_config() -> DiscoveryConfig {
    match DiscoveryConfig::load(None) {
        Ok((config, _)) => config,
        Err(err) => {
            warn!(error = %err, "falling back to default discovery config");
            DiscoveryConfig::default()
        }
    }
}

/// Runs discovery with the on-disk configuration, falling back to the
/// built-in vocabulary and catalog if their files cannot be loaded.
pub fn discover(items: &[ContentItem]) -> OpportunityReport {
    let config = load_discovery_config();
    let pipeline = DiscoveryPipeline::from_config(&config).unwrap_or_else(|err| {
        warn!(error = %err, "falling back to built-in vocabulary and catalog");
        DiscoveryPipeline::with_defaults(&config)
    });
    pipeline.run(items, Utc::now())
}

pub fn discover_with_config(
    items: &[ContentItem],
    config: &DiscoveryConfig,
    now: DateTime<Utc>,
) -> Result<OpportunityReport, DiscoveryError> {
    let pipeline = DiscoveryPipeline::from_config(config)?;
    Ok(pipeline.run(items, now))
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn format_number(value: f64) -> String {
    let rounded = value.round().max(0.0) as i64;
    let mut chars: Vec<char> = rounded.to_string().chars().collect();
    let mut result = String::new();
    let mut count = 0usize;

    while let Some(ch) = chars.pop() {
        if count == 3 {
            result.push(',');
            count = 0;
        }
        result.push(ch);
        count += 1;
    }

    result.chars().rev().collect()
}

pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

pub fn format_float(value: f64, digits: usize) -> String {
    format!("{:.1$}", value, digits)
}
