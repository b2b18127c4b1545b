use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::DiscoveryError;
use crate::vector::RawEmbedding;
use crate::{ContentItem, Engagement, Platform};

/// Epoch values above this are read as milliseconds rather than seconds.
const MILLIS_THRESHOLD: f64 = 1e11;

/// Timestamps arrive as ISO strings, plain datetimes, or epoch numbers
/// depending on the source. Anything else parses to `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Seconds(i64),
    Fractional(f64),
    Text(String),
    Other(Value),
}

impl RawTimestamp {
    pub fn parse(&self) -> Option<DateTime<Utc>> {
        match self {
            RawTimestamp::Seconds(value) => from_epoch(*value as f64),
            RawTimestamp::Fractional(value) => from_epoch(*value),
            RawTimestamp::Text(text) => parse_timestamp(text),
            RawTimestamp::Other(_) => None,
        }
    }
}

pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(Utc.from_utc_datetime(&parsed));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|parsed| Utc.from_utc_datetime(&parsed));
    }
    trimmed.parse::<f64>().ok().and_then(from_epoch)
}

/// Unix seconds, or milliseconds once the value is too large to be a
/// plausible seconds count.
fn from_epoch(value: f64) -> Option<DateTime<Utc>> {
    if !value.is_finite() {
        return None;
    }
    let millis = if value.abs() > MILLIS_THRESHOLD {
        value
    } else {
        value * 1000.0
    };
    if millis.abs() >= i64::MAX as f64 {
        return None;
    }
    Utc.timestamp_millis_opt(millis.round() as i64).single()
}

/// Counts arrive as integers, floats, numeric strings or null. Anything that
/// is not a usable non-negative number reads as 0.
fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(number)) => number
            .as_u64()
            .or_else(|| {
                number
                    .as_f64()
                    .filter(|count| count.is_finite() && *count >= 0.0)
                    .map(|count| count as u64)
            })
            .unwrap_or(0),
        Some(Value::String(text)) => text.trim().parse::<u64>().unwrap_or(0),
        _ => 0,
    })
}

/// Explicit engagement figure; null or non-numeric values read as absent.
fn lenient_score<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(number)) => number.as_f64().filter(|score| score.is_finite()),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok().filter(|score| score.is_finite()),
        _ => None,
    })
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InstagramPost {
    pub id: Option<String>,
    pub caption: String,
    pub hashtags: Vec<String>,
    #[serde(deserialize_with = "lenient_count")]
    pub likes_count: u64,
    #[serde(deserialize_with = "lenient_count")]
    pub comments_count: u64,
    #[serde(deserialize_with = "lenient_count")]
    pub video_view_count: u64,
    #[serde(deserialize_with = "lenient_score")]
    pub engagement: Option<f64>,
    pub timestamp: Option<RawTimestamp>,
    pub embedding: Option<RawEmbedding>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TikTokVideo {
    pub id: Option<String>,
    #[serde(alias = "desc")]
    pub description: String,
    pub hashtags: Vec<String>,
    #[serde(deserialize_with = "lenient_count")]
    pub digg_count: u64,
    #[serde(deserialize_with = "lenient_count")]
    pub comment_count: u64,
    #[serde(deserialize_with = "lenient_count")]
    pub share_count: u64,
    #[serde(deserialize_with = "lenient_count")]
    pub play_count: u64,
    #[serde(deserialize_with = "lenient_score")]
    pub engagement: Option<f64>,
    pub create_time: Option<RawTimestamp>,
    pub embedding: Option<RawEmbedding>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductHuntItem {
    pub id: Option<String>,
    pub name: String,
    pub tagline: String,
    pub description: String,
    pub topics: Vec<String>,
    #[serde(deserialize_with = "lenient_count")]
    pub votes_count: u64,
    #[serde(deserialize_with = "lenient_count")]
    pub comments_count: u64,
    #[serde(alias = "featured_at")]
    pub created_at: Option<RawTimestamp>,
    pub embedding: Option<RawEmbedding>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HuggingFaceModel {
    #[serde(alias = "model_id", alias = "modelId")]
    pub id: Option<String>,
    pub pipeline_tag: Option<String>,
    pub description: String,
    pub tags: Vec<String>,
    #[serde(deserialize_with = "lenient_count")]
    pub downloads: u64,
    #[serde(deserialize_with = "lenient_count")]
    pub likes: u64,
    #[serde(alias = "lastModified", alias = "last_modified")]
    pub created_at: Option<RawTimestamp>,
    pub embedding: Option<RawEmbedding>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "platform", rename_all = "snake_case")]
pub enum SourceRecord {
    #[serde(alias = "ig")]
    Instagram(InstagramPost),
    Tiktok(TikTokVideo),
    #[serde(alias = "producthunt")]
    ProductHunt(ProductHuntItem),
    #[serde(alias = "huggingface", alias = "hf")]
    HuggingFace(HuggingFaceModel),
}

impl SourceRecord {
    pub fn into_content_item(self) -> ContentItem {
        match self {
            SourceRecord::Instagram(post) => normalize_instagram(post),
            SourceRecord::Tiktok(video) => normalize_tiktok(video),
            SourceRecord::ProductHunt(item) => normalize_product_hunt(item),
            SourceRecord::HuggingFace(model) => normalize_hugging_face(model),
        }
    }
}

/// Parses a JSON array of source records. A record that does not fit any
/// platform shape is logged and skipped; only a payload that is not an
/// array fails.
pub fn load_records(json: &str) -> Result<Vec<ContentItem>, DiscoveryError> {
    let values: Vec<Value> = serde_json::from_str(json)?;
    Ok(normalize_records(values))
}

pub fn normalize_records(values: Vec<Value>) -> Vec<ContentItem> {
    let total = values.len();
    let items: Vec<ContentItem> = values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value::<SourceRecord>(value) {
            Ok(record) => Some(record.into_content_item()),
            Err(err) => {
                warn!(index, error = %err, "skipping malformed source record");
                None
            }
        })
        .collect();
    if items.len() < total {
        warn!(
            skipped = total - items.len(),
            total,
            "some source records could not be read"
        );
    }
    items
}

fn normalize_instagram(post: InstagramPost) -> ContentItem {
    let id = resolve_id(post.id, &Platform::Instagram, &post.caption);
    ContentItem {
        id,
        platform: Platform::Instagram,
        text: post.caption,
        embedding: post.embedding,
        engagement: Engagement {
            likes: post.likes_count,
            comments: post.comments_count,
            shares: 0,
            views: post.video_view_count,
            score: post.engagement,
        },
        posted_at: post.timestamp.as_ref().and_then(RawTimestamp::parse),
        hashtags: post.hashtags,
    }
}

fn normalize_tiktok(video: TikTokVideo) -> ContentItem {
    let id = resolve_id(video.id, &Platform::TikTok, &video.description);
    ContentItem {
        id,
        platform: Platform::TikTok,
        text: video.description,
        embedding: video.embedding,
        engagement: Engagement {
            likes: video.digg_count,
            comments: video.comment_count,
            shares: video.share_count,
            views: video.play_count,
            score: video.engagement,
        },
        posted_at: video.create_time.as_ref().and_then(RawTimestamp::parse),
        hashtags: video.hashtags,
    }
}

fn normalize_product_hunt(item: ProductHuntItem) -> ContentItem {
    let text = join_text(&[&item.name, &item.tagline, &item.description]);
    let id = resolve_id(item.id, &Platform::ProductHunt, &text);
    ContentItem {
        id,
        platform: Platform::ProductHunt,
        text,
        embedding: item.embedding,
        engagement: Engagement {
            likes: item.votes_count,
            comments: item.comments_count,
            ..Engagement::default()
        },
        posted_at: item.created_at.as_ref().and_then(RawTimestamp::parse),
        hashtags: item.topics,
    }
}

fn normalize_hugging_face(model: HuggingFaceModel) -> ContentItem {
    let name = model.id.clone().unwrap_or_default();
    let pipeline_tag = model.pipeline_tag.clone().unwrap_or_default();
    let text = join_text(&[&name, &pipeline_tag, &model.description]);
    let id = resolve_id(model.id, &Platform::HuggingFace, &text);
    ContentItem {
        id,
        platform: Platform::HuggingFace,
        text,
        embedding: model.embedding,
        engagement: Engagement {
            likes: model.likes,
            views: model.downloads,
            ..Engagement::default()
        },
        posted_at: model.created_at.as_ref().and_then(RawTimestamp::parse),
        hashtags: model.tags,
    }
}

fn join_text(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn resolve_id(id: Option<String>, platform: &Platform, text: &str) -> String {
    id.filter(|value| !value.trim().is_empty()).unwrap_or_else(|| {
        let payload = format!("{}:{}", platform.label(), text);
        format!("{}_{:x}", platform.label(), stable_hash64(&payload))
    })
}

fn stable_hash64(value: &str) -> u64 {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}
