use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawEmbedding {
    Values(Vec<f64>),
    Text(String),
    Other(serde_json::Value),
}

impl From<Vec<f64>> for RawEmbedding {
    fn from(values: Vec<f64>) -> Self {
        RawEmbedding::Values(values)
    }
}

impl From<&str> for RawEmbedding {
    fn from(text: &str) -> Self {
        RawEmbedding::Text(text.to_string())
    }
}

pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let magnitude = norm_a.sqrt() * norm_b.sqrt();
    if magnitude == 0.0 || !magnitude.is_finite() {
        return 0.0;
    }

    (dot / magnitude).clamp(-1.0, 1.0)
}

pub fn cosine_distance(a: &[f64], b: &[f64]) -> f64 {
    1.0 - cosine_similarity(a, b)
}

pub fn parse_vector(raw: &RawEmbedding) -> Vec<f64> {
    match raw {
        RawEmbedding::Values(values) => values.clone(),
        RawEmbedding::Text(text) => parse_vector_str(text),
        RawEmbedding::Other(_) => Vec::new(),
    }
}

/// Parses `[n1,n2,...]`. Tokens that are not numbers are dropped, so a string
/// with no numeric token at all comes back empty.
pub fn parse_vector_str(text: &str) -> Vec<f64> {
    let inner = text
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']');

    inner
        .split(',')
        .filter_map(|token| token.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .collect()
}
