use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::signals::vocabulary::{ProductCategory, Vocabulary};

pub const BRAND_CONFIDENCE: f64 = 0.9;
pub const GENERIC_CONFIDENCE: f64 = 0.7;
const ACTUAL_PRODUCT_BONUS: f64 = 0.3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductMention {
    pub product: String,
    pub category: ProductCategory,
    pub confidence: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductSignals {
    pub is_product_related: bool,
    pub keywords: Vec<String>,
    pub actual_products: Vec<ProductMention>,
    pub product_score: f64,
}

pub(crate) fn detect(vocabulary: &Vocabulary, text: &str) -> ProductSignals {
    let lowercase = text.to_lowercase();
    if lowercase.trim().is_empty() {
        return ProductSignals::default();
    }

    let keywords: Vec<String> = vocabulary
        .product_keywords
        .iter()
        .filter(|keyword| lowercase.contains(keyword.as_str()))
        .cloned()
        .collect();
    let actual_products = extract_lowercase(vocabulary, &lowercase);

    let mut product_score = if vocabulary.product_keywords.is_empty() {
        0.0
    } else {
        keywords.len() as f64 / vocabulary.product_keywords.len() as f64
    };
    if !actual_products.is_empty() {
        product_score += ACTUAL_PRODUCT_BONUS;
    }

    ProductSignals {
        is_product_related: !keywords.is_empty() || !actual_products.is_empty(),
        keywords,
        actual_products,
        product_score,
    }
}

pub(crate) fn extract(vocabulary: &Vocabulary, text: &str) -> Vec<ProductMention> {
    extract_lowercase(vocabulary, &text.to_lowercase())
}

fn extract_lowercase(vocabulary: &Vocabulary, lowercase: &str) -> Vec<ProductMention> {
    let mut mentions = Vec::new();
    if lowercase.trim().is_empty() {
        return mentions;
    }

    for group in &vocabulary.brands {
        for name in &group.names {
            if lowercase.contains(name.as_str()) {
                mentions.push(ProductMention {
                    product: name.clone(),
                    category: group.category,
                    confidence: BRAND_CONFIDENCE,
                });
            }
        }
    }

    for name in &vocabulary.generic_products {
        if lowercase.contains(name.as_str()) {
            mentions.push(ProductMention {
                product: name.clone(),
                category: ProductCategory::General,
                confidence: GENERIC_CONFIDENCE,
            });
        }
    }

    mentions.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });
    mentions
}
