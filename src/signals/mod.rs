pub mod problem;
pub mod product;
pub mod vocabulary;

pub use problem::ProblemSignals;
pub use product::{ProductMention, ProductSignals, BRAND_CONFIDENCE, GENERIC_CONFIDENCE};
pub use vocabulary::{BrandGroup, ProductCategory, Vocabulary};

/// Substring matching over a fixed [`Vocabulary`]. Every method returns an
/// empty result for empty text instead of failing.
#[derive(Debug, Clone)]
pub struct SignalDetector {
    vocabulary: Vocabulary,
}

impl Default for SignalDetector {
    fn default() -> Self {
        Self::new(Vocabulary::default())
    }
}

impl SignalDetector {
    pub fn new(vocabulary: Vocabulary) -> Self {
        Self {
            vocabulary: vocabulary.normalized(),
        }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn detect_problem_keywords(&self, text: &str) -> ProblemSignals {
        problem::detect(&self.vocabulary, text)
    }

    pub fn detect_product_keywords(&self, text: &str) -> ProductSignals {
        product::detect(&self.vocabulary, text)
    }

    pub fn extract_actual_products(&self, text: &str) -> Vec<ProductMention> {
        product::extract(&self.vocabulary, text)
    }
}
