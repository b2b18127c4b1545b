pub mod catalog;
pub mod evaluator;
pub mod pipeline;

pub use catalog::{CatalogMatch, MatchSource, ProductCatalog, ProductCatalogEntry};
pub use evaluator::{ClusterStats, OpportunityEvaluator, ProductFrequency, RelatedContent};
pub use pipeline::{DiscoveryPipeline, Opportunity, OpportunityReport};
