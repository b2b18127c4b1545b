pub mod kmeans;

pub use kmeans::{cluster_vectors_by_kmeans, Cluster, KMeansClusterer, DEFAULT_MAX_ITERATIONS};
