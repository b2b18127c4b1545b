use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::vector::cosine_distance;

pub const DEFAULT_MAX_ITERATIONS: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub id: usize,
    pub centroid: Vec<f64>,
    /// Positions in the collection that was clustered.
    pub members: Vec<usize>,
}

impl Cluster {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// K-means over cosine distance with centroids seeded by uniform sampling
/// (with replacement) from the input.
#[derive(Debug, Clone)]
pub struct KMeansClusterer {
    max_iterations: usize,
    time_budget: Option<Duration>,
}

impl Default for KMeansClusterer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ITERATIONS)
    }
}

impl KMeansClusterer {
    pub fn new(max_iterations: usize) -> Self {
        Self {
            max_iterations: max_iterations.max(1),
            time_budget: None,
        }
    }

    pub fn with_time_budget(mut self, budget: Option<Duration>) -> Self {
        self.time_budget = budget;
        self
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn cluster<R: Rng + ?Sized>(&self, vectors: &[Vec<f64>], k: usize, rng: &mut R) -> Vec<Cluster> {
        if vectors.is_empty() || k == 0 {
            return Vec::new();
        }
        // At most one non-empty cluster per vector.
        let k = k.min(vectors.len());

        let mut centroids: Vec<Vec<f64>> = (0..k)
            .map(|_| vectors[rng.gen_range(0..vectors.len())].clone())
            .collect();
        let mut assignments = vec![usize::MAX; vectors.len()];
        let started = Instant::now();
        let mut iterations = 0usize;
        let mut converged = false;

        while iterations < self.max_iterations {
            // At least one assignment pass always runs so every vector lands somewhere.
            if iterations > 0 {
                if let Some(budget) = self.time_budget {
                    if started.elapsed() >= budget {
                        warn!(
                            iterations,
                            budget_ms = budget.as_millis() as u64,
                            "k-means time budget exhausted; returning current assignment"
                        );
                        break;
                    }
                }
            }
            iterations += 1;

            let mut changed = false;
            for (index, vector) in vectors.iter().enumerate() {
                let nearest = nearest_centroid(vector, &centroids);
                if assignments[index] != nearest {
                    assignments[index] = nearest;
                    changed = true;
                }
            }

            if !changed {
                converged = true;
                break;
            }

            update_centroids(vectors, &assignments, &mut centroids);
        }

        debug!(
            vectors = vectors.len(),
            k,
            iterations,
            converged,
            "k-means finished"
        );

        centroids
            .into_iter()
            .enumerate()
            .filter_map(|(id, centroid)| {
                let members: Vec<usize> = assignments
                    .iter()
                    .enumerate()
                    .filter(|(_, assigned)| **assigned == id)
                    .map(|(index, _)| index)
                    .collect();
                if members.is_empty() {
                    None
                } else {
                    Some(Cluster {
                        id,
                        centroid,
                        members,
                    })
                }
            })
            .collect()
    }
}

pub fn cluster_vectors_by_kmeans<R: Rng + ?Sized>(
    vectors: &[Vec<f64>],
    k: usize,
    rng: &mut R,
) -> Vec<Cluster> {
    KMeansClusterer::default().cluster(vectors, k, rng)
}

fn nearest_centroid(vector: &[f64], centroids: &[Vec<f64>]) -> usize {
    let mut best = 0usize;
    let mut best_distance = f64::INFINITY;
    for (index, centroid) in centroids.iter().enumerate() {
        let distance = cosine_distance(vector, centroid);
        if distance < best_distance {
            best = index;
            best_distance = distance;
        }
    }
    best
}

fn update_centroids(vectors: &[Vec<f64>], assignments: &[usize], centroids: &mut [Vec<f64>]) {
    for (id, centroid) in centroids.iter_mut().enumerate() {
        let mut sum = vec![0.0; centroid.len()];
        let mut count = 0usize;
        for (vector, &assigned) in vectors.iter().zip(assignments.iter()) {
            if assigned != id {
                continue;
            }
            for (total, value) in sum.iter_mut().zip(vector.iter()) {
                *total += value;
            }
            count += 1;
        }

        // Empty clusters keep their previous centroid.
        if count == 0 {
            continue;
        }
        for total in sum.iter_mut() {
            *total /= count as f64;
        }
        *centroid = sum;
    }
}
