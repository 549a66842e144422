// Fitted KMeans model — nearest-centroid assignment.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::traits::ClusterAssigner;
use super::ClusterId;
use crate::error::{PipelineError, Result};

/// Centroids exported from the offline KMeans fit. Cluster `i` is the
/// centroid at row `i`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KMeansModel {
    pub centroids: Vec<Vec<f32>>,
}

impl KMeansModel {
    /// Check that the model has at least one centroid and that every
    /// centroid has the same, non-zero dimensionality.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let dim = match self.centroids.first() {
            Some(first) if !first.is_empty() => first.len(),
            Some(_) => return Err("centroid 0 is empty".to_string()),
            None => return Err("model has no centroids".to_string()),
        };
        if let Some((i, c)) = self
            .centroids
            .iter()
            .enumerate()
            .find(|(_, c)| c.len() != dim)
        {
            return Err(format!(
                "centroid {i} has dimension {}, expected {dim}",
                c.len()
            ));
        }
        Ok(())
    }

    pub fn n_clusters(&self) -> usize {
        self.centroids.len()
    }

    /// Index of the closest centroid. Ties resolve to the lower index,
    /// matching scikit-learn's argmin.
    fn nearest(&self, point: &[f32]) -> usize {
        let mut best = 0;
        let mut best_dist = f32::INFINITY;
        for (i, centroid) in self.centroids.iter().enumerate() {
            let dist = squared_distance(point, centroid);
            if dist < best_dist {
                best = i;
                best_dist = dist;
            }
        }
        best
    }
}

impl ClusterAssigner for KMeansModel {
    fn dim(&self) -> usize {
        self.centroids.first().map_or(0, Vec::len)
    }

    fn cluster_ids(&self) -> Vec<ClusterId> {
        (0..self.centroids.len() as u32).map(ClusterId).collect()
    }

    fn predict(&self, batch: &[Vec<f32>]) -> Result<Vec<ClusterId>> {
        let dim = self.dim();
        let ids = batch
            .iter()
            .enumerate()
            .map(|(row, point)| {
                if point.len() != dim {
                    return Err(PipelineError::inference(format!(
                        "cluster input row {row} has dimension {}, model expects {dim}",
                        point.len()
                    )));
                }
                if point.iter().any(|v| !v.is_finite()) {
                    return Err(PipelineError::inference(format!(
                        "cluster input row {row} contains a non-finite value"
                    )));
                }
                Ok(ClusterId(self.nearest(point) as u32))
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(batch = batch.len(), clusters = self.n_clusters(), "Assigned clusters");
        Ok(ids)
    }
}

fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
