// UMAP-style out-of-sample transform.
//
// UMAP places an unseen point by finding its k nearest neighbours among the
// training embeddings, turning their distances into fuzzy membership
// strengths, and taking the membership-weighted average of where those
// neighbours landed in the reduced space. That initial placement is what we
// compute here. The SGD refinement UMAP runs afterwards is stochastic and
// is not reproduced, which keeps predictions deterministic.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::traits::{check_rows, DimensionalityReducer};
use crate::error::{PipelineError, Result};

const SMOOTH_K_TOLERANCE: f64 = 1e-5;
const MIN_K_DIST_SCALE: f64 = 1e-3;
const CALIBRATION_ITERATIONS: usize = 64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    #[default]
    Euclidean,
    Cosine,
}

impl Metric {
    fn distance(self, a: &[f32], b: &[f32]) -> f64 {
        match self {
            Metric::Euclidean => a
                .iter()
                .zip(b)
                .map(|(x, y)| {
                    let d = (*x - *y) as f64;
                    d * d
                })
                .sum::<f64>()
                .sqrt(),
            Metric::Cosine => {
                let mut dot = 0.0f64;
                let mut na = 0.0f64;
                let mut nb = 0.0f64;
                for (x, y) in a.iter().zip(b) {
                    dot += (*x as f64) * (*y as f64);
                    na += (*x as f64) * (*x as f64);
                    nb += (*y as f64) * (*y as f64);
                }
                if na == 0.0 || nb == 0.0 {
                    1.0
                } else {
                    (1.0 - dot / (na.sqrt() * nb.sqrt())).max(0.0)
                }
            }
        }
    }
}

fn default_n_neighbors() -> usize {
    15
}

/// Parameters stored in the reduction model file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeighborParams {
    #[serde(default = "default_n_neighbors")]
    pub n_neighbors: usize,
    #[serde(default)]
    pub metric: Metric,
}

/// The neighbour transform bound to the training embeddings it searches and
/// the reduced coordinates it interpolates.
#[derive(Debug, Clone)]
pub struct NeighborTransform {
    params: NeighborParams,
    embeddings: Arc<Vec<Vec<f32>>>,
    reduced: Arc<Vec<Vec<f32>>>,
}

impl NeighborTransform {
    /// Both matrices must be non-empty with matching row counts; the
    /// artifact store checks this before building the transform.
    pub fn new(
        params: NeighborParams,
        embeddings: Arc<Vec<Vec<f32>>>,
        reduced: Arc<Vec<Vec<f32>>>,
    ) -> Self {
        Self {
            params,
            embeddings,
            reduced,
        }
    }

    pub fn params(&self) -> &NeighborParams {
        &self.params
    }

    /// The k nearest training rows as (index, distance), closest first.
    /// Equal distances are ordered by index so results never depend on
    /// sort stability.
    fn nearest(&self, point: &[f32]) -> Vec<(usize, f64)> {
        let mut dists: Vec<(usize, f64)> = self
            .embeddings
            .iter()
            .enumerate()
            .map(|(i, row)| (i, self.params.metric.distance(point, row)))
            .collect();
        if dists.is_empty() {
            return dists;
        }

        let k = self.params.n_neighbors.clamp(1, dists.len());
        let by_distance = |a: &(usize, f64), b: &(usize, f64)| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0));
        if k < dists.len() {
            dists.select_nth_unstable_by(k - 1, by_distance);
            dists.truncate(k);
        }
        dists.sort_unstable_by(by_distance);
        dists
    }

    fn place(&self, point: &[f32]) -> Result<Vec<f32>> {
        let neighbors = self.nearest(point);

        // An exact match has membership 1 and is copied outright.
        if let Some(&(idx, _)) = neighbors.iter().find(|(_, d)| *d <= 0.0) {
            return Ok(self.reduced[idx].clone());
        }

        let distances: Vec<f64> = neighbors.iter().map(|(_, d)| *d).collect();
        let weights = membership_strengths(&distances, self.params.n_neighbors);
        let total: f64 = weights.iter().sum();
        if !(total > 0.0 && total.is_finite()) {
            return Err(PipelineError::inference(
                "neighbour weights vanished; input is too far from every training point",
            ));
        }

        let mut out = vec![0.0f64; self.output_dim()];
        for ((idx, _), w) in neighbors.iter().zip(&weights) {
            for (o, v) in out.iter_mut().zip(&self.reduced[*idx]) {
                *o += w / total * (*v as f64);
            }
        }
        Ok(out.into_iter().map(|v| v as f32).collect())
    }
}

/// Fuzzy membership of each neighbour, UMAP's smooth-kNN calibration as
/// applied to new points (local connectivity 0, so rho = 0). Sigma is
/// found by bisection so that the memberships of neighbours 1..k sum to
/// log2(n_neighbors).
pub fn membership_strengths(distances: &[f64], n_neighbors: usize) -> Vec<f64> {
    if distances.is_empty() {
        return Vec::new();
    }
    let target = (n_neighbors.max(2) as f64).log2();

    let mut lo = 0.0f64;
    let mut hi = f64::INFINITY;
    let mut sigma = 1.0f64;

    for _ in 0..CALIBRATION_ITERATIONS {
        let psum: f64 = distances
            .iter()
            .skip(1)
            .map(|&d| if d > 0.0 { (-d / sigma).exp() } else { 1.0 })
            .sum();

        if (psum - target).abs() < SMOOTH_K_TOLERANCE {
            break;
        }
        if psum > target {
            hi = sigma;
            sigma = (lo + hi) / 2.0;
        } else {
            lo = sigma;
            if hi == f64::INFINITY {
                sigma *= 2.0;
            } else {
                sigma = (lo + hi) / 2.0;
            }
        }
    }

    let mean_distance = distances.iter().sum::<f64>() / distances.len() as f64;
    sigma = sigma.max(MIN_K_DIST_SCALE * mean_distance);

    distances
        .iter()
        .map(|&d| {
            if d <= 0.0 || sigma == 0.0 {
                1.0
            } else {
                (-d / sigma).exp()
            }
        })
        .collect()
}

impl DimensionalityReducer for NeighborTransform {
    fn input_dim(&self) -> usize {
        self.embeddings.first().map_or(0, Vec::len)
    }

    fn output_dim(&self) -> usize {
        self.reduced.first().map_or(0, Vec::len)
    }

    fn transform(&self, batch: &[Vec<f32>]) -> Result<Vec<Vec<f32>>> {
        check_rows(batch, self.input_dim())?;
        let out = batch
            .iter()
            .map(|x| self.place(x))
            .collect::<Result<Vec<_>>>()?;
        debug!(
            batch = batch.len(),
            k = self.params.n_neighbors,
            training_rows = self.embeddings.len(),
            "Placed points by neighbour interpolation"
        );
        Ok(out)
    }
}
