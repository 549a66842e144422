// Cluster assigner trait.
//
// The pipeline only needs "vector in, cluster id out". KMeans is the one
// fitted model we ship, chosen because it labels every point; a density
// based model that leaves points as noise would need a different contract.

use super::ClusterId;
use crate::error::Result;

pub trait ClusterAssigner: Send + Sync {
    /// Dimensionality of the vectors the model was fitted on.
    fn dim(&self) -> usize;

    /// Ids of every cluster this model can return.
    fn cluster_ids(&self) -> Vec<ClusterId>;

    /// Assign each vector to exactly one cluster, in input order.
    fn predict(&self, batch: &[Vec<f32>]) -> Result<Vec<ClusterId>>;
}
