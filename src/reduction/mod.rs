// Dimensionality reduction — applies the fitted UMAP (or linear) transform
// that maps 384-d sentence embeddings into the space KMeans was fitted on.

pub mod linear;
pub mod neighbors;
pub mod traits;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use self::linear::LinearProjection;
use self::neighbors::{NeighborParams, NeighborTransform};
use self::traits::DimensionalityReducer;
use crate::error::Result;

/// Contents of the reduction model file, tagged by `kind`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReductionModel {
    /// Precomputed projection matrix.
    Linear(LinearProjection),
    /// UMAP transform over the training embeddings and their reduced
    /// coordinates.
    Neighbors(NeighborParams),
}

/// A reduction model ready to transform, with any training data it needs.
#[derive(Debug, Clone)]
pub enum Reducer {
    Linear(LinearProjection),
    Neighbors(NeighborTransform),
}

impl Reducer {
    pub fn build(
        model: ReductionModel,
        embeddings: Arc<Vec<Vec<f32>>>,
        reduced: Arc<Vec<Vec<f32>>>,
    ) -> Self {
        match model {
            ReductionModel::Linear(p) => Reducer::Linear(p),
            ReductionModel::Neighbors(params) => {
                Reducer::Neighbors(NeighborTransform::new(params, embeddings, reduced))
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Reducer::Linear(_) => "linear",
            Reducer::Neighbors(_) => "neighbors",
        }
    }
}

impl DimensionalityReducer for Reducer {
    fn input_dim(&self) -> usize {
        match self {
            Reducer::Linear(p) => p.input_dim(),
            Reducer::Neighbors(n) => n.input_dim(),
        }
    }

    fn output_dim(&self) -> usize {
        match self {
            Reducer::Linear(p) => p.output_dim(),
            Reducer::Neighbors(n) => n.output_dim(),
        }
    }

    fn transform(&self, batch: &[Vec<f32>]) -> Result<Vec<Vec<f32>>> {
        match self {
            Reducer::Linear(p) => p.transform(batch),
            Reducer::Neighbors(n) => n.transform(batch),
        }
    }
}
