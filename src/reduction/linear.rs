// Linear projection: centre on the training mean, then project onto the
// fitted component rows (the shape a PCA export takes).

use serde::{Deserialize, Serialize};

use super::traits::{check_rows, DimensionalityReducer};
use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearProjection {
    /// Per-feature mean subtracted before projecting. Empty means no centring.
    #[serde(default)]
    pub mean: Vec<f32>,
    /// One row per output dimension, each of length `input_dim`.
    pub components: Vec<Vec<f32>>,
}

impl LinearProjection {
    pub fn validate(&self) -> std::result::Result<(), String> {
        let input_dim = match self.components.first() {
            Some(row) if !row.is_empty() => row.len(),
            _ => return Err("projection has no components".to_string()),
        };
        if self.components.iter().any(|row| row.len() != input_dim) {
            return Err("projection components have differing lengths".to_string());
        }
        if !self.mean.is_empty() && self.mean.len() != input_dim {
            return Err(format!(
                "projection mean has length {}, components expect {input_dim}",
                self.mean.len()
            ));
        }
        Ok(())
    }

    fn project(&self, x: &[f32]) -> Vec<f32> {
        self.components
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .map(|(j, w)| (x[j] - self.mean.get(j).copied().unwrap_or(0.0)) * w)
                    .sum()
            })
            .collect()
    }
}

impl DimensionalityReducer for LinearProjection {
    fn input_dim(&self) -> usize {
        self.components.first().map_or(0, Vec::len)
    }

    fn output_dim(&self) -> usize {
        self.components.len()
    }

    fn transform(&self, batch: &[Vec<f32>]) -> Result<Vec<Vec<f32>>> {
        check_rows(batch, self.input_dim())?;
        Ok(batch.iter().map(|x| self.project(x)).collect())
    }
}
