// Dimensionality reducer trait — applies a transform fitted offline.

use crate::error::Result;

pub trait DimensionalityReducer: Send + Sync {
    /// Dimensionality of the embeddings the transform accepts.
    fn input_dim(&self) -> usize;

    /// Dimensionality of the vectors it produces.
    fn output_dim(&self) -> usize;

    /// Map each embedding into the reduced space, in input order. Never
    /// refits; a row with the wrong dimensionality fails the whole batch.
    fn transform(&self, batch: &[Vec<f32>]) -> Result<Vec<Vec<f32>>>;
}

/// Reject any row whose length differs from `expected`.
pub(crate) fn check_rows(batch: &[Vec<f32>], expected: usize) -> Result<()> {
    if let Some((row, v)) = batch.iter().enumerate().find(|(_, v)| v.len() != expected) {
        return Err(crate::error::PipelineError::inference(format!(
            "reduction input row {row} has dimension {}, model expects {expected}",
            v.len()
        )));
    }
    Ok(())
}
