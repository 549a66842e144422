// Error taxonomy for the prediction pipeline.
//
// Artifact problems are fatal at startup. Inference problems fail the whole
// batch call.

use std::path::PathBuf;

use thiserror::Error;

use crate::cluster::ClusterId;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// A required artifact is missing, unreadable, or has the wrong shape.
    #[error("artifact missing or corrupt: {}: {reason}", path.display())]
    ArtifactLoad { path: PathBuf, reason: String },

    /// Encoding, reduction, or cluster assignment failed for a batch.
    #[error("model inference failed: {0}")]
    ModelInference(String),

    /// A cluster id with no entry in the keyword or label tables.
    #[error("no such cluster: {0}")]
    UnknownCluster(ClusterId),
}

impl PipelineError {
    pub(crate) fn artifact(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::ArtifactLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn inference(reason: impl ToString) -> Self {
        Self::ModelInference(reason.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
