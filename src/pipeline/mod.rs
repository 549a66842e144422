// Prediction pipeline — text in, topic out.
//
//   texts -> encode -> reduce -> assign cluster -> resolve topic
//
// Each stage runs once over the whole batch. A failure anywhere fails the
// whole call; there are no partial results.

use serde::Serialize;
use tracing::{debug, info};

use crate::artifacts::{ArtifactStore, EMBEDDINGS_FILE};
use crate::cluster::traits::ClusterAssigner;
use crate::cluster::ClusterId;
use crate::config::Config;
use crate::encoder::download::encoder_model_dir;
use crate::encoder::onnx::SentenceEncoder;
use crate::encoder::traits::TextEncoder;
use crate::error::{PipelineError, Result};
use crate::reduction::traits::DimensionalityReducer;
use crate::topics::resolver::TopicResolver;

/// The topic predicted for one input text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub text: String,
    pub cluster: ClusterId,
    pub label: String,
    /// Top keywords of the cluster, most representative first
    pub keywords: Vec<String>,
}

/// Owns the loaded artifacts and the encoder for its whole lifetime.
pub struct PredictionPipeline {
    store: ArtifactStore,
    encoder: Box<dyn TextEncoder>,
    resolver: TopicResolver,
}

impl PredictionPipeline {
    /// Assemble a pipeline from already-loaded parts. Fails if the encoder
    /// produces vectors the reduction model can't accept.
    pub fn new(store: ArtifactStore, encoder: Box<dyn TextEncoder>, top_n: usize) -> Result<Self> {
        let expected = store.reducer().input_dim();
        if encoder.dim() != expected {
            return Err(PipelineError::artifact(
                store.base_dir().join(EMBEDDINGS_FILE),
                format!(
                    "encoder produces {}-d vectors but the artifacts were built from {expected}-d embeddings",
                    encoder.dim()
                ),
            ));
        }
        let resolver = TopicResolver::new(store.topics().clone(), top_n);
        Ok(Self {
            store,
            encoder,
            resolver,
        })
    }

    /// Load the artifacts and the sentence encoder named by `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let store = ArtifactStore::load(&config.artifact_dir)?;
        info!("Initializing the sentence encoder");
        let encoder = SentenceEncoder::load(&encoder_model_dir(&config.model_dir))?;
        Self::new(store, Box::new(encoder), config.top_keywords)
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Predict a topic for each text. Output order and length match the
    /// input exactly; duplicates are predicted independently.
    pub fn predict(&self, texts: &[String]) -> Result<Vec<PredictionResult>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let embeddings = self.encoder.encode(texts)?;
        expect_len("encoder", embeddings.len(), texts.len())?;
        debug!(batch = texts.len(), "Encoded texts");

        let reduced = self.store.reducer().transform(&embeddings)?;
        expect_len("reducer", reduced.len(), texts.len())?;
        debug!(batch = texts.len(), "Reduced embeddings");

        let clusters = self.store.cluster_model().predict(&reduced)?;
        expect_len("cluster model", clusters.len(), texts.len())?;

        let results = texts
            .iter()
            .zip(clusters)
            .map(|(text, cluster)| {
                let topic = self.resolver.resolve(cluster)?;
                Ok(PredictionResult {
                    text: text.clone(),
                    cluster,
                    label: topic.label,
                    keywords: topic.keywords,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        info!(batch = results.len(), "Predicted topics");
        Ok(results)
    }
}

fn expect_len(stage: &str, actual: usize, expected: usize) -> Result<()> {
    if actual != expected {
        return Err(PipelineError::inference(format!(
            "{stage} returned {actual} rows for {expected} inputs"
        )));
    }
    Ok(())
}
