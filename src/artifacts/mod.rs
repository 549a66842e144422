// ArtifactStore — loads everything the offline training run produced.
//
// All artifacts are loaded once, cross-checked for consistency, and then
// held read-only. Any missing, unreadable, or inconsistent file is a fatal
// startup error: there is no partially loaded store.

pub mod npy;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::cluster::kmeans::KMeansModel;
use crate::cluster::traits::ClusterAssigner;
use crate::cluster::ClusterId;
use crate::error::{PipelineError, Result};
use crate::reduction::traits::DimensionalityReducer;
use crate::reduction::{ReductionModel, Reducer};
use crate::topics::table::{RawKeywordTable, RawLabelTable, TopicTable};

pub const EMBEDDINGS_FILE: &str = "all-the-news-embeddings-title.npy";
pub const EMBEDDING_INDEX_FILE: &str = "all-the-news-embeddings-title-index.npy";
pub const REDUCED_EMBEDDINGS_FILE: &str = "all-the-news-embeddings-title-umap.npy";
pub const REDUCTION_MODEL_FILE: &str = "umap-model.json";
pub const CLUSTER_MODEL_FILE: &str = "kmeans-model.json";
pub const CLUSTER_LABELS_FILE: &str = "umap-kmeans-labels.npy";
pub const KEYWORD_TABLE_FILE: &str = "umap-kmeans-topics.json";
pub const LABEL_TABLE_FILE: &str = "umap-kmeans-topic-labels.json";

/// Every file `ArtifactStore::load` reads, in load order.
pub const REQUIRED_FILES: [&str; 8] = [
    EMBEDDINGS_FILE,
    EMBEDDING_INDEX_FILE,
    REDUCED_EMBEDDINGS_FILE,
    REDUCTION_MODEL_FILE,
    CLUSTER_MODEL_FILE,
    CLUSTER_LABELS_FILE,
    KEYWORD_TABLE_FILE,
    LABEL_TABLE_FILE,
];

/// Required files that are absent from `base_dir`.
pub fn missing_files(base_dir: &Path) -> Vec<&'static str> {
    REQUIRED_FILES
        .iter()
        .copied()
        .filter(|f| !base_dir.join(f).exists())
        .collect()
}

/// Counts and dimensions of a loaded store, for `newstopic status`.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactSummary {
    pub base_dir: PathBuf,
    pub training_rows: usize,
    pub embedding_dim: usize,
    pub reduced_dim: usize,
    pub reducer: &'static str,
    pub clusters: usize,
    /// Training rows assigned to each cluster
    pub cluster_sizes: BTreeMap<ClusterId, usize>,
}

pub struct ArtifactStore {
    base_dir: PathBuf,
    embeddings: Arc<Vec<Vec<f32>>>,
    index: Vec<i64>,
    reduced: Arc<Vec<Vec<f32>>>,
    reducer: Reducer,
    kmeans: KMeansModel,
    labels: Vec<ClusterId>,
    topics: Arc<TopicTable>,
}

impl ArtifactStore {
    pub fn load(base_dir: &Path) -> Result<Self> {
        info!(dir = %base_dir.display(), "Loading artifacts");
        let path = |name: &str| base_dir.join(name);

        info!("Loading embeddings");
        let embeddings = npy::read_matrix(&path(EMBEDDINGS_FILE))?;
        let index = npy::read_int_vector(&path(EMBEDDING_INDEX_FILE))?;
        let embedding_dim = embeddings.first().map_or(0, Vec::len);
        if embeddings.is_empty() || embedding_dim == 0 {
            return Err(PipelineError::artifact(
                path(EMBEDDINGS_FILE),
                "embedding matrix is empty",
            ));
        }
        expect_rows(&path(EMBEDDING_INDEX_FILE), "index", index.len(), embeddings.len())?;
        debug!(rows = embeddings.len(), dim = embedding_dim, "Embedding matrix shape");

        info!("Loading dimensionality reduction model");
        let reduced = npy::read_matrix(&path(REDUCED_EMBEDDINGS_FILE))?;
        expect_rows(
            &path(REDUCED_EMBEDDINGS_FILE),
            "reduced embeddings",
            reduced.len(),
            embeddings.len(),
        )?;
        let model: ReductionModel = read_json(&path(REDUCTION_MODEL_FILE))?;
        if let ReductionModel::Linear(p) = &model {
            p.validate()
                .map_err(|e| PipelineError::artifact(path(REDUCTION_MODEL_FILE), e))?;
        }
        let embeddings = Arc::new(embeddings);
        let reduced = Arc::new(reduced);
        let reducer = Reducer::build(model, Arc::clone(&embeddings), Arc::clone(&reduced));
        if reducer.input_dim() != embedding_dim {
            return Err(PipelineError::artifact(
                path(REDUCTION_MODEL_FILE),
                format!(
                    "model expects {}-d input but embeddings are {embedding_dim}-d",
                    reducer.input_dim()
                ),
            ));
        }
        debug!(kind = reducer.kind(), output_dim = reducer.output_dim(), "Reducer ready");

        info!("Loading clustering model");
        let kmeans: KMeansModel = read_json(&path(CLUSTER_MODEL_FILE))?;
        kmeans
            .validate()
            .map_err(|e| PipelineError::artifact(path(CLUSTER_MODEL_FILE), e))?;
        if kmeans.dim() != reducer.output_dim() {
            return Err(PipelineError::artifact(
                path(CLUSTER_MODEL_FILE),
                format!(
                    "centroids are {}-d but the reducer produces {}-d vectors",
                    kmeans.dim(),
                    reducer.output_dim()
                ),
            ));
        }
        let raw_labels = npy::read_int_vector(&path(CLUSTER_LABELS_FILE))?;
        expect_rows(
            &path(CLUSTER_LABELS_FILE),
            "cluster labels",
            raw_labels.len(),
            embeddings.len(),
        )?;
        let labels = raw_labels
            .iter()
            .map(|&l| {
                u32::try_from(l)
                    .ok()
                    .filter(|&l| (l as usize) < kmeans.n_clusters())
                    .map(ClusterId)
                    .ok_or_else(|| {
                        PipelineError::artifact(
                            path(CLUSTER_LABELS_FILE),
                            format!("label {l} is outside the {} fitted clusters", kmeans.n_clusters()),
                        )
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        info!("Loading the topics file");
        let keywords: RawKeywordTable = read_json(&path(KEYWORD_TABLE_FILE))?;
        info!("Loading the topic labels file");
        let label_names: RawLabelTable = read_json(&path(LABEL_TABLE_FILE))?;
        let topics = TopicTable::from_raw(keywords, label_names)
            .map_err(|e| PipelineError::artifact(path(KEYWORD_TABLE_FILE), e))?;

        // Every cluster the model can return must resolve to a topic.
        if let Some(orphan) = kmeans.cluster_ids().into_iter().find(|id| !topics.contains(*id)) {
            return Err(PipelineError::artifact(
                path(KEYWORD_TABLE_FILE),
                format!("cluster {orphan} has no topic entry"),
            ));
        }

        info!(
            rows = embeddings.len(),
            clusters = kmeans.n_clusters(),
            topics = topics.len(),
            "Artifacts loaded"
        );

        Ok(Self {
            base_dir: base_dir.to_path_buf(),
            embeddings,
            index,
            reduced,
            reducer,
            kmeans,
            labels,
            topics: Arc::new(topics),
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn embeddings(&self) -> &[Vec<f32>] {
        &self.embeddings
    }

    /// Row numbers in the source dataset, parallel to `embeddings()`.
    pub fn embedding_index(&self) -> &[i64] {
        &self.index
    }

    pub fn reduced_embeddings(&self) -> &[Vec<f32>] {
        &self.reduced
    }

    pub fn reducer(&self) -> &Reducer {
        &self.reducer
    }

    pub fn cluster_model(&self) -> &KMeansModel {
        &self.kmeans
    }

    /// Cluster of each training row, parallel to `embeddings()`.
    pub fn cluster_labels(&self) -> &[ClusterId] {
        &self.labels
    }

    pub fn topics(&self) -> &Arc<TopicTable> {
        &self.topics
    }

    pub fn summary(&self) -> ArtifactSummary {
        let mut cluster_sizes: BTreeMap<ClusterId, usize> =
            self.kmeans.cluster_ids().into_iter().map(|id| (id, 0)).collect();
        for id in &self.labels {
            *cluster_sizes.entry(*id).or_insert(0) += 1;
        }
        ArtifactSummary {
            base_dir: self.base_dir.clone(),
            training_rows: self.embeddings.len(),
            embedding_dim: self.reducer.input_dim(),
            reduced_dim: self.reducer.output_dim(),
            reducer: self.reducer.kind(),
            clusters: self.kmeans.n_clusters(),
            cluster_sizes,
        }
    }
}

fn expect_rows(path: &Path, what: &str, actual: usize, expected: usize) -> Result<()> {
    if actual != expected {
        return Err(PipelineError::artifact(
            path,
            format!("{what} has {actual} rows, embedding matrix has {expected}"),
        ));
    }
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path).map_err(|e| PipelineError::artifact(path, e))?;
    serde_json::from_str(&text).map_err(|e| PipelineError::artifact(path, e))
}
