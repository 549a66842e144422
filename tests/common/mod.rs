// Shared fixtures: a tiny artifact directory and a deterministic encoder.
//
// The fixture models three topics in a 3-d "embedding" space where each axis
// is one topic's vocabulary. Training points sit on or near the axes and are
// reduced to 2-d points around three well-separated centroids.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use serde_json::json;
use tempfile::TempDir;

use newstopic::artifacts::{
    ArtifactStore, CLUSTER_LABELS_FILE, CLUSTER_MODEL_FILE, EMBEDDINGS_FILE,
    EMBEDDING_INDEX_FILE, KEYWORD_TABLE_FILE, LABEL_TABLE_FILE, REDUCED_EMBEDDINGS_FILE,
    REDUCTION_MODEL_FILE,
};
use newstopic::encoder::traits::TextEncoder;
use newstopic::error::{PipelineError, Result};
use newstopic::pipeline::PredictionPipeline;

pub const GOVERNMENT: u32 = 0;
pub const TECHNOLOGY: u32 = 1;
pub const SPORTS: u32 = 2;

const VOCABULARY: [&[&str]; 3] = [
    &["secret", "service", "agents", "feds", "government", "senate"],
    &["microsoft", "tech", "cybercrime", "software", "apple", "cloud"],
    &["nba", "suns", "title", "coach", "game"],
];

/// Bag-of-words encoder: one axis per topic vocabulary, L2-normalized.
pub struct BagOfWordsEncoder;

impl TextEncoder for BagOfWordsEncoder {
    fn dim(&self) -> usize {
        VOCABULARY.len()
    }

    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| bag_of_words(t)).collect())
    }
}

fn bag_of_words(text: &str) -> Vec<f32> {
    let mut v = vec![0.0f32; VOCABULARY.len()];
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let word = word.to_lowercase();
        for (axis, vocab) in VOCABULARY.iter().enumerate() {
            if vocab.contains(&word.as_str()) {
                v[axis] += 1.0;
            }
        }
    }
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
    v
}

/// Encoder that always fails, for checking that errors abort the batch.
pub struct FailingEncoder;

impl TextEncoder for FailingEncoder {
    fn dim(&self) -> usize {
        VOCABULARY.len()
    }

    fn encode(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(PipelineError::ModelInference("encoder exploded".to_string()))
    }
}

/// Encoder that drops the last text, breaking the 1:1 contract.
pub struct LossyEncoder;

impl TextEncoder for LossyEncoder {
    fn dim(&self) -> usize {
        VOCABULARY.len()
    }

    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = BagOfWordsEncoder.encode(texts)?;
        out.pop();
        Ok(out)
    }
}

pub struct Fixture {
    dir: TempDir,
}

impl Fixture {
    /// A complete, consistent artifact directory using the neighbour reducer.
    pub fn new() -> Self {
        let fixture = Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        };

        fixture.write_matrix(
            EMBEDDINGS_FILE,
            &[
                vec![1.0, 0.0, 0.0],
                vec![0.9, 0.1, 0.0],
                vec![0.0, 1.0, 0.0],
                vec![0.1, 0.9, 0.0],
                vec![0.0, 0.0, 1.0],
                vec![0.0, 0.1, 0.9],
            ],
        );
        fixture.write_ints(EMBEDDING_INDEX_FILE, &[10, 11, 12, 13, 14, 15]);
        fixture.write_matrix(
            REDUCED_EMBEDDINGS_FILE,
            &[
                vec![-5.0, 0.0],
                vec![-4.5, 0.0],
                vec![5.0, 0.0],
                vec![4.5, 0.0],
                vec![0.0, 5.0],
                vec![0.0, 4.5],
            ],
        );
        fixture.write_json(
            REDUCTION_MODEL_FILE,
            &json!({ "kind": "neighbors", "n_neighbors": 3, "metric": "euclidean" }),
        );
        fixture.write_json(
            CLUSTER_MODEL_FILE,
            &json!({ "centroids": [[-4.75, 0.0], [4.75, 0.0], [0.0, 4.75]] }),
        );
        fixture.write_ints(CLUSTER_LABELS_FILE, &[0, 0, 1, 1, 2, 2]);
        // Deliberately not pre-sorted; the store ranks by score.
        fixture.write_json(
            KEYWORD_TABLE_FILE,
            &json!({
                "0": [["senate", 0.2], ["agents", 0.5], ["government", 0.9],
                      ["feds", 0.4], ["secret", 0.3], ["service", 0.1]],
                "1": [["microsoft", 0.8], ["cybercrime", 0.6], ["tech", 0.7],
                      ["software", 0.3], ["apple", 0.2], ["cloud", 0.1]],
                "2": [["nba", 0.9], ["suns", 0.5], ["title", 0.4],
                      ["coach", 0.3], ["game", 0.2]]
            }),
        );
        fixture.write_json(
            LABEL_TABLE_FILE,
            &json!({ "0": "Government", "1": "Technology", "2": "Sports" }),
        );
        fixture
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn remove(&self, name: &str) {
        std::fs::remove_file(self.file(name)).expect("remove fixture file");
    }

    pub fn write_raw(&self, name: &str, bytes: &[u8]) {
        std::fs::write(self.file(name), bytes).expect("write fixture file");
    }

    pub fn write_json(&self, name: &str, value: &serde_json::Value) {
        self.write_raw(name, value.to_string().as_bytes());
    }

    pub fn write_matrix(&self, name: &str, rows: &[Vec<f32>]) {
        let cols = rows.first().map_or(0, Vec::len);
        let data: Vec<u8> = rows
            .iter()
            .flatten()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        self.write_raw(name, &npy("<f4", &format!("({}, {cols})", rows.len()), &data));
    }

    pub fn write_ints(&self, name: &str, values: &[i64]) {
        let data: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.write_raw(name, &npy("<i8", &format!("({},)", values.len()), &data));
    }

    pub fn load(&self) -> Result<ArtifactStore> {
        ArtifactStore::load(self.path())
    }

    pub fn pipeline(&self) -> PredictionPipeline {
        let store = self.load().expect("fixture artifacts load");
        PredictionPipeline::new(store, Box::new(BagOfWordsEncoder), 5).expect("pipeline builds")
    }
}

/// Build an npy v1.0 file the way `np.save` lays it out.
pub fn npy(descr: &str, shape: &str, data: &[u8]) -> Vec<u8> {
    let mut header = format!("{{'descr': '{descr}', 'fortran_order': False, 'shape': {shape}, }}");
    while (10 + header.len() + 1) % 64 != 0 {
        header.push(' ');
    }
    header.push('\n');

    let mut out = b"\x93NUMPY".to_vec();
    out.extend_from_slice(&[1, 0]);
    out.extend_from_slice(&(header.len() as u16).to_le_bytes());
    out.extend_from_slice(header.as_bytes());
    out.extend_from_slice(data);
    out
}

pub fn strings(texts: &[&str]) -> Vec<String> {
    texts.iter().map(|s| s.to_string()).collect()
}

pub fn is_artifact_error_for(err: &PipelineError, file: &str) -> bool {
    matches!(err, PipelineError::ArtifactLoad { path, .. } if path.ends_with(file))
}
