use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::topics::resolver::DEFAULT_TOP_KEYWORDS;

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy; command
/// line flags override anything set here.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the offline pipeline's artifacts (NEWSTOPIC_ARTIFACT_DIR)
    pub artifact_dir: PathBuf,
    /// Directory containing the ONNX model files (NEWSTOPIC_MODEL_DIR)
    pub model_dir: PathBuf,
    /// Keywords shown per prediction (NEWSTOPIC_TOP_KEYWORDS)
    pub top_keywords: usize,
}

impl Config {
    /// Load configuration from environment variables. Every setting has a
    /// default; only a malformed value is an error.
    pub fn load() -> Result<Self> {
        let artifact_dir = env::var("NEWSTOPIC_ARTIFACT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./"));

        let model_dir = env::var("NEWSTOPIC_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| crate::encoder::download::default_model_dir());

        let top_keywords = match env::var("NEWSTOPIC_TOP_KEYWORDS") {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .with_context(|| format!("NEWSTOPIC_TOP_KEYWORDS must be a number, got '{raw}'"))?,
            Err(_) => DEFAULT_TOP_KEYWORDS,
        };

        Ok(Self {
            artifact_dir,
            model_dir,
            top_keywords,
        })
    }

    /// Check that every pipeline artifact is present before trying to load.
    pub fn require_artifacts(&self) -> Result<()> {
        let missing = crate::artifacts::missing_files(&self.artifact_dir);
        if !missing.is_empty() {
            anyhow::bail!(
                "Missing artifacts in {}:\n  {}\n\
                 Set NEWSTOPIC_ARTIFACT_DIR (or pass --artifact-dir) to the directory \
                 the offline training run wrote to.",
                self.artifact_dir.display(),
                missing.join("\n  ")
            );
        }
        Ok(())
    }

    /// Check that the sentence encoder has been downloaded.
    pub fn require_encoder(&self) -> Result<()> {
        if !crate::encoder::download::encoder_files_present(&self.model_dir) {
            anyhow::bail!(
                "Sentence encoder not found in {}\n\
                 Run `newstopic download-model` to download it.",
                self.model_dir.display()
            );
        }
        Ok(())
    }
}
