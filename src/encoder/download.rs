// Model download helper for the sentence encoder.
//
// Fetches all-MiniLM-L6-v2 (ONNX export + tokenizer) from HuggingFace.
// Files are stored in a platform-appropriate directory
// (~/.local/share/newstopic/models/ on Linux) so they persist across runs.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use super::onnx::{MODEL_FILE, TOKENIZER_FILE};

/// HuggingFace repo for the sentence embedding model.
const ENCODER_HF_URL: &str =
    "https://huggingface.co/sentence-transformers/all-MiniLM-L6-v2/resolve/main";

/// Location of the ONNX export inside the HuggingFace repo.
const REMOTE_MODEL_PATH: &str = "onnx/model.onnx";

/// Subdirectory the encoder files live in under the model directory.
const ENCODER_SUBDIR: &str = "all-MiniLM-L6-v2";

/// Returns the default directory for storing model files.
/// Uses the platform data directory: ~/.local/share/newstopic/models/ on Linux.
pub fn default_model_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("newstopic")
        .join("models")
}

/// Subdirectory within model_dir for the sentence encoder.
pub fn encoder_model_dir(base: &Path) -> PathBuf {
    base.join(ENCODER_SUBDIR)
}

/// Check whether both encoder files exist.
pub fn encoder_files_present(base: &Path) -> bool {
    let dir = encoder_model_dir(base);
    dir.join(MODEL_FILE).exists() && dir.join(TOKENIZER_FILE).exists()
}

/// Download the sentence encoder. Skips files that already exist and
/// creates directories as needed.
pub async fn download_model(base: &Path) -> Result<()> {
    let dir = encoder_model_dir(base);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create model directory: {}", dir.display()))?;

    println!("\nSentence encoder (all-MiniLM-L6-v2):");

    let tokenizer_path = dir.join(TOKENIZER_FILE);
    if tokenizer_path.exists() {
        info!("Encoder tokenizer already exists, skipping");
        println!("  {TOKENIZER_FILE} (already exists)");
    } else {
        println!("  Downloading {TOKENIZER_FILE}...");
        download_file(
            &format!("{ENCODER_HF_URL}/{TOKENIZER_FILE}"),
            &tokenizer_path,
            false,
        )
        .await?;
    }

    let model_path = dir.join(MODEL_FILE);
    if model_path.exists() {
        info!("Encoder model already exists, skipping");
        println!("  {MODEL_FILE} (already exists)");
    } else {
        println!("  Downloading {MODEL_FILE} (~90 MB)...");
        download_file(
            &format!("{ENCODER_HF_URL}/{REMOTE_MODEL_PATH}"),
            &model_path,
            true,
        )
        .await?;
    }

    Ok(())
}

/// Download a single file from a URL to a local path.
/// If `show_progress` is true, display a progress bar.
async fn download_file(url: &str, dest: &Path, show_progress: bool) -> Result<()> {
    let response = reqwest::Client::new()
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to download {url}"))?;

    if !response.status().is_success() {
        anyhow::bail!("Download failed with status {}: {}", response.status(), url);
    }

    let pb = if show_progress {
        Some(progress_bar(response.content_length()))
    } else {
        None
    };

    let bytes = response
        .bytes()
        .await
        .context("Failed to read response body")?;

    if let Some(ref pb) = pb {
        pb.set_position(bytes.len() as u64);
    }

    // Renamed into place only once complete; `encoder_files_present` must
    // never see a truncated file.
    let partial = dest.with_extension("part");
    std::fs::write(&partial, &bytes)
        .with_context(|| format!("Failed to write {}", partial.display()))?;
    std::fs::rename(&partial, dest)
        .with_context(|| format!("Failed to move download into {}", dest.display()))?;

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    info!("Downloaded {} to {}", url, dest.display());
    Ok(())
}

fn progress_bar(total_size: Option<u64>) -> ProgressBar {
    match total_size {
        Some(size) => {
            let pb = ProgressBar::new(size);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("    [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                    .expect("valid template")
                    .progress_chars("=> "),
            );
            pb
        }
        None => {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("    {spinner} {bytes}")
                    .expect("valid template"),
            );
            pb
        }
    }
}
