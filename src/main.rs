use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use newstopic::config::Config;
use newstopic::pipeline::PredictionPipeline;

/// Headlines the demo run predicts when no text is given, one per topic
/// area the clustering was labelled with.
const DEMO_HEADLINES: [&str; 7] = [
    "Secret Service on the defensive over allegations agents were duped by men impersonating feds",
    "Microsoft and other tech firms take aim at prolific cybercrime gang",
    "Phoenix Suns favorites to win NBA title, but they still feel disrespected. Are they overlooked?",
    "Natural gas spikes to highest level since 2008 as rare nor'easter looms",
    "Will rising prices sink Biden’s midterm hopes for Democrats?",
    "Large and dangerous' tornadoes hit Texas and Oklahoma; South faces more severe weather",
    "Here is a list of the best beaches in Hawaii and other tropical islands",
];

/// newstopic: predict the topic of a news headline.
///
/// Embeds text with all-MiniLM-L6-v2, projects it with the fitted UMAP
/// model, assigns a KMeans cluster, and reports that cluster's topic.
#[derive(Parser)]
#[command(name = "newstopic", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict topics for the given texts (or the built-in demo headlines)
    Predict {
        /// Texts to classify; runs the demo headlines when omitted
        texts: Vec<String>,

        /// Directory holding the pipeline artifacts
        #[arg(long)]
        artifact_dir: Option<PathBuf>,

        /// Directory holding the downloaded encoder model
        #[arg(long)]
        model_dir: Option<PathBuf>,

        /// Number of keywords to show per prediction (default: 5)
        #[arg(long)]
        top_keywords: Option<usize>,

        /// Print results as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Download the sentence encoder model (~90 MB)
    DownloadModel {
        /// Directory to store the model in
        #[arg(long)]
        model_dir: Option<PathBuf>,
    },

    /// Show what the artifact directory contains
    Status {
        /// Directory holding the pipeline artifacts
        #[arg(long)]
        artifact_dir: Option<PathBuf>,

        /// Directory holding the downloaded encoder model
        #[arg(long)]
        model_dir: Option<PathBuf>,

        /// Number of keywords to list per cluster (default: 5)
        #[arg(long)]
        top_keywords: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Logs go to stderr so --json output stays machine-readable.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("newstopic=info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::load()?;

    match cli.command {
        Commands::Predict {
            texts,
            artifact_dir,
            model_dir,
            top_keywords,
            json,
        } => {
            if let Some(dir) = artifact_dir {
                config.artifact_dir = dir;
            }
            if let Some(dir) = model_dir {
                config.model_dir = dir;
            }
            if let Some(n) = top_keywords {
                config.top_keywords = n;
            }
            config.require_artifacts()?;
            config.require_encoder()?;

            let texts: Vec<String> = if texts.is_empty() {
                info!("No texts given, running the demo headlines");
                DEMO_HEADLINES.iter().map(|s| s.to_string()).collect()
            } else {
                texts
            };

            let pipeline = PredictionPipeline::from_config(&config)
                .context("Failed to initialize the prediction pipeline")?;
            let results = pipeline.predict(&texts).context("Prediction failed")?;

            if json {
                println!("{}", newstopic::output::to_json(&results)?);
            } else {
                newstopic::output::terminal::display_predictions(&results);
            }
        }

        Commands::DownloadModel { model_dir } => {
            let model_dir = model_dir.unwrap_or(config.model_dir);
            println!("Downloading models to: {}", model_dir.display());
            newstopic::encoder::download::download_model(&model_dir).await?;
            println!("\n{}", "Model downloaded successfully.".bold());
        }

        Commands::Status {
            artifact_dir,
            model_dir,
            top_keywords,
        } => {
            if let Some(dir) = artifact_dir {
                config.artifact_dir = dir;
            }
            if let Some(dir) = model_dir {
                config.model_dir = dir;
            }
            if let Some(n) = top_keywords {
                config.top_keywords = n;
            }
            config.require_artifacts()?;
            let store = newstopic::artifacts::ArtifactStore::load(&config.artifact_dir)
                .context("Failed to load artifacts")?;
            let encoder_present =
                newstopic::encoder::download::encoder_files_present(&config.model_dir);
            newstopic::output::terminal::display_status(
                &store.summary(),
                store.topics(),
                config.top_keywords,
                encoder_present,
            );
        }
    }

    Ok(())
}
