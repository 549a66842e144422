// Colored terminal output for predictions and artifact status.

use colored::Colorize;

use super::{keyword_line, truncate_chars};
use crate::artifacts::ArtifactSummary;
use crate::pipeline::PredictionResult;
use crate::topics::table::{TopicRecord, TopicTable};

const RULE: &str = "*****************************";

/// Plain-text report for one prediction, one field per line.
pub fn format_prediction(result: &PredictionResult) -> String {
    format!(
        "Test text: {}\nPredicted Topic: {}\nPredicted keywords: {}\n{RULE}",
        result.text,
        result.label,
        keyword_line(&result.keywords)
    )
}

/// Print every prediction in input order.
pub fn display_predictions(results: &[PredictionResult]) {
    if results.is_empty() {
        println!("{}", "No texts to predict.".dimmed());
        return;
    }
    for result in results {
        println!("{}", format_prediction(result));
    }
}

/// Print a summary of the loaded artifacts, listing up to `top_n` keywords
/// per cluster.
pub fn display_status(
    summary: &ArtifactSummary,
    topics: &TopicTable,
    top_n: usize,
    encoder_present: bool,
) {
    println!("\n{}", "=== newstopic status ===".bold());
    println!("  Artifacts:      {}", summary.base_dir.display());
    println!(
        "  Training rows:  {} ({}-d embeddings -> {}-d via {})",
        summary.training_rows, summary.embedding_dim, summary.reduced_dim, summary.reducer
    );
    println!("  Clusters:       {}", summary.clusters);
    let encoder = if encoder_present {
        "present".green()
    } else {
        "missing (run `newstopic download-model`)".yellow()
    };
    println!("  Encoder model:  {encoder}");

    println!();
    println!(
        "  {:>4}  {:<24} {:>8}  {}",
        "Id".dimmed(),
        "Label".dimmed(),
        "Rows".dimmed(),
        "Keywords".dimmed()
    );
    println!("  {}", "-".repeat(78).dimmed());
    for (id, record) in topics.iter() {
        let size = summary.cluster_sizes.get(&id).copied().unwrap_or(0);
        println!(
            "  {:>4}  {:<24} {:>8}  {}",
            id.to_string(),
            truncate_chars(&record.label, 24),
            size,
            truncate_chars(&status_keywords(record, top_n), 40).dimmed()
        );
    }
    println!();
}

/// The first `top_n` keywords of a cluster, joined for the status table.
fn status_keywords(record: &TopicRecord, top_n: usize) -> String {
    let keywords: Vec<String> = record
        .keywords
        .iter()
        .take(top_n)
        .map(|(k, _)| k.clone())
        .collect();
    keyword_line(&keywords)
}
