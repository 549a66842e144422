// Output formatting — terminal display and JSON rendering of predictions.

pub mod terminal;

use crate::pipeline::PredictionResult;

/// Separator between keywords in the one-line keyword summary.
pub const KEYWORD_SEPARATOR: &str = "_";

/// Join keywords the way the prediction report shows them: `nba_suns_title`.
pub fn keyword_line(keywords: &[String]) -> String {
    keywords.join(KEYWORD_SEPARATOR)
}

/// Render predictions as a pretty-printed JSON array.
pub fn to_json(results: &[PredictionResult]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(results)
}

/// Truncate a string to at most `max_chars` characters, appending "..." if truncated.
///
/// Unlike byte slicing (`&text[..120]`), this respects UTF-8 character boundaries
/// and will never panic on multi-byte characters like emoji or accented letters.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    let char_count = text.chars().count();
    if char_count <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{truncated}...")
    }
}
