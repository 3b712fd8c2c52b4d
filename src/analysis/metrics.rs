//! Heuristic text metrics for cached source files.
//!
//! These are string searches, not a parser. Comment detection only looks
//! at line prefixes and function detection counts keyword occurrences, so
//! strings containing those tokens are counted too.

use crate::cache::ContentCache;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

/// Line prefixes treated as comment-only lines.
const COMMENT_PREFIXES: [&str; 4] = ["//", "#", "/*", "*"];

/// Tokens that usually introduce a function or binding in JS, Python and Rust.
const DECLARATION_TOKENS: [&str; 4] = ["function ", "def ", "const ", "let "];

const METRICS_NOTE: &str =
    "Heuristic metrics calculated from cached file; counts are approximate.";

/// Metrics computed for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileMetrics {
    pub file_path: String,
    pub total_lines: usize,
    pub code_lines: usize,
    pub estimated_functions: usize,
    pub note: String,
}

/// Outcome of an `analyze_code_quality` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricsOutcome {
    Computed(FileMetrics),
    /// The path has no cache entry.
    NotFetched { file_path: String },
}

impl MetricsOutcome {
    /// JSON shape sent back to the model.
    pub fn to_value(&self) -> Value {
        match self {
            MetricsOutcome::Computed(metrics) => json!(metrics),
            MetricsOutcome::NotFetched { file_path } => json!({
                "error": "File not fetched yet. Call fetch_github_file first.",
                "file_path": file_path,
            }),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, MetricsOutcome::NotFetched { .. })
    }
}

/// Compute metrics for a path that must already be cached.
pub fn analyze(cache: &ContentCache, file_path: &str) -> MetricsOutcome {
    let Some(entry) = cache.get(file_path) else {
        debug!("Metrics requested for uncached path {}", file_path);
        return MetricsOutcome::NotFetched {
            file_path: file_path.to_string(),
        };
    };

    MetricsOutcome::Computed(compute_metrics(file_path, &entry.content))
}

/// Compute metrics over raw text.
pub fn compute_metrics(file_path: &str, code: &str) -> FileMetrics {
    let lines: Vec<&str> = code.split('\n').collect();

    let code_lines = lines
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty() && !is_comment(line))
        .count();

    let estimated_functions = DECLARATION_TOKENS
        .iter()
        .map(|token| code.matches(token).count())
        .sum();

    FileMetrics {
        file_path: file_path.to_string(),
        total_lines: lines.len(),
        code_lines,
        estimated_functions,
        note: METRICS_NOTE.to_string(),
    }
}

fn is_comment(trimmed: &str) -> bool {
    COMMENT_PREFIXES
        .iter()
        .any(|prefix| trimmed.starts_with(prefix))
}
