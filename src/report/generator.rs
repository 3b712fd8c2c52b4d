//! Run report generation.
//!
//! This module renders an agent run as Markdown or JSON: metadata, every
//! tool call that was executed, and the final answer.

use crate::models::{RunMetadata, RunOutcome, RunReport, ToolCallRecord};
use anyhow::Result;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &RunReport) -> String {
    let mut output = String::new();

    output.push_str("# CodePulse Run Report\n\n");
    output.push_str(&generate_metadata_section(&report.metadata, &report.outcome));
    output.push_str(&generate_request_section(&report.metadata.prompt));
    output.push_str(&generate_tool_calls_section(&report.tool_calls));
    output.push_str(&generate_answer_section(&report.outcome));

    output
}

fn generate_metadata_section(metadata: &RunMetadata, outcome: &RunOutcome) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!(
        "- **Started:** {}\n",
        metadata.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Model Used:** `{}`\n", metadata.model_used));
    section.push_str(&format!(
        "- **Iterations:** {} / {}\n",
        metadata.iterations, metadata.max_iterations
    ));
    let status = match outcome {
        RunOutcome::Completed { .. } => "Completed",
        RunOutcome::MaxIterationsReached => "Max iterations reached",
    };
    section.push_str(&format!("- **Outcome:** {}\n", status));
    section.push_str(&format!(
        "- **Duration:** {:.1}s\n\n",
        metadata.duration_seconds
    ));

    section
}

fn generate_request_section(prompt: &str) -> String {
    format!("## Request\n\n> {}\n\n", prompt.replace('\n', "\n> "))
}

fn generate_tool_calls_section(calls: &[ToolCallRecord]) -> String {
    let mut section = String::new();

    section.push_str("## Tool Calls\n\n");

    if calls.is_empty() {
        section.push_str("The model answered without calling any tools.\n\n");
        return section;
    }

    section.push_str("| # | Iteration | Tool | Status |\n");
    section.push_str("|:---:|:---:|:---|:---:|\n");
    for (i, call) in calls.iter().enumerate() {
        let status = if call.is_error { "error" } else { "ok" };
        section.push_str(&format!(
            "| {} | {} | `{}` | {} |\n",
            i + 1,
            call.iteration,
            call.name,
            status
        ));
    }
    section.push('\n');

    for (i, call) in calls.iter().enumerate() {
        section.push_str(&generate_call_block(i + 1, call));
    }

    section
}

fn generate_call_block(number: usize, call: &ToolCallRecord) -> String {
    let mut block = String::new();

    block.push_str(&format!("### {}. `{}` ({})\n\n", number, call.name, call.call_id));
    block.push_str("**Arguments:**\n\n```json\n");
    block.push_str(&call.arguments);
    block.push_str("\n```\n\n**Result:**\n\n```json\n");
    block.push_str(&serde_json::to_string_pretty(&call.result).unwrap_or_default());
    block.push_str("\n```\n\n");

    block
}

fn generate_answer_section(outcome: &RunOutcome) -> String {
    format!("## Final Answer\n\n{}\n", outcome.final_text())
}

/// Generate a JSON report.
pub fn generate_json_report(report: &RunReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn create_test_report(outcome: RunOutcome) -> RunReport {
        RunReport {
            metadata: RunMetadata {
                prompt: "Analyze src/core.js".to_string(),
                model_used: "test-model".to_string(),
                started_at: Utc::now(),
                iterations: 3,
                max_iterations: 10,
                duration_seconds: 4.2,
            },
            outcome,
            tool_calls: vec![
                ToolCallRecord {
                    iteration: 1,
                    call_id: "call_1".to_string(),
                    name: "fetch_github_file".to_string(),
                    arguments: r#"{"owner":"jquery","repo":"jquery","file_path":"src/core.js"}"#
                        .to_string(),
                    result: json!({"success": true, "file_path": "src/core.js", "size": 1200}),
                    is_error: false,
                },
                ToolCallRecord {
                    iteration: 2,
                    call_id: "call_2".to_string(),
                    name: "analyze_code_quality".to_string(),
                    arguments: r#"{"file_path":"src/other.js"}"#.to_string(),
                    result: json!({"error": "File not fetched yet. Call fetch_github_file first."}),
                    is_error: true,
                },
            ],
        }
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report(RunOutcome::Completed {
            answer: "Score: 6/10".to_string(),
        });
        let markdown = generate_markdown_report(&report);

        assert!(markdown.contains("# CodePulse Run Report"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("- **Iterations:** 3 / 10"));
        assert!(markdown.contains("| 2 | 2 | `analyze_code_quality` | error |"));
        assert!(markdown.contains("\"size\": 1200"));
        assert!(markdown.contains("## Final Answer\n\nScore: 6/10"));
        assert_eq!(report.failed_tool_calls(), 1);
    }

    #[test]
    fn test_markdown_report_exhausted() {
        let report = create_test_report(RunOutcome::MaxIterationsReached);
        let markdown = generate_markdown_report(&report);

        assert!(markdown.contains("- **Outcome:** Max iterations reached"));
        assert!(markdown.contains("## Final Answer\n\nMax iterations reached"));
    }

    #[test]
    fn test_no_tool_calls() {
        let mut report = create_test_report(RunOutcome::Completed {
            answer: "hi".to_string(),
        });
        report.tool_calls.clear();

        let section = generate_tool_calls_section(&report.tool_calls);
        assert!(section.contains("without calling any tools"));
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report(RunOutcome::Completed {
            answer: "Score: 6/10".to_string(),
        });
        let json = generate_json_report(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["outcome"]["status"], "completed");
        assert_eq!(value["outcome"]["answer"], "Score: 6/10");
        assert_eq!(value["tool_calls"].as_array().unwrap().len(), 2);
        assert_eq!(value["metadata"]["model_used"], "test-model");
    }
}
