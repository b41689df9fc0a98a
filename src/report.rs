//! Rendering of batch outcomes and inspection results.
//!
//! Execution code never prints; the CLI picks one of these renderers.
use crate::core::db::{BatchReport, ExecutionOutcome};
use crate::core::Result;
use crate::inspect::{TableReport, TableResult};
use chrono::{SecondsFormat, Utc};
use serde_json::json;
use uuid::Uuid;

/// Identifies one invocation in structured output and logs.
#[derive(Debug, Clone)]
pub struct RunInfo {
    pub run_id: String,
    pub started_at: String,
}

impl RunInfo {
    pub fn new() -> Self {
        RunInfo {
            run_id: Uuid::new_v4().to_string(),
            started_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

impl Default for RunInfo {
    fn default() -> Self {
        Self::new()
    }
}

/// One status line per statement followed by a summary line.
pub fn render_batch_text(report: &BatchReport) -> String {
    let mut out = String::new();
    for outcome in &report.outcomes {
        match outcome {
            ExecutionOutcome::Success { .. } => {
                out.push_str(&format!("Executed: {}...\n", outcome.preview()));
            }
            ExecutionOutcome::Failure { message, .. } => {
                out.push_str(&format!("Error executing: {}... - {}\n", outcome.preview(), message));
            }
        }
    }
    out.push_str(&format!(
        "Seed complete: {} statements, {} succeeded, {} failed\n",
        report.total(),
        report.succeeded(),
        report.failed()
    ));
    out
}

pub fn render_batch_json(run: &RunInfo, database: &str, report: &BatchReport) -> Result<String> {
    let value = json!({
        "run_id": run.run_id,
        "started_at": run.started_at,
        "command": "seed",
        "database": database,
        "summary": {
            "total": report.total(),
            "succeeded": report.succeeded(),
            "failed": report.failed(),
        },
        "report": report,
    });
    Ok(serde_json::to_string_pretty(&value)?)
}

/// Statements a dry run would submit, numbered from 1.
pub fn render_dry_run(statements: &[&str]) -> String {
    let mut out = String::new();
    for (index, statement) in statements.iter().enumerate() {
        out.push_str(&format!("{:>4}: {}\n", index + 1, statement));
    }
    out.push_str(&format!("{} statements would be executed\n", statements.len()));
    out
}

/// Table name header, one tuple per row, blank line between tables.
pub fn render_inspection_text(reports: &[TableReport]) -> String {
    let mut out = String::new();
    for (index, report) in reports.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        out.push_str(&format!("{}:\n", report.table));
        match &report.result {
            TableResult::Rows(result) if result.rows.is_empty() => {
                out.push_str("(no rows)\n");
            }
            TableResult::Rows(result) => {
                for row in &result.rows {
                    out.push_str(&format!("({})\n", row.join(", ")));
                }
            }
            TableResult::Error { message } => {
                out.push_str(&format!("Error: {}\n", message));
            }
        }
    }
    if !reports.is_empty() {
        out.push('\n');
    }
    out.push_str("Database check completed.\n");
    out
}

pub fn render_inspection_json(run: &RunInfo, database: &str, reports: &[TableReport]) -> Result<String> {
    let value = json!({
        "run_id": run.run_id,
        "started_at": run.started_at,
        "command": "inspect",
        "database": database,
        "tables": reports,
    });
    Ok(serde_json::to_string_pretty(&value)?)
}
