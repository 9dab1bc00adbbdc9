//! Output formatting: table, JSON, YAML.
//!
//! Tables use `tabled`; structured formats serialize the same data with
//! serde. Rendered output goes to stdout, logs go to stderr.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use lmprov_core::{RowOutcome, RunReport};

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Color only when stdout is a terminal and `NO_COLOR` is unset.
pub fn should_color() -> bool {
    io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

/// Render `data` as JSON or YAML, or call `table_fn` for the table view.
pub fn render<T: Serialize>(
    format: OutputFormat,
    data: &T,
    table_fn: impl FnOnce(&T) -> String,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => Ok(table_fn(data)),
        OutputFormat::Json => serde_json::to_string_pretty(data).map_err(|e| CliError::Render {
            message: e.to_string(),
        }),
        OutputFormat::Yaml => serde_yaml::to_string(data).map_err(|e| CliError::Render {
            message: e.to_string(),
        }),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{}", output.trim_end());
}

pub fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

// ── Run reports ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct OutcomeRow {
    #[tabled(rename = "Row")]
    row: usize,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Outcome")]
    outcome: &'static str,
    #[tabled(rename = "Reason")]
    reason: String,
}

fn outcome_name(outcome: &RowOutcome) -> &'static str {
    match outcome {
        RowOutcome::Completed => "completed",
        RowOutcome::Skipped => "skipped",
        RowOutcome::Failed(_) => "failed",
        RowOutcome::Cancelled => "cancelled",
    }
}

/// Per-row outcome table followed by a one-line summary.
pub fn report_table(report: &RunReport, color: bool) -> String {
    let rows: Vec<OutcomeRow> = report
        .rows
        .iter()
        .map(|r| OutcomeRow {
            row: r.row,
            label: r.label.clone(),
            outcome: outcome_name(&r.outcome),
            reason: match &r.outcome {
                RowOutcome::Failed(reason) => reason.clone(),
                _ => String::new(),
            },
        })
        .collect();

    let skipped = report
        .rows
        .iter()
        .filter(|r| r.outcome == RowOutcome::Skipped)
        .count();
    let completed = format!("{} completed", report.completed());
    let failed = format!("{} failed", report.failed());
    let summary = if color {
        format!(
            "{}: {}, {skipped} skipped, {}",
            report.mode,
            completed.green(),
            if report.failed() > 0 {
                failed.red().to_string()
            } else {
                failed
            }
        )
    } else {
        format!("{}: {completed}, {skipped} skipped, {failed}", report.mode)
    };

    if rows.is_empty() {
        return summary;
    }
    format!("{}\n{summary}", render_table(&rows))
}

#[cfg(test)]
mod tests {
    use lmprov_core::{Mode, RowReport};

    use super::*;

    fn report() -> RunReport {
        RunReport {
            mode: Mode::Create,
            rows: vec![
                RowReport {
                    row: 1,
                    label: "Acme".into(),
                    outcome: RowOutcome::Completed,
                },
                RowReport {
                    row: 2,
                    label: "Globex".into(),
                    outcome: RowOutcome::Failed("Ambiguous device group".into()),
                },
            ],
        }
    }

    #[test]
    fn table_lists_rows_and_summary() {
        let text = report_table(&report(), false);
        assert!(text.contains("Acme"));
        assert!(text.contains("Ambiguous device group"));
        assert!(text.ends_with("create: 1 completed, 0 skipped, 1 failed"));
    }

    #[test]
    fn json_carries_outcome_status() {
        let json = render(OutputFormat::Json, &report(), |_| String::new()).unwrap_or_default();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap_or_default();
        assert_eq!(value["mode"], "create");
        assert_eq!(value["rows"][1]["outcome"]["status"], "failed");
        assert_eq!(value["rows"][1]["outcome"]["reason"], "Ambiguous device group");
    }
}
