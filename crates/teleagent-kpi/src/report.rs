use std::fmt::Write as _;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ReportError;
use crate::evaluator::EvaluationResult;

/// One report line per scenario. Undefined means are `NaN`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub scenario: String,
    pub correct: usize,
    pub total_calls: usize,
    pub expected_calls: usize,
    pub tool_call_accuracy: f64,
    pub scenario_ok: bool,
    pub pairs_scored: usize,
    pub mean_similarity: f64,
    pub final_pass_rate: f64,
    pub mean_latency_s: f64,
}

impl From<&EvaluationResult> for ReportRow {
    fn from(result: &EvaluationResult) -> Self {
        Self {
            scenario: result.scenario_id.clone(),
            correct: result.tool_match.correct,
            total_calls: result.tool_match.total,
            expected_calls: result.tool_match.expected,
            tool_call_accuracy: result.tool_call_accuracy().unwrap_or(f64::NAN),
            scenario_ok: result.scenario_ok(),
            pairs_scored: result.final_scores.len(),
            mean_similarity: result.mean_similarity().unwrap_or(f64::NAN),
            final_pass_rate: result.final_pass_rate().unwrap_or(f64::NAN),
            mean_latency_s: result.mean_latency().unwrap_or(f64::NAN),
        }
    }
}

pub fn rows(results: &[EvaluationResult]) -> Vec<ReportRow> {
    results.iter().map(ReportRow::from).collect()
}

/// Totals across all scenarios.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub scenarios: usize,
    pub scenarios_ok: usize,
    /// Correct calls over observed calls, pooled across scenarios.
    pub tool_call_accuracy: f64,
    pub mean_similarity: f64,
    pub mean_latency_s: f64,
}

pub fn summarize(rows: &[ReportRow]) -> ReportSummary {
    let correct: usize = rows.iter().map(|r| r.correct).sum();
    let total: usize = rows.iter().map(|r| r.total_calls).sum();

    ReportSummary {
        scenarios: rows.len(),
        scenarios_ok: rows.iter().filter(|r| r.scenario_ok).count(),
        tool_call_accuracy: if total > 0 {
            correct as f64 / total as f64
        } else {
            f64::NAN
        },
        mean_similarity: nan_mean(rows.iter().map(|r| r.mean_similarity)),
        mean_latency_s: nan_mean(rows.iter().map(|r| r.mean_latency_s)),
    }
}

fn nan_mean(values: impl Iterator<Item = f64>) -> f64 {
    let defined: Vec<f64> = values.filter(|v| !v.is_nan()).collect();
    if defined.is_empty() {
        f64::NAN
    } else {
        defined.iter().sum::<f64>() / defined.len() as f64
    }
}

pub fn write_csv<W: io::Write>(writer: W, rows: &[ReportRow]) -> Result<(), ReportError> {
    let mut csv = csv::Writer::from_writer(writer);
    for row in rows {
        csv.serialize(row)?;
    }
    csv.flush()?;
    Ok(())
}

pub fn write_csv_file<P: AsRef<Path>>(path: P, rows: &[ReportRow]) -> Result<(), ReportError> {
    let file = std::fs::File::create(path)?;
    write_csv(file, rows)
}

const HEADERS: [&str; 10] = [
    "scenario",
    "correct",
    "total_calls",
    "expected_calls",
    "tool_acc",
    "scenario_ok",
    "pairs",
    "mean_sim",
    "pass_rate",
    "latency_s",
];

fn format_float(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else {
        format!("{value:.3}")
    }
}

/// Fixed-width table for terminal output.
pub fn render_table(rows: &[ReportRow]) -> String {
    let cells: Vec<[String; 10]> = rows
        .iter()
        .map(|r| {
            [
                r.scenario.clone(),
                r.correct.to_string(),
                r.total_calls.to_string(),
                r.expected_calls.to_string(),
                format_float(r.tool_call_accuracy),
                r.scenario_ok.to_string(),
                r.pairs_scored.to_string(),
                format_float(r.mean_similarity),
                format_float(r.final_pass_rate),
                format_float(r.mean_latency_s),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let header: Vec<&str> = HEADERS.to_vec();
    push_line(&mut out, &header, &widths);
    for row in &cells {
        let row: Vec<&str> = row.iter().map(String::as_str).collect();
        push_line(&mut out, &row, &widths);
    }
    out
}

fn push_line(out: &mut String, cells: &[&str], widths: &[usize]) {
    let line = cells
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(i, (cell, &width))| {
            let pad = width.saturating_sub(cell.chars().count());
            // scenario ids are left aligned, numbers right aligned
            if i == 0 {
                format!("{cell}{}", " ".repeat(pad))
            } else {
                format!("{}{cell}", " ".repeat(pad))
            }
        })
        .collect::<Vec<_>>()
        .join("  ");
    let _ = writeln!(out, "{}", line.trim_end());
}
