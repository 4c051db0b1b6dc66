use crate::{
    analyzer::AnalysisResult,
    handler::{Outcome, Settlement},
    render::{MISSING_VALUE, field_text},
    util::{ensure_dir, now_rfc3339},
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// One analyzed image, as recorded in the local dataset (JSON Lines).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRow {
    pub analyzed_at: String,
    pub input: String,
    pub input_sha256: String,
    #[serde(flatten)]
    pub result: AnalysisResult,
}

impl DatasetRow {
    pub fn new(input: &str, input_sha256: String, result: AnalysisResult) -> Self {
        Self {
            analyzed_at: now_rfc3339(),
            input: input.to_string(),
            input_sha256,
            result,
        }
    }
}

/// Only complete analyses the user actually saw are recorded.
pub fn recordable(settlement: &Settlement) -> Option<&AnalysisResult> {
    match &settlement.outcome {
        Outcome::Succeeded(result) if settlement.displayed && result.is_complete() => Some(result),
        _ => None,
    }
}

pub fn append_row(path: &Path, row: &DatasetRow) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent)?;
    }
    let mut line = serde_json::to_string(row)?;
    line.push('\n');
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open dataset: {}", path.display()))?;
    file.write_all(line.as_bytes())
        .with_context(|| format!("append dataset: {}", path.display()))
}

/// Missing file means an empty dataset.
pub fn read_rows(path: &Path) -> Result<Vec<DatasetRow>> {
    let file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => {
            return Err(err).with_context(|| format!("open dataset: {}", path.display()));
        }
    };

    let mut rows = Vec::new();
    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("read dataset: {}", path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        let row: DatasetRow = serde_json::from_str(&line)
            .with_context(|| format!("parse dataset line {}: {}", i + 1, path.display()))?;
        rows.push(row);
    }
    Ok(rows)
}

/// (name, germination rate) in dataset order; rows without a numeric rate are skipped.
pub fn germination_series(rows: &[DatasetRow]) -> Vec<(String, f64)> {
    rows.iter()
        .filter_map(|row| {
            let rate = row.result.germination_rate.as_ref()?.as_f64()?;
            Some((field_text(row.result.object_name.as_ref()), rate))
        })
        .collect()
}

pub fn render_chart(series: &[(String, f64)], width: usize) -> String {
    if series.is_empty() {
        return "Germination Rate (%): no data".to_string();
    }

    let scale = series
        .iter()
        .map(|(_, rate)| *rate)
        .fold(100.0_f64, f64::max);
    let label_width = series
        .iter()
        .map(|(name, _)| name.chars().count())
        .max()
        .unwrap_or(MISSING_VALUE.len());

    let mut out = vec!["Germination Rate (%)".to_string()];
    for (name, rate) in series {
        let filled = ((rate.max(0.0) / scale) * width as f64).round() as usize;
        out.push(format!(
            "{name:<label_width$} | {} {rate}",
            "#".repeat(filled.min(width))
        ));
    }
    out.join("\n")
}
