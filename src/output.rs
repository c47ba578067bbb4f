use crate::segmentation::MealSegment;
use crate::EventTable;
use anyhow::{bail, Context, Result};
use log::info;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize)]
pub struct PatientReport {
    pub patient_id: String,
    pub source: PathBuf,
    pub output: PathBuf,
    pub rows_read: usize,
    pub rows_dropped: usize,
    pub rows_written: usize,
    pub indicator_columns: Vec<String>,
    pub segments: Vec<MealSegment>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedFile {
    pub source: PathBuf,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub patients: Vec<PatientReport>,
    pub failed: Vec<FailedFile>,
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    }
    Ok(())
}

/// Write a labelled table: timestamp, flags, value columns, indicator columns,
/// then the meal segment id.
pub fn write_labeled_csv(path: &Path, table: &EventTable, labels: &[u32]) -> Result<()> {
    if labels.len() != table.len() {
        bail!(
            "{} labels for {} rows of {}",
            labels.len(),
            table.len(),
            table.patient_id
        );
    }

    ensure_parent_dir(path)?;
    info!("Writing results to {}", path.display());
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create file: {}", path.display()))?;
    let mut writer = csv::Writer::from_writer(file);

    let mut header = vec!["timestamp", "affects_fob", "affects_iob"];
    header.extend(table.value_columns.iter().map(String::as_str));
    header.extend(table.indicator_columns.iter().map(String::as_str));
    header.push("meal_segment");
    writer.write_record(&header)?;

    for (row, label) in table.rows.iter().zip(labels) {
        let mut record = Vec::with_capacity(header.len());
        record.push(row.timestamp.to_rfc3339());
        record.push(row.affects_fob.to_string());
        record.push(row.affects_iob.to_string());
        record.extend(row.values.iter().map(|v| v.to_string()));
        record.extend(row.indicators.iter().map(|v| v.to_string()));
        record.push(label.to_string());
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

pub fn write_report(path: &Path, report: &RunReport) -> Result<()> {
    ensure_parent_dir(path)?;
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create file: {}", path.display()))?;
    serde_json::to_writer_pretty(file, report)
        .with_context(|| format!("Failed to write report: {}", path.display()))?;
    info!("Wrote run report to {}", path.display());
    Ok(())
}
