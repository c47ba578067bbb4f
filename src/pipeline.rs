//! Per-patient processing: load, normalize, label, write.
//!
//! Patients are independent and processed one after another. A file that
//! cannot be read is recorded in the run report and skipped.

use crate::config::Config;
use crate::data_loading::{discover_patient_files, read_event_log};
use crate::output::{write_labeled_csv, write_report, FailedFile, PatientReport, RunReport};
use crate::preprocessing::normalize;
use crate::segmentation::{label_meal_segments, summarize_segments};
use crate::{EventTable, RawEventLog};
use anyhow::Result;
use log::{debug, error, info};
use std::path::{Path, PathBuf};

/// Normalize and label one already-loaded log.
pub fn label_event_log(log: &RawEventLog, config: &Config) -> (EventTable, Vec<u32>) {
    let table = normalize(log, &config.normalizer);
    let labels = label_meal_segments(&table.meal_markers());
    debug!(
        "{}: labelled {} rows, {} in a meal",
        table.patient_id,
        labels.len(),
        labels.iter().filter(|&&l| l != 0).count()
    );
    (table, labels)
}

/// Output location for a patient file. Subfolders below the input path are
/// mirrored under the output directory so equal file names cannot collide.
pub fn output_path_for(config: &Config, source: &Path, patient_id: &str) -> PathBuf {
    let subdir = source
        .strip_prefix(&config.input_path)
        .ok()
        .and_then(Path::parent)
        .unwrap_or(Path::new(""));
    config
        .output_dir
        .join(subdir)
        .join(format!("{}_labeled.csv", patient_id))
}

pub fn process_file(path: &Path, config: &Config) -> Result<(EventTable, Vec<u32>, PatientReport)> {
    let log = read_event_log(path, &config.columns)?;
    let (table, labels) = label_event_log(&log, config);

    let output = output_path_for(config, path, &table.patient_id);
    write_labeled_csv(&output, &table, &labels)?;

    let report = PatientReport {
        patient_id: table.patient_id.clone(),
        source: path.to_path_buf(),
        output,
        rows_read: log.rows.len(),
        rows_dropped: table.rows_dropped,
        rows_written: table.len(),
        indicator_columns: table.indicator_columns.clone(),
        segments: summarize_segments(&labels, &table.timestamps()),
    };
    Ok((table, labels, report))
}

pub fn run(config: &Config) -> Result<RunReport> {
    let files = discover_patient_files(
        &config.input_path,
        &config.extension,
        config.max_depth,
        Some(&config.output_dir),
    )?;
    let mut report = RunReport::default();

    for path in files {
        info!("Processing file: {}", path.display());
        match process_file(&path, config) {
            Ok((_, _, patient)) => {
                info!(
                    "{}: {} rows written, {} meal segments",
                    patient.patient_id,
                    patient.rows_written,
                    patient.segments.len()
                );
                report.patients.push(patient);
            }
            Err(e) => {
                error!("Skipping {}: {:#}", path.display(), e);
                report.failed.push(FailedFile {
                    source: path,
                    error: format!("{:#}", e),
                });
            }
        }
    }

    if let Some(report_path) = &config.report {
        write_report(report_path, &report)?;
    }

    Ok(report)
}
