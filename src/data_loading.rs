use crate::config::ColumnNames;
use crate::{RawEventLog, RawEventRow};
use anyhow::{bail, Context, Result};
use log::{debug, info, warn};
use std::fs::File;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Find every patient file below `root` with the given extension, sorted by path.
///
/// A directory matching `exclude` (typically the output directory) is not
/// descended into.
pub fn discover_patient_files(
    root: &Path,
    extension: &str,
    max_depth: Option<usize>,
    exclude: Option<&Path>,
) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        bail!("Input path not found: {}", root.display());
    }

    let mut walker = WalkDir::new(root).follow_links(true);
    if let Some(depth) = max_depth {
        walker = walker.max_depth(depth);
    }

    // does not exist yet on a first run, nothing to skip then
    let excluded = exclude.and_then(|p| p.canonicalize().ok());
    let is_excluded = |entry: &walkdir::DirEntry| {
        entry.depth() > 0
            && entry.file_type().is_dir()
            && excluded.is_some()
            && entry.path().canonicalize().ok() == excluded
    };

    let mut files = Vec::new();
    for entry in walker.into_iter().filter_entry(|e| !is_excluded(e)) {
        let entry =
            entry.with_context(|| format!("Failed to scan directory: {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.into_path();
        let matches = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|ext| ext.eq_ignore_ascii_case(extension))
            .unwrap_or(false);
        if matches {
            debug!("Found patient file: {}", path.display());
            files.push(path);
        }
    }

    files.sort();
    info!("Found {} patient files under {}", files.len(), root.display());
    Ok(files)
}

/// Parse a flag or measurement cell.
///
/// Empty cells and text that is neither a number nor a boolean are missing.
pub fn parse_numeric(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    if let Ok(v) = cell.parse::<f64>() {
        return Some(v);
    }
    match cell.to_ascii_lowercase().as_str() {
        "true" => Some(1.0),
        "false" => Some(0.0),
        _ => None,
    }
}

fn non_empty(cell: Option<&str>) -> Option<String> {
    cell.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub fn patient_id_for(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Read one patient's event log.
///
/// Only the timestamp column is mandatory. Every column other than the four
/// named ones is carried along as a value column.
pub fn read_event_log(path: &Path, columns: &ColumnNames) -> Result<RawEventLog> {
    let file =
        File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))?;
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true) // short rows read as missing cells
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = rdr
        .headers()
        .with_context(|| format!("Failed to read header of {}", path.display()))?
        .clone();
    let find = |name: &str| headers.iter().position(|h| h == name);

    let Some(ts_idx) = find(&columns.timestamp) else {
        bail!(
            "{} has no '{}' timestamp column",
            path.display(),
            columns.timestamp
        );
    };

    let category_idx = find(&columns.category);
    let fob_idx = find(&columns.affects_fob);
    let iob_idx = find(&columns.affects_iob);
    for (idx, name) in [
        (category_idx, &columns.category),
        (fob_idx, &columns.affects_fob),
        (iob_idx, &columns.affects_iob),
    ] {
        if idx.is_none() {
            warn!("{}: column '{}' missing, treating as empty", path.display(), name);
        }
    }

    let special = [Some(ts_idx), category_idx, fob_idx, iob_idx];
    let value_idx: Vec<usize> = (0..headers.len())
        .filter(|i| !special.contains(&Some(*i)))
        .collect();
    let value_columns: Vec<String> = value_idx.iter().map(|&i| headers[i].to_string()).collect();

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record =
            result.with_context(|| format!("Failed to read record in {}", path.display()))?;
        let cell = |idx: Option<usize>| idx.and_then(|i| record.get(i));

        rows.push(RawEventRow {
            timestamp: non_empty(record.get(ts_idx)),
            category: non_empty(cell(category_idx)),
            affects_fob: cell(fob_idx).and_then(parse_numeric),
            affects_iob: cell(iob_idx).and_then(parse_numeric),
            values: value_idx
                .iter()
                .map(|&i| record.get(i).and_then(parse_numeric))
                .collect(),
        });
    }

    debug!("Read {} rows from {}", rows.len(), path.display());

    Ok(RawEventLog {
        patient_id: patient_id_for(path),
        source: path.to_path_buf(),
        value_columns,
        rows,
    })
}
