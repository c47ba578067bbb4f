use crate::config::NormalizerConfig;
use crate::segmentation::MealMarker;
use crate::{EventRow, EventTable, RawEventLog, MEAL_END, MEAL_START, NULL_CATEGORY};
use chrono::{DateTime, FixedOffset};
use log::{debug, warn};
use std::collections::BTreeSet;

/// Coerce a flag to 0/1. Missing and NaN count as 0, any other non-zero as 1.
pub fn coerce_flag(value: Option<f64>) -> u8 {
    match value {
        Some(v) if !v.is_nan() && v != 0.0 => 1,
        _ => 0,
    }
}

pub fn fill_missing(value: Option<f64>) -> f64 {
    match value {
        Some(v) if !v.is_nan() => v,
        _ => 0.0,
    }
}

pub fn parse_timestamp(raw: &str, format: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_str(raw.trim(), format).ok()
}

/// Turn a raw event log into a cleaned, time-ordered table.
///
/// Malformed rows are never an error: rows without a parseable timestamp are
/// dropped, missing values become 0 and missing categories become "NULL".
pub fn normalize(log: &RawEventLog, config: &NormalizerConfig) -> EventTable {
    // value columns that survive pruning, as (source index, name)
    let kept_values: Vec<(usize, &String)> = log
        .value_columns
        .iter()
        .enumerate()
        .filter(|(_, name)| !config.drop_columns.contains(*name))
        .collect();

    let mut parsed = Vec::with_capacity(log.rows.len());
    for row in &log.rows {
        let Some(timestamp) = row
            .timestamp
            .as_deref()
            .and_then(|raw| parse_timestamp(raw, &config.timestamp_format))
        else {
            continue;
        };

        let category = row
            .category
            .clone()
            .unwrap_or_else(|| NULL_CATEGORY.to_string());
        parsed.push((timestamp, category, row));
    }

    let rows_dropped = log.rows.len() - parsed.len();
    if rows_dropped > 0 {
        warn!(
            "{}: dropped {} of {} rows with missing or unparseable timestamps",
            log.patient_id,
            rows_dropped,
            log.rows.len()
        );
    }

    // stable, so rows sharing a timestamp keep file order
    parsed.sort_by_key(|(timestamp, _, _)| *timestamp);

    // one-hot over observed categories, then keep only the relevant ones
    let observed: BTreeSet<&str> = parsed.iter().map(|(_, c, _)| c.as_str()).collect();
    let indicator_columns: Vec<String> = observed
        .iter()
        .filter(|c| config.relevant_categories.iter().any(|r| r == *c))
        .map(|c| c.to_string())
        .collect();
    debug!(
        "{}: {} categories observed, {} kept as indicators",
        log.patient_id,
        observed.len(),
        indicator_columns.len()
    );

    let rows = parsed
        .iter()
        .map(|(timestamp, category, row)| EventRow {
            timestamp: *timestamp,
            affects_fob: coerce_flag(row.affects_fob),
            affects_iob: coerce_flag(row.affects_iob),
            values: kept_values
                .iter()
                .map(|(i, _)| fill_missing(row.values.get(*i).copied().flatten()))
                .collect(),
            indicators: indicator_columns
                .iter()
                .map(|c| u8::from(c == category))
                .collect(),
            marker: MealMarker {
                start: category == MEAL_START,
                end: category == MEAL_END,
            },
        })
        .collect();

    EventTable {
        patient_id: log.patient_id.clone(),
        value_columns: kept_values.iter().map(|(_, name)| name.to_string()).collect(),
        indicator_columns,
        rows,
        rows_dropped,
    }
}
