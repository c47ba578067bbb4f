pub mod config;
pub mod data_loading;
pub mod output;
pub mod pipeline;
pub mod preprocessing;
pub mod segmentation;

use chrono::{DateTime, FixedOffset};
use std::path::PathBuf;

pub const MEAL_START: &str = "ANNOUNCE_MEAL";
pub const MEAL_END: &str = "MEAL_END";
pub const NULL_CATEGORY: &str = "NULL";

/// A row exactly as read from a patient file. Nothing here has been validated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawEventRow {
    pub timestamp: Option<String>,
    pub category: Option<String>,
    pub affects_fob: Option<f64>,
    pub affects_iob: Option<f64>,
    pub values: Vec<Option<f64>>, // aligned with RawEventLog::value_columns
}

#[derive(Debug, Clone)]
pub struct RawEventLog {
    pub patient_id: String,
    pub source: PathBuf,
    pub value_columns: Vec<String>,
    pub rows: Vec<RawEventRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventRow {
    pub timestamp: DateTime<FixedOffset>,
    pub affects_fob: u8,
    pub affects_iob: u8,
    pub values: Vec<f64>,
    pub indicators: Vec<u8>,
    pub marker: segmentation::MealMarker, // from the category, before indicators are pruned
}

/// Cleaned, time-ordered rows for one patient.
#[derive(Debug, Clone)]
pub struct EventTable {
    pub patient_id: String,
    pub value_columns: Vec<String>,
    pub indicator_columns: Vec<String>,
    pub rows: Vec<EventRow>,
    pub rows_dropped: usize,
}

impl EventTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn indicator_index(&self, category: &str) -> Option<usize> {
        self.indicator_columns.iter().position(|c| c == category)
    }

    /// Start/end predicates per row.
    pub fn meal_markers(&self) -> Vec<segmentation::MealMarker> {
        self.rows.iter().map(|row| row.marker).collect()
    }

    pub fn timestamps(&self) -> Vec<DateTime<FixedOffset>> {
        self.rows.iter().map(|r| r.timestamp).collect()
    }
}
