use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MealMarker {
    pub start: bool,
    pub end: bool,
}

impl MealMarker {
    pub fn start() -> Self {
        MealMarker {
            start: true,
            end: false,
        }
    }

    pub fn end() -> Self {
        MealMarker {
            start: false,
            end: true,
        }
    }

    pub fn none() -> Self {
        MealMarker::default()
    }
}

/// Assign a meal segment id to every row.
///
/// Meal starts open a new segment with the next id (1, 2, ...) and push it on
/// a stack; each row is labelled with the most recently opened segment that
/// is still open, or 0 if none is. A meal end closes the top segment after
/// its own row has been labelled. An end with nothing open is ignored.
///
/// Rows must already be in time order.
pub fn label_meal_segments(markers: &[MealMarker]) -> Vec<u32> {
    let mut labels = Vec::with_capacity(markers.len());
    let mut open: Vec<u32> = Vec::new();
    let mut allocated: u32 = 0;

    for marker in markers {
        if marker.start {
            allocated += 1;
            open.push(allocated);
        }

        labels.push(open.last().copied().unwrap_or(0));

        if marker.end {
            // no-op when nothing is open
            open.pop();
        }
    }

    if !open.is_empty() {
        log::debug!("{} meal segment(s) still open at end of data", open.len());
    }

    labels
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MealSegment {
    pub id: u32,
    pub first_row: usize,
    pub last_row: usize,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub rows: usize, // rows carrying this id; can be fewer than the span when shadowed
}

/// Summarise each segment id that appears in `labels`, in id order.
pub fn summarize_segments(
    labels: &[u32],
    timestamps: &[DateTime<FixedOffset>],
) -> Vec<MealSegment> {
    let mut segments: BTreeMap<u32, MealSegment> = BTreeMap::new();

    for (row, (&id, &ts)) in labels.iter().zip(timestamps.iter()).enumerate() {
        if id == 0 {
            continue;
        }

        segments
            .entry(id)
            .and_modify(|segment| {
                segment.last_row = row;
                segment.end = ts;
                segment.rows += 1;
            })
            .or_insert(MealSegment {
                id,
                first_row: row,
                last_row: row,
                start: ts,
                end: ts,
                rows: 1,
            });
    }

    segments.into_values().collect()
}
