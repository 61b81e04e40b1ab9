/*
    Standoff Corpus Library (segmented text and standoff annotations)

        Licensed under the GNU General Public License v3
*/

//! This module contains the [`AnomalyReport`], which collects the non-fatal conditions that occur
//! during a run so they can be reviewed manually afterwards.

use sealed::sealed;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::json::ToJson;
use crate::types::*;

/// A single non-fatal condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Anomaly {
    /// An id (line id, anchor, annotation id) could not be resolved; the referencing item was skipped
    LookupError { id: String, context: String },

    /// A character span did not fall within any line; the span was skipped
    UnmatchedSpan {
        list_id: String,
        offset: usize,
        end: usize,
    },

    /// A line id occurred more often than the configured threshold; the first occurrence was used
    DuplicateLine { line_id: String, occurrences: usize },

    /// Duplicate annotations of this type were merged
    MergedDuplicates { annotation_type: String, discarded: usize },

    /// A session has no attendance list
    MissingAttendanceList { session_id: String },

    /// An annotation could not be given a valid range (its begin lies after its end, or its
    /// begin and end are in different resources); the annotation was skipped
    InvalidRange { id: String, reason: String },
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::LookupError { id, context } => write!(f, "unresolvable id {} ({})", id, context),
            Self::UnmatchedSpan {
                list_id,
                offset,
                end,
            } => write!(
                f,
                "span {}-{} in {} does not match any line",
                offset, end, list_id
            ),
            Self::DuplicateLine {
                line_id,
                occurrences,
            } => write!(f, "line {} occurs {} times", line_id, occurrences),
            Self::MergedDuplicates {
                annotation_type,
                discarded,
            } => write!(
                f,
                "merged duplicate {} annotations, {} discarded",
                annotation_type, discarded
            ),
            Self::MissingAttendanceList { session_id } => {
                write!(f, "session {} has no attendance list", session_id)
            }
            Self::InvalidRange { id, reason } => write!(f, "invalid range for {}: {}", id, reason),
        }
    }
}

/// Run-level summary of anomalies: counters per category plus the individual records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyReport {
    lookup_errors: usize,
    unmatched_spans: usize,
    duplicate_lines: usize,
    merged_duplicates: usize,
    missing_attendance_lists: usize,
    invalid_ranges: usize,
    anomalies: Vec<Anomaly>,
}

impl AnomalyReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an anomaly and updates the counters
    pub fn record(&mut self, anomaly: Anomaly) {
        match &anomaly {
            Anomaly::LookupError { .. } => self.lookup_errors += 1,
            Anomaly::UnmatchedSpan { .. } => self.unmatched_spans += 1,
            Anomaly::DuplicateLine { .. } => self.duplicate_lines += 1,
            Anomaly::MergedDuplicates { discarded, .. } => self.merged_duplicates += discarded,
            Anomaly::MissingAttendanceList { .. } => self.missing_attendance_lists += 1,
            Anomaly::InvalidRange { .. } => self.invalid_ranges += 1,
        }
        self.anomalies.push(anomaly);
    }

    /// Absorbs the anomalies of another report
    pub fn merge(&mut self, other: AnomalyReport) {
        for anomaly in other.anomalies {
            self.record(anomaly);
        }
    }

    pub fn lookup_errors(&self) -> usize {
        self.lookup_errors
    }

    pub fn unmatched_spans(&self) -> usize {
        self.unmatched_spans
    }

    pub fn duplicate_lines(&self) -> usize {
        self.duplicate_lines
    }

    /// Number of annotation records discarded by duplicate merging
    pub fn merged_duplicates(&self) -> usize {
        self.merged_duplicates
    }

    pub fn missing_attendance_lists(&self) -> usize {
        self.missing_attendance_lists
    }

    pub fn invalid_ranges(&self) -> usize {
        self.invalid_ranges
    }

    pub fn is_empty(&self) -> bool {
        self.anomalies.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Anomaly> {
        self.anomalies.iter()
    }

    /// One-line summary of all counters
    pub fn summary(&self) -> String {
        format!(
            "lookup errors: {}, unmatched spans: {}, duplicate lines: {}, merged duplicates: {}, missing attendance lists: {}, invalid ranges: {}",
            self.lookup_errors,
            self.unmatched_spans,
            self.duplicate_lines,
            self.merged_duplicates,
            self.missing_attendance_lists,
            self.invalid_ranges
        )
    }
}

#[sealed]
impl TypeInfo for AnomalyReport {
    fn typeinfo() -> Type {
        Type::AnomalyReport
    }
}

impl ToJson for AnomalyReport {}
