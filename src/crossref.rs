/*
    Standoff Corpus Library (segmented text and standoff annotations)

        Licensed under the GNU General Public License v3
*/

//! This module contains the cross-reference resolver. It indexes the `line` annotations of an
//! assembled corpus by line id, and uses that index to
//!
//! * rewrite [`PendingAnnotation`]s (ranges expressed in line ids, see [`crate::resolution`])
//!   to corpus positions, and
//! * resolve character spans of attendance lists, measured within the concatenated text of a
//!   sequence of paragraphs, to the lines (and offsets within those lines) they fall in.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::anchor::AnchorRef;
use crate::annotation::{Annotation, AnnotationKind};
use crate::annotationstore::AnnotationStore;
use crate::config::{Config, Configurable};
use crate::error::{Context, StandoffError};
use crate::report::{Anomaly, AnomalyReport};
use crate::resolution::PendingAnnotation;
use crate::types::*;

/// What to do with a line id that is not in the index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingPolicy {
    /// Abort with a `LookupError`
    Fail,
    /// Record an anomaly and skip the annotation or span
    #[default]
    Skip,
}

/// A line as referenced from a paragraph or resolution leaf: `start` and `end` are character
/// offsets (half-open) local to the enclosing paragraph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRange {
    pub line_id: String,
    #[serde(default)]
    pub start: usize,
    #[serde(default)]
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    pub line_ranges: Vec<LineRange>,
}

impl Paragraph {
    /// Length in characters. Without text, the end of the last line range counts.
    pub fn char_len(&self) -> usize {
        match self.text.as_ref() {
            Some(text) => text.chars().count(),
            None => self.line_ranges.iter().map(|r| r.end).max().unwrap_or(0),
        }
    }
}

/// A character span `[offset, end)` in the concatenated text of the paragraphs of an attendance list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceSpan {
    #[serde(default)]
    pub id: Option<String>,
    pub offset: usize,
    pub end: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceList {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    pub paragraphs: Vec<Paragraph>,
    #[serde(default)]
    pub spans: Vec<AttendanceSpan>,
}

#[derive(Debug, Clone, PartialEq)]
struct LineEntry {
    resource_id: String,
    begin: AnchorRef,
    end: AnchorRef,
    occurrences: usize,
}

/// Index of line id to the corpus position of that line. The first occurrence of a line id wins,
/// later occurrences are only counted.
#[derive(Debug, Clone, Default)]
pub struct LineIndex {
    lines: HashMap<String, LineEntry>,
}

impl LineIndex {
    /// Builds the index from all `line` annotations in the store
    pub fn new(annotations: &AnnotationStore) -> Self {
        let mut lines: HashMap<String, LineEntry> = HashMap::new();
        for line in annotations.of_type(&AnnotationKind::Line, None) {
            lines
                .entry(line.id().to_string())
                .and_modify(|entry| entry.occurrences += 1)
                .or_insert_with(|| LineEntry {
                    resource_id: line.resource_id().to_string(),
                    begin: line.begin().clone(),
                    end: line.end().clone(),
                    occurrences: 1,
                });
        }
        Self { lines }
    }

    /// Returns the begin and end position of the line
    pub fn get(&self, line_id: &str) -> Option<(&AnchorRef, &AnchorRef)> {
        self.lines
            .get(line_id)
            .map(|entry| (&entry.begin, &entry.end))
    }

    /// Returns the resource the line belongs to
    pub fn resource_of(&self, line_id: &str) -> Option<&str> {
        self.lines
            .get(line_id)
            .map(|entry| entry.resource_id.as_str())
    }

    /// Returns how often the line id occurred among the line annotations
    pub fn occurrences(&self, line_id: &str) -> usize {
        self.lines
            .get(line_id)
            .map(|entry| entry.occurrences)
            .unwrap_or(0)
    }

    /// Line ids occurring more than `threshold` times, with their counts, sorted by id
    pub fn duplicates(&self, threshold: usize) -> Vec<(&str, usize)> {
        let mut duplicates: Vec<(&str, usize)> = self
            .lines
            .iter()
            .filter(|(_, entry)| entry.occurrences > threshold)
            .map(|(id, entry)| (id.as_str(), entry.occurrences))
            .collect();
        duplicates.sort_unstable();
        duplicates
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Where a character span falls in the corpus
#[derive(Debug, Clone, PartialEq)]
pub struct SpanPosition {
    pub resource_id: String,
    pub begin_line: String,
    pub end_line: String,
    pub begin_anchor: AnchorRef,
    pub end_anchor: AnchorRef,
    /// Character offset of the span start within its begin line
    pub begin_char_offset: usize,
    /// Character offset of the span end within its end line
    pub end_char_offset: usize,
}

/// Resolves the span `[offset, end)`, measured in the concatenation of `paragraphs` (in document
/// order), to lines. The span starts in the first line whose range contains `offset` (half-open)
/// and ends in the first line whose range contains `end` (closed, so a span may end exactly where
/// its line ends).
///
/// Fails with a `SpanResolutionError` if no line contains either boundary, and with a
/// `LookupError` if a line is found but is unknown to the index.
pub fn collect_span_position(
    paragraphs: &[Paragraph],
    offset: usize,
    end: usize,
    index: &LineIndex,
) -> Result<SpanPosition, StandoffError> {
    let mut pointer = 0;
    let mut begin_found: Option<(&str, usize)> = None;
    let mut end_found: Option<(&str, usize)> = None;
    'paragraphs: for paragraph in paragraphs {
        for range in paragraph.line_ranges.iter() {
            let (start, stop) = (pointer + range.start, pointer + range.end);
            if begin_found.is_none() && start <= offset && offset < stop {
                begin_found = Some((range.line_id.as_str(), offset - start));
            }
            if end_found.is_none() && start <= end && end <= stop {
                end_found = Some((range.line_id.as_str(), end - start));
            }
            if begin_found.is_some() && end_found.is_some() {
                break 'paragraphs;
            }
        }
        pointer += paragraph.char_len();
    }
    let ((begin_line, begin_char_offset), (end_line, end_char_offset)) =
        match (begin_found, end_found) {
            (Some(begin), Some(end)) => (begin, end),
            _ => {
                return Err(StandoffError::SpanResolutionError {
                    offset,
                    end,
                    context: "collect_span_position()",
                })
            }
        };
    let lookup = |line_id: &str| {
        index.get(line_id).ok_or_else(|| {
            StandoffError::LookupError(line_id.to_string(), "collect_span_position()")
        })
    };
    let (begin_anchor, _) = lookup(begin_line)?;
    let (_, end_anchor) = lookup(end_line)?;
    Ok(SpanPosition {
        resource_id: index.resource_of(begin_line).unwrap_or_default().to_string(),
        begin_line: begin_line.to_string(),
        end_line: end_line.to_string(),
        begin_anchor: begin_anchor.clone(),
        end_anchor: end_anchor.clone(),
        begin_char_offset,
        end_char_offset,
    })
}

/// Rewrites line-id based annotations to corpus positions and resolves attendance spans.
/// Non-fatal conditions are recorded in the resolver's [`AnomalyReport`].
pub struct CrossReferenceResolver {
    config: Config,
    index: LineIndex,
    policy: MissingPolicy,
    report: AnomalyReport,
}

impl Configurable for CrossReferenceResolver {
    fn config(&self) -> &Config {
        &self.config
    }

    fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    fn set_config(&mut self, config: Config) -> &mut Self {
        self.config = config;
        self
    }
}

impl CrossReferenceResolver {
    /// Indexes the lines in `annotations`. Line ids occurring more often than the configured
    /// threshold are reported as anomalies.
    pub fn new(annotations: &AnnotationStore, config: Config) -> Self {
        let index = LineIndex::new(annotations);
        let mut report = AnomalyReport::new();
        for (line_id, occurrences) in index.duplicates(config.line_occurrence_threshold()) {
            warn(&config, || {
                format!("line {} occurs {} times, using the first", line_id, occurrences)
            });
            report.record(Anomaly::DuplicateLine {
                line_id: line_id.to_string(),
                occurrences,
            });
        }
        debug(&config, || {
            format!("CrossReferenceResolver: indexed {} lines", index.len())
        });
        Self {
            config,
            index,
            policy: MissingPolicy::default(),
            report,
        }
    }

    pub fn with_policy(mut self, policy: MissingPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> MissingPolicy {
        self.policy
    }

    pub fn index(&self) -> &LineIndex {
        &self.index
    }

    pub fn report(&self) -> &AnomalyReport {
        &self.report
    }

    pub fn into_report(self) -> AnomalyReport {
        self.report
    }

    /// Applies the missing policy to a lookup failure: fails, or records it and lets the caller skip
    fn missing(&mut self, id: &str, context: Context) -> Result<(), StandoffError> {
        match self.policy {
            MissingPolicy::Fail => Err(StandoffError::LookupError(
                format!("line {}", id),
                context,
            )),
            MissingPolicy::Skip => {
                warn(&self.config, || {
                    format!("unresolvable line {} ({}), skipped", id, context)
                });
                self.report.record(Anomaly::LookupError {
                    id: id.to_string(),
                    context: context.to_string(),
                });
                Ok(())
            }
        }
    }

    /// Applies the missing policy to an annotation without a valid range: fails with `error`, or
    /// records it and lets the caller skip
    fn reject(&mut self, id: &str, error: StandoffError) -> Result<(), StandoffError> {
        match self.policy {
            MissingPolicy::Fail => Err(error),
            MissingPolicy::Skip => {
                let reason = String::from(&error);
                warn(&self.config, || format!("{} skipped: {}", id, reason));
                self.report.record(Anomaly::InvalidRange {
                    id: id.to_string(),
                    reason,
                });
                Ok(())
            }
        }
    }

    /// Rewrites pending annotations: the begin becomes the begin of the begin line, the end
    /// becomes the end of the end line. Under [`MissingPolicy::Skip`], items whose lines are
    /// unknown, in different resources, or out of order are recorded and skipped.
    pub fn resolve<I>(&mut self, pending: I) -> Result<Vec<Annotation>, StandoffError>
    where
        I: IntoIterator<Item = PendingAnnotation>,
    {
        let mut resolved = Vec::new();
        for item in pending {
            let begin = self
                .index
                .get(&item.begin_line)
                .map(|(begin, _)| begin.clone());
            let end = self.index.get(&item.end_line).map(|(_, end)| end.clone());
            let (begin, end) = match (begin, end) {
                (Some(begin), Some(end)) => (begin, end),
                (None, _) => {
                    self.missing(&item.begin_line, "CrossReferenceResolver::resolve()")?;
                    continue;
                }
                (_, None) => {
                    self.missing(&item.end_line, "CrossReferenceResolver::resolve()")?;
                    continue;
                }
            };
            let resource_id = self
                .index
                .resource_of(&item.begin_line)
                .unwrap_or_default()
                .to_string();
            if self.index.resource_of(&item.end_line) != Some(resource_id.as_str()) {
                let error = StandoffError::LookupError(
                    format!(
                        "lines {} and {} in different resources",
                        item.begin_line, item.end_line
                    ),
                    "CrossReferenceResolver::resolve()",
                );
                self.reject(&item.id, error)?;
                continue;
            }
            if !in_order(&begin, &end) {
                let error = StandoffError::OrderingError(
                    format!(
                        "line {} of {} comes after its end line {}",
                        item.begin_line, item.id, item.end_line
                    ),
                    "CrossReferenceResolver::resolve()",
                );
                self.reject(&item.id, error)?;
                continue;
            }
            let mut builder = Annotation::builder(item.kind, item.id)
                .with_resource(resource_id)
                .with_range(begin, end)
                .with_metadata(item.metadata);
            for (key, value) in item.extra {
                builder = builder.with_extra(key, value);
            }
            resolved.push(builder.build()?);
        }
        debug(&self.config, || {
            format!("CrossReferenceResolver.resolve: {} annotations", resolved.len())
        });
        Ok(resolved)
    }

    /// As [`Self::resolve()`], adding the results to `store`. Returns the number of annotations added.
    pub fn resolve_into<I>(
        &mut self,
        pending: I,
        store: &mut AnnotationStore,
    ) -> Result<usize, StandoffError>
    where
        I: IntoIterator<Item = PendingAnnotation>,
    {
        let resolved = self.resolve(pending)?;
        let count = resolved.len();
        store.extend(resolved);
        Ok(count)
    }

    /// Resolves the attendance list of a session into an `attendance_list` annotation spanning
    /// its paragraphs plus one `attendant` annotation per span. A session without a list, and
    /// spans that match no line, are recorded as anomalies; neither aborts the run.
    pub fn resolve_attendance(
        &mut self,
        list: Option<&AttendanceList>,
        session_id: &str,
    ) -> Result<Vec<Annotation>, StandoffError> {
        let list = match list {
            Some(list) => list,
            None => {
                warn(&self.config, || {
                    format!("session {} has no attendance list", session_id)
                });
                self.report.record(Anomaly::MissingAttendanceList {
                    session_id: session_id.to_string(),
                });
                return Ok(Vec::new());
            }
        };

        let mut annotations = Vec::new();
        let first_line = list
            .paragraphs
            .iter()
            .flat_map(|p| p.line_ranges.first())
            .next();
        let last_line = list
            .paragraphs
            .iter()
            .rev()
            .flat_map(|p| p.line_ranges.last())
            .next();
        if let (Some(first), Some(last)) = (first_line, last_line) {
            let begin = self.index.get(&first.line_id).map(|(begin, _)| begin.clone());
            let end = self.index.get(&last.line_id).map(|(_, end)| end.clone());
            match (begin, end) {
                (Some(begin), Some(end)) if !in_order(&begin, &end) => {
                    let error = StandoffError::OrderingError(
                        format!(
                            "first line {} comes after last line {}",
                            first.line_id, last.line_id
                        ),
                        "CrossReferenceResolver::resolve_attendance()",
                    );
                    self.reject(&list.id, error)?;
                }
                (Some(begin), Some(end)) => {
                    annotations.push(
                        Annotation::builder(AnnotationKind::AttendanceList, list.id.as_str())
                            .with_resource(
                                self.index.resource_of(&first.line_id).unwrap_or_default(),
                            )
                            .with_range(begin, end)
                            .with_metadata(list.metadata.clone())
                            .with_extra("session_id", session_id)
                            .build()?,
                    );
                }
                (None, _) => {
                    self.missing(&first.line_id, "CrossReferenceResolver::resolve_attendance()")?
                }
                (_, None) => {
                    self.missing(&last.line_id, "CrossReferenceResolver::resolve_attendance()")?
                }
            }
        }

        for (i, span) in list.spans.iter().enumerate() {
            let position =
                match collect_span_position(&list.paragraphs, span.offset, span.end, &self.index) {
                    Ok(position) => position,
                    Err(StandoffError::SpanResolutionError { offset, end, .. }) => {
                        warn(&self.config, || {
                            format!(
                                "span {}-{} in {} does not match any line, skipped",
                                offset, end, list.id
                            )
                        });
                        self.report.record(Anomaly::UnmatchedSpan {
                            list_id: list.id.clone(),
                            offset,
                            end,
                        });
                        continue;
                    }
                    Err(StandoffError::LookupError(item, context)) => {
                        self.missing(&item, context)?;
                        continue;
                    }
                    Err(e) => return Err(e),
                };
            if !in_order(&position.begin_anchor, &position.end_anchor) {
                warn(&self.config, || {
                    format!(
                        "span {}-{} in {} ends in a line before the one it begins in, skipped",
                        span.offset, span.end, list.id
                    )
                });
                self.report.record(Anomaly::UnmatchedSpan {
                    list_id: list.id.clone(),
                    offset: span.offset,
                    end: span.end,
                });
                continue;
            }
            let id = span
                .id
                .clone()
                .unwrap_or_else(|| format!("{}-{}", list.id, i + 1));
            annotations.push(
                Annotation::builder(AnnotationKind::Attendant, id)
                    .with_resource(position.resource_id)
                    .with_range(position.begin_anchor, position.end_anchor)
                    .with_metadata(span.metadata.clone())
                    .with_extra("begin_char_offset", position.begin_char_offset)
                    .with_extra("end_char_offset", position.end_char_offset)
                    .build()?,
            );
        }
        Ok(annotations)
    }
}

/// Tests whether `begin` does not come after `end`; positions of different kinds are never in order
fn in_order(begin: &AnchorRef, end: &AnchorRef) -> bool {
    matches!(
        begin.partial_cmp(end),
        Some(Ordering::Less) | Some(Ordering::Equal)
    )
}
