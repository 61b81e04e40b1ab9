/*
    Standoff Corpus Library (segmented text and standoff annotations)

        Licensed under the GNU General Public License v3
*/

//! ## Introduction
//!
//! This library converts large hierarchical documents (nested session records, TEI-like trees,
//! node/edge exports) into a **standoff representation**: one flat sequence of text segments plus
//! a separate collection of annotations that reference ranges of that sequence by position,
//! instead of embedding markup in the text. Many independent annotation layers (structural,
//! textual, image-region, provenance) can then coexist over one text.
//!
//! **What can you do with this library?**
//!
//! * Keep segmented texts, addressed either by plain index ([`IndexedSegmentedText`]) or by
//!   [`Anchor`] ([`AnchoredSegmentedText`]). Anchored texts can split segments without renumbering
//!   any existing reference.
//! * Query annotations by type, overlap and id ([`AnnotationStore`], and the free functions such as
//!   [`overlapping()`]).
//! * Flatten hierarchical source documents with a declarative per-node-type configuration
//!   ([`TraversalConfig`], [`Traversal`]) and assemble many of them, in document order, into one
//!   corpus ([`CorpusBuilder`]).
//! * Rewrite annotations from independently structured sources, which reference lines by id or
//!   by character offsets, to corpus positions ([`CrossReferenceResolver`]).
//! * Read and write the text store and annotation store as JSON, export annotations as CSV.
//!
//! Processing is sequential and single-threaded. Non-fatal conditions met along the way are
//! collected in an [`AnomalyReport`] for manual review.

mod anchor;
mod annotation;
mod annotationstore;
mod config;
mod corpus;
mod crossref;
mod error;
mod file;
mod json;
mod report;
mod resolution;
mod resources;
mod search;
mod text;
mod traversal;
mod types;

#[cfg(feature = "csv")]
mod csv;

#[cfg(feature = "textvalidation")]
mod textvalidation;

// Our internal crate structure is not very relevant to the outside world,
// expose all structs and traits in the root namespace, and be explicit about it:

pub use anchor::{Anchor, AnchorRef};
pub use annotation::{Annotation, AnnotationBuilder, AnnotationKind, Provenance};
pub use annotationstore::AnnotationStore;
pub use config::{Addressing, Config, Configurable};
pub use corpus::{Corpus, CorpusBuilder};
pub use crossref::{
    collect_span_position, AttendanceList, AttendanceSpan, CrossReferenceResolver, LineIndex,
    LineRange, MissingPolicy, Paragraph, SpanPosition,
};
#[cfg(feature = "csv")]
pub use crate::csv::ToCsv;
pub use error::StandoffError;
pub use file::*;
pub use json::{FromJson, ToJson};
pub use report::{Anomaly, AnomalyReport};
pub use resolution::{PendingAnnotation, ResolutionTraversal};
pub use resources::{AnchoredSegmentedText, IndexedSegmentedText, StoredText, TextStore};
pub use search::{
    by_id, duplicates, filtered_overlapping, find_by_id, of_type, of_type_overlapping, overlapping,
    overlaps, AnnotationFilter,
};
pub use text::{Position, SegmentedText, TextGridSpec};
#[cfg(feature = "textvalidation")]
pub use textvalidation::{sha1_checksum, CHECKSUM_FIELD};
pub use traversal::{
    HookKind, NodeHook, NodeTypeConfig, ScanPageHook, Traversal, TraversalConfig,
    TraversalContext,
};
pub use types::*;

pub use regex::Regex;

mod tests;
