/*
    Standoff Corpus Library (segmented text and standoff annotations)

        Licensed under the GNU General Public License v3
*/

//! This module defines [`Annotation`], a standoff annotation record referencing an inclusive range
//! of segments in one resource, and the [`AnnotationBuilder`] that validates records on construction.

use chrono::{DateTime, Utc};
use sealed::sealed;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use crate::anchor::AnchorRef;
use crate::error::StandoffError;
use crate::text::SegmentedText;
use crate::types::*;

/// The kind of an annotation. This is the discriminant (`type` in JSON) that selects which fields
/// are required on the record. Kinds not known to this library are carried as [`AnnotationKind::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AnnotationKind {
    Session,
    TextRegion,
    Line,
    Scan,
    Page,
    Paragraph,
    Resolution,
    AttendanceList,
    Attendant,
    Other(String),
}

impl AnnotationKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Session => "session",
            Self::TextRegion => "text_region",
            Self::Line => "line",
            Self::Scan => "scan",
            Self::Page => "page",
            Self::Paragraph => "paragraph",
            Self::Resolution => "resolution",
            Self::AttendanceList => "attendance_list",
            Self::Attendant => "attendant",
            Self::Other(s) => s.as_str(),
        }
    }

    /// Type-specific fields that must be present on an annotation of this kind
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            Self::Attendant => &["begin_char_offset", "end_char_offset"],
            _ => &[],
        }
    }
}

impl From<&str> for AnnotationKind {
    fn from(s: &str) -> Self {
        match s {
            "session" => Self::Session,
            "text_region" => Self::TextRegion,
            "line" => Self::Line,
            "scan" => Self::Scan,
            "page" => Self::Page,
            "paragraph" => Self::Paragraph,
            "resolution" => Self::Resolution,
            "attendance_list" => Self::AttendanceList,
            "attendant" => Self::Attendant,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for AnnotationKind {
    fn from(s: String) -> Self {
        match Self::from(s.as_str()) {
            Self::Other(_) => Self::Other(s),
            kind => kind,
        }
    }
}

impl From<AnnotationKind> for String {
    fn from(kind: AnnotationKind) -> String {
        match kind {
            AnnotationKind::Other(s) => s,
            kind => kind.as_str().to_string(),
        }
    }
}

impl fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where an annotation came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    /// The source file (or other source identifier) the annotation was derived from
    pub source: String,
    /// When the annotation was created
    pub created: DateTime<Utc>,
}

impl Provenance {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            created: Utc::now(),
        }
    }
}

/// A standoff annotation on one resource. `begin_anchor` and `end_anchor` are both inclusive and
/// are either both indices or both anchors. Invariant: `begin_anchor <= end_anchor`.
///
/// Multiple annotations may share `(resource_id, type, id)`; see [`crate::AnnotationStore::merge_duplicates()`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    resource_id: String,

    #[serde(rename = "type")]
    kind: AnnotationKind,

    id: String,

    begin_anchor: AnchorRef,

    end_anchor: AnchorRef,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    metadata: Option<Map<String, Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    owner: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    region_links: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    provenance: Option<Provenance>,

    /// Type-specific extra fields
    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

#[sealed]
impl TypeInfo for Annotation {
    fn typeinfo() -> Type {
        Type::Annotation
    }
}

impl Annotation {
    /// Shortcut to start building a new annotation
    pub fn builder(kind: impl Into<AnnotationKind>, id: impl Into<String>) -> AnnotationBuilder {
        AnnotationBuilder::new(kind, id)
    }

    pub fn resource_id(&self) -> &str {
        self.resource_id.as_str()
    }

    pub fn kind(&self) -> &AnnotationKind {
        &self.kind
    }

    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    /// Returns the (inclusive) begin position
    pub fn begin(&self) -> &AnchorRef {
        &self.begin_anchor
    }

    /// Returns the (inclusive) end position
    pub fn end(&self) -> &AnchorRef {
        &self.end_anchor
    }

    pub fn metadata(&self) -> Option<&Map<String, Value>> {
        self.metadata.as_ref()
    }

    /// Returns a single metadata field
    pub fn metadata_field(&self, key: &str) -> Option<&Value> {
        self.metadata.as_ref().and_then(|m| m.get(key))
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub fn region_links(&self) -> &[String] {
        &self.region_links
    }

    pub fn provenance(&self) -> Option<&Provenance> {
        self.provenance.as_ref()
    }

    /// Returns a type-specific extra field
    pub fn extra(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Iterates over all type-specific extra fields
    pub fn extras(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.extra.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Tests whether the annotation has the given kind
    pub fn is_a(&self, kind: &AnnotationKind) -> bool {
        &self.kind == kind
    }

    /// Returns the text this annotation covers in `text`, segments joined by `delimiter`.
    /// The text must belong to the annotation's resource.
    pub fn text<T: SegmentedText>(&self, text: &T, delimiter: &str) -> Result<String, StandoffError> {
        if text.resource_id() != self.resource_id {
            return Err(StandoffError::LookupError(
                format!("text for resource {}", self.resource_id),
                "Annotation::text()",
            ));
        }
        text.text_between(&self.begin_anchor, &self.end_anchor, delimiter)
    }

    /// Shifts index positions by `offset` (see [`AnchorRef::rebase()`])
    pub(crate) fn rebase(&mut self, offset: usize) {
        self.begin_anchor = self.begin_anchor.rebase(offset);
        self.end_anchor = self.end_anchor.rebase(offset);
    }

    pub(crate) fn set_range(&mut self, begin: AnchorRef, end: AnchorRef) {
        self.begin_anchor = begin;
        self.end_anchor = end;
    }

    pub(crate) fn set_end(&mut self, end: AnchorRef) {
        self.end_anchor = end;
    }

    pub(crate) fn set_provenance(&mut self, provenance: Provenance) {
        self.provenance = Some(provenance);
    }

    pub(crate) fn set_extra(&mut self, key: impl Into<String>, value: Value) {
        self.extra.insert(key.into(), value);
    }
}

/// This is the build recipe for an [`Annotation`]. Calling [`Self::build()`] validates the record:
/// a resource must be set, begin must not come after end, and the fields required by the kind must be present.
#[derive(Debug, Clone)]
pub struct AnnotationBuilder {
    resource_id: Option<String>,
    kind: AnnotationKind,
    id: String,
    begin_anchor: Option<AnchorRef>,
    end_anchor: Option<AnchorRef>,
    metadata: Option<Map<String, Value>>,
    owner: Option<String>,
    region_links: Vec<String>,
    provenance: Option<Provenance>,
    extra: BTreeMap<String, Value>,
}

impl AnnotationBuilder {
    pub fn new(kind: impl Into<AnnotationKind>, id: impl Into<String>) -> Self {
        Self {
            resource_id: None,
            kind: kind.into(),
            id: id.into(),
            begin_anchor: None,
            end_anchor: None,
            metadata: None,
            owner: None,
            region_links: Vec::new(),
            provenance: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_resource(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = Some(resource_id.into());
        self
    }

    /// Sets the inclusive range this annotation covers
    pub fn with_range(mut self, begin: impl Into<AnchorRef>, end: impl Into<AnchorRef>) -> Self {
        self.begin_anchor = Some(begin.into());
        self.end_anchor = Some(end.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Option<Map<String, Value>>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn with_region_link(mut self, link: impl Into<String>) -> Self {
        self.region_links.push(link.into());
        self
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = Some(provenance);
        self
    }

    /// Adds a type-specific extra field
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> Result<Annotation, StandoffError> {
        let resource_id = self.resource_id.ok_or_else(|| {
            StandoffError::StructuralMismatch(
                "resource_id".to_string(),
                Some(self.id.clone()),
                "AnnotationBuilder::build()",
            )
        })?;
        let (begin_anchor, end_anchor) = match (self.begin_anchor, self.end_anchor) {
            (Some(begin), Some(end)) => (begin, end),
            _ => {
                return Err(StandoffError::StructuralMismatch(
                    "begin_anchor/end_anchor".to_string(),
                    Some(self.id),
                    "AnnotationBuilder::build()",
                ))
            }
        };
        match begin_anchor.partial_cmp(&end_anchor) {
            Some(Ordering::Less) | Some(Ordering::Equal) => {}
            _ => {
                return Err(StandoffError::OrderingError(
                    format!(
                        "annotation {} begins at {} which is not before its end {}",
                        self.id, begin_anchor, end_anchor
                    ),
                    "AnnotationBuilder::build()",
                ))
            }
        }
        for field in self.kind.required_fields() {
            if !self.extra.contains_key(*field) {
                return Err(StandoffError::StructuralMismatch(
                    field.to_string(),
                    Some(self.id),
                    "AnnotationBuilder::build()",
                ));
            }
        }
        Ok(Annotation {
            resource_id,
            kind: self.kind,
            id: self.id,
            begin_anchor,
            end_anchor,
            metadata: self.metadata,
            owner: self.owner,
            region_links: self.region_links,
            provenance: self.provenance,
            extra: self.extra,
        })
    }
}
