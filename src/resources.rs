/*
    Standoff Corpus Library (segmented text and standoff annotations)

        Licensed under the GNU General Public License v3
*/

//! This module contains the two segmented text containers, [`IndexedSegmentedText`] and
//! [`AnchoredSegmentedText`], and the persisted [`TextStore`] that holds them.

use datasize::DataSize;
use sealed::sealed;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::anchor::{Anchor, AnchorRef};
use crate::config::Config;
use crate::error::StandoffError;
use crate::json::*;
use crate::text::*;
use crate::types::*;

/// A segmented text addressed by plain integer indices.
/// Used for large corpora where segments are never split after creation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, DataSize)]
#[serde(deny_unknown_fields)]
pub struct IndexedSegmentedText {
    resource_id: String,

    #[serde(default)]
    text_grid_spec: TextGridSpec,

    #[serde(rename = "_ordered_segments")]
    ordered_segments: Vec<String>,
}

impl IndexedSegmentedText {
    pub fn new(resource_id: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
            ..Self::default()
        }
    }

    /// Builder pattern to associate a grid specification
    pub fn with_grid_spec(mut self, grid_spec: TextGridSpec) -> Self {
        self.text_grid_spec = grid_spec;
        self
    }

    /// Builder pattern to add segments
    pub fn with_segments<I, S>(mut self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extend_segments(segments);
        self
    }

    /// Converts into an identity-addressed text, allocating one anchor per segment with its index as order key
    pub fn into_anchored(self) -> AnchoredSegmentedText {
        let anchors = (0..self.ordered_segments.len())
            .map(|i| Anchor::new(i as f64))
            .collect();
        AnchoredSegmentedText {
            resource_id: self.resource_id,
            text_grid_spec: self.text_grid_spec,
            ordered_segments: self.ordered_segments,
            anchors,
            upper_bound: None,
        }
    }
}

#[sealed]
impl TypeInfo for IndexedSegmentedText {
    fn typeinfo() -> Type {
        Type::SegmentedText
    }
}

impl SegmentedText for IndexedSegmentedText {
    fn resource_id(&self) -> &str {
        self.resource_id.as_str()
    }

    fn grid_spec(&self) -> &TextGridSpec {
        &self.text_grid_spec
    }

    fn segments(&self) -> &[String] {
        &self.ordered_segments
    }

    fn append(&mut self, segment: impl Into<String>) {
        self.ordered_segments.push(segment.into());
    }

    fn extend_grid(&mut self, other: Self) {
        self.ordered_segments.extend(other.ordered_segments);
    }

    fn index_of(&self, position: Position) -> Result<usize, StandoffError> {
        match position {
            Position::Index(index) if index < self.ordered_segments.len() => Ok(index),
            Position::Index(index) => Err(out_of_range(
                index,
                self.ordered_segments.len(),
                "IndexedSegmentedText::index_of()",
            )),
            Position::Anchor(anchor) => Err(StandoffError::LookupError(
                format!("anchor {} in an index-addressed text", anchor),
                "IndexedSegmentedText::index_of()",
            )),
            Position::Identifier(id) => Err(StandoffError::LookupError(
                format!("anchor identifier {} in an index-addressed text", id),
                "IndexedSegmentedText::index_of()",
            )),
        }
    }

    fn position_at(&self, index: usize) -> Result<AnchorRef, StandoffError> {
        if index < self.ordered_segments.len() {
            Ok(AnchorRef::Index(index))
        } else {
            Err(out_of_range(
                index,
                self.ordered_segments.len(),
                "IndexedSegmentedText::position_at()",
            ))
        }
    }

    fn slice_grid<'a>(
        &self,
        from: impl Into<Position<'a>>,
        to: impl Into<Position<'a>>,
    ) -> Result<Self, StandoffError> {
        let (begin, end) = self.index_range(from.into(), to.into())?;
        Ok(Self {
            resource_id: self.resource_id.clone(),
            text_grid_spec: self.text_grid_spec.clone(),
            ordered_segments: self.ordered_segments[begin..=end].to_vec(),
        })
    }
}

/// A segmented text in which every segment is paired with an [`Anchor`].
///
/// Invariant: there are exactly as many anchors as segments, and segment `i` is addressed by
/// anchor `i`. Positions referenced by anchor remain valid when unrelated segments are split.
/// Deserialisation enforces the invariant.
#[derive(Debug, Clone, Default, Serialize, Deserialize, DataSize)]
#[serde(try_from = "AnchoredSegmentedTextJson")]
pub struct AnchoredSegmentedText {
    resource_id: String,

    #[serde(default)]
    text_grid_spec: TextGridSpec,

    #[serde(rename = "_ordered_segments")]
    ordered_segments: Vec<String>,

    #[serde(rename = "_anchors")]
    anchors: Vec<Anchor>,

    /// Order key of the anchor following the last segment, if this text was sliced from a larger one.
    #[serde(skip)]
    upper_bound: Option<f64>,
}

/// Serialised form of an [`AnchoredSegmentedText`], checked on conversion
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct AnchoredSegmentedTextJson {
    resource_id: String,
    #[serde(default)]
    text_grid_spec: TextGridSpec,
    #[serde(rename = "_ordered_segments")]
    ordered_segments: Vec<String>,
    #[serde(rename = "_anchors")]
    anchors: Vec<Anchor>,
}

impl TryFrom<AnchoredSegmentedTextJson> for AnchoredSegmentedText {
    type Error = StandoffError;

    fn try_from(json: AnchoredSegmentedTextJson) -> Result<Self, Self::Error> {
        if json.anchors.len() != json.ordered_segments.len() {
            return Err(StandoffError::StructuralMismatch(
                format!(
                    "_anchors ({} anchors for {} segments)",
                    json.anchors.len(),
                    json.ordered_segments.len()
                ),
                Some(json.resource_id),
                "AnchoredSegmentedText deserialisation",
            ));
        }
        Ok(Self {
            resource_id: json.resource_id,
            text_grid_spec: json.text_grid_spec,
            ordered_segments: json.ordered_segments,
            anchors: json.anchors,
            upper_bound: None,
        })
    }
}

impl AnchoredSegmentedText {
    pub fn new(resource_id: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
            ..Self::default()
        }
    }

    /// Builder pattern to associate a grid specification
    pub fn with_grid_spec(mut self, grid_spec: TextGridSpec) -> Self {
        self.text_grid_spec = grid_spec;
        self
    }

    /// Builder pattern to add segments, each receiving a fresh anchor
    pub fn with_segments<I, S>(mut self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extend_segments(segments);
        self
    }

    /// Returns all anchors in order
    pub fn anchors(&self) -> &[Anchor] {
        &self.anchors
    }

    /// Returns the anchor addressing the segment at `index`
    pub fn anchor(&self, index: usize) -> Result<&Anchor, StandoffError> {
        self.anchors.get(index).ok_or_else(|| {
            out_of_range(
                index,
                self.anchors.len(),
                "AnchoredSegmentedText::anchor()",
            )
        })
    }

    /// Returns the anchor following the given one, if any
    pub fn successor(&self, anchor: &Anchor) -> Option<&Anchor> {
        let index = self.index_of(Position::Anchor(anchor)).ok()?;
        self.anchors.get(index + 1)
    }

    /// Splits the segment addressed by `after_anchor` at character offset `at_offset`
    /// (unicode codepoints). The first part keeps the original anchor, the second part gets a new
    /// anchor whose order key lies halfway between the original anchor and its successor.
    /// Nothing else is renumbered. Returns the new anchor.
    ///
    /// Fails with an `OrderingError` if there is no successor to interpolate against, or if
    /// floating point precision between the two neighbours is exhausted (see [`Self::rekey()`]).
    pub fn split(&mut self, after_anchor: &Anchor, at_offset: usize) -> Result<Anchor, StandoffError> {
        let index = self.index_of(Position::Anchor(after_anchor))?;
        let upper = match self.anchors.get(index + 1) {
            Some(successor) => successor.sequence_number(),
            None => self.upper_bound.ok_or_else(|| {
                StandoffError::OrderingError(
                    format!("anchor {} has no successor", after_anchor),
                    "AnchoredSegmentedText::split()",
                )
            })?,
        };
        let new_anchor = self.anchors[index].interpolate(upper)?;

        let segment = &self.ordered_segments[index];
        let bytepos = if at_offset == 0 {
            0
        } else {
            match segment.char_indices().nth(at_offset) {
                Some((bytepos, _)) => bytepos,
                None if segment.chars().count() == at_offset => segment.len(),
                None => {
                    return Err(StandoffError::LookupError(
                        format!(
                            "character offset {} in a segment of {} characters",
                            at_offset,
                            segment.chars().count()
                        ),
                        "AnchoredSegmentedText::split()",
                    ))
                }
            }
        };

        let tail = self.ordered_segments[index].split_off(bytepos);
        self.ordered_segments.insert(index + 1, tail);
        self.anchors.insert(index + 1, new_anchor.clone());
        Ok(new_anchor)
    }

    /// Renumbers all order keys to `0..len` (identities are preserved) and returns a map of
    /// identifier to new order key, to be applied to annotations via
    /// [`crate::AnnotationStore::rekey_anchors()`].
    pub fn rekey(&mut self) -> HashMap<String, f64> {
        let mut map = HashMap::with_capacity(self.anchors.len());
        for (i, anchor) in self.anchors.iter_mut().enumerate() {
            *anchor = anchor.rekeyed(i as f64);
            map.insert(anchor.identifier().to_string(), i as f64);
        }
        self.upper_bound = None;
        map
    }

    fn index_of_anchor(&self, anchor: &Anchor) -> Option<usize> {
        // anchors are ordered by key, so try a binary search first
        let found = self.anchors.binary_search_by(|probe| {
            probe
                .sequence_number()
                .partial_cmp(&anchor.sequence_number())
                .unwrap_or(Ordering::Less)
        });
        if let Ok(index) = found {
            if self.anchors[index].same_identity(anchor) {
                return Some(index);
            }
        }
        // key ranges of verbatim concatenated texts need not be sorted
        self.index_of_identifier(anchor.identifier())
    }

    fn index_of_identifier(&self, identifier: &str) -> Option<usize> {
        self.anchors.iter().position(|a| a.identifier() == identifier)
    }
}

#[sealed]
impl TypeInfo for AnchoredSegmentedText {
    fn typeinfo() -> Type {
        Type::SegmentedText
    }
}

impl SegmentedText for AnchoredSegmentedText {
    fn resource_id(&self) -> &str {
        self.resource_id.as_str()
    }

    fn grid_spec(&self) -> &TextGridSpec {
        &self.text_grid_spec
    }

    fn segments(&self) -> &[String] {
        &self.ordered_segments
    }

    fn append(&mut self, segment: impl Into<String>) {
        let anchor = Anchor::new(self.ordered_segments.len() as f64);
        self.ordered_segments.push(segment.into());
        self.anchors.push(anchor);
    }

    fn extend_grid(&mut self, other: Self) {
        self.ordered_segments.extend(other.ordered_segments);
        self.anchors.extend(other.anchors);
        self.upper_bound = other.upper_bound;
    }

    fn index_of(&self, position: Position) -> Result<usize, StandoffError> {
        match position {
            Position::Index(index) if index < self.ordered_segments.len() => Ok(index),
            Position::Index(index) => Err(out_of_range(
                index,
                self.ordered_segments.len(),
                "AnchoredSegmentedText::index_of()",
            )),
            Position::Anchor(anchor) => self.index_of_anchor(anchor).ok_or_else(|| {
                StandoffError::LookupError(
                    format!("anchor {}", anchor),
                    "AnchoredSegmentedText::index_of()",
                )
            }),
            Position::Identifier(id) => self.index_of_identifier(id).ok_or_else(|| {
                StandoffError::LookupError(
                    format!("anchor identifier {}", id),
                    "AnchoredSegmentedText::index_of()",
                )
            }),
        }
    }

    fn position_at(&self, index: usize) -> Result<AnchorRef, StandoffError> {
        self.anchor(index).map(AnchorRef::from)
    }

    fn slice_grid<'a>(
        &self,
        from: impl Into<Position<'a>>,
        to: impl Into<Position<'a>>,
    ) -> Result<Self, StandoffError> {
        let (begin, end) = self.index_range(from.into(), to.into())?;
        let upper_bound = match self.anchors.get(end + 1) {
            Some(successor) => Some(successor.sequence_number()),
            None => self.upper_bound,
        };
        Ok(Self {
            resource_id: self.resource_id.clone(),
            text_grid_spec: self.text_grid_spec.clone(),
            ordered_segments: self.ordered_segments[begin..=end].to_vec(),
            anchors: self.anchors[begin..=end].to_vec(),
            upper_bound,
        })
    }
}

/// A text as it appears in the persisted text store; the variant is determined by the presence of `_anchors`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredText {
    Anchored(AnchoredSegmentedText),
    Indexed(IndexedSegmentedText),
}

impl StoredText {
    pub fn resource_id(&self) -> &str {
        match self {
            Self::Anchored(text) => text.resource_id(),
            Self::Indexed(text) => text.resource_id(),
        }
    }

    pub fn segments(&self) -> &[String] {
        match self {
            Self::Anchored(text) => text.segments(),
            Self::Indexed(text) => text.segments(),
        }
    }

    pub fn as_indexed(&self) -> Option<&IndexedSegmentedText> {
        match self {
            Self::Indexed(text) => Some(text),
            Self::Anchored(_) => None,
        }
    }

    pub fn as_anchored(&self) -> Option<&AnchoredSegmentedText> {
        match self {
            Self::Anchored(text) => Some(text),
            Self::Indexed(_) => None,
        }
    }
}

impl From<IndexedSegmentedText> for StoredText {
    fn from(text: IndexedSegmentedText) -> Self {
        Self::Indexed(text)
    }
}

impl From<AnchoredSegmentedText> for StoredText {
    fn from(text: AnchoredSegmentedText) -> Self {
        Self::Anchored(text)
    }
}

/// The persisted text store: `{ "_resources": [ ... ] }`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextStore {
    #[serde(rename = "_resources")]
    resources: Vec<StoredText>,
}

impl TextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a text, returns an error if a text for the same resource already exists
    pub fn insert(&mut self, text: impl Into<StoredText>) -> Result<(), StandoffError> {
        let text = text.into();
        if self.resource(text.resource_id()).is_some() {
            return Err(StandoffError::OtherError(
                "TextStore::insert(): resource id already exists",
            ));
        }
        self.resources.push(text);
        Ok(())
    }

    /// Builder pattern variant of [`Self::insert()`]
    pub fn with_text(mut self, text: impl Into<StoredText>) -> Result<Self, StandoffError> {
        self.insert(text)?;
        Ok(self)
    }

    /// Returns the text for the given resource
    pub fn resource(&self, resource_id: &str) -> Option<&StoredText> {
        self.resources
            .iter()
            .find(|text| text.resource_id() == resource_id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StoredText> {
        self.resources.iter()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

#[sealed]
impl TypeInfo for TextStore {
    fn typeinfo() -> Type {
        Type::TextStore
    }
}

impl ToJson for TextStore {}

impl FromJson for TextStore {
    fn from_json_file(filename: &str, config: &Config) -> Result<Self, StandoffError> {
        debug(config, || format!("TextStore::from_json_file: {}", filename));
        deserialize_file(filename, config, "Reading text store from file")
    }

    fn from_json_str(string: &str, _config: &Config) -> Result<Self, StandoffError> {
        deserialize_str(string, "Reading text store from string")
    }
}
