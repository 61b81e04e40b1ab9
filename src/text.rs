/*
    Standoff Corpus Library (segmented text and standoff annotations)

        Licensed under the GNU General Public License v3
*/

//! This module defines and partially implements the [`SegmentedText`] trait, shared by both
//! addressing variants ([`crate::IndexedSegmentedText`] and [`crate::AnchoredSegmentedText`]).

use datasize::{data_size, DataSize};
use serde::{Deserialize, Serialize};

use crate::anchor::{Anchor, AnchorRef};
use crate::error::StandoffError;
use crate::types::*;

/// Describes how the text was cut into segments. Carried along verbatim for downstream consumers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, DataSize)]
#[serde(default)]
pub struct TextGridSpec {
    pub excluded_chars: Vec<String>,
    pub tokenizer: Option<String>,
}

/// Any way of referring to a segment: by index, by anchor, or by the bare identity of an anchor.
#[derive(Debug, Clone, Copy)]
pub enum Position<'a> {
    Index(usize),
    Anchor(&'a Anchor),
    Identifier(&'a str),
}

impl<'a> From<usize> for Position<'a> {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl<'a> From<&'a Anchor> for Position<'a> {
    fn from(anchor: &'a Anchor) -> Self {
        Self::Anchor(anchor)
    }
}

impl<'a> From<&'a str> for Position<'a> {
    fn from(identifier: &'a str) -> Self {
        Self::Identifier(identifier)
    }
}

impl<'a> From<&'a AnchorRef> for Position<'a> {
    fn from(anchorref: &'a AnchorRef) -> Self {
        match anchorref {
            AnchorRef::Index(index) => Self::Index(*index),
            AnchorRef::Anchor(anchor) => Self::Anchor(anchor),
        }
    }
}

/// This trait provides the operations common to both addressing variants of a segmented text.
/// Growth only happens at the end (`append`, `extend_segments`, `extend_grid`); splitting is
/// specific to [`crate::AnchoredSegmentedText`].
pub trait SegmentedText: TypeInfo + Sized {
    /// Returns the identifier of the resource this text belongs to
    fn resource_id(&self) -> &str;

    /// Returns the grid specification
    fn grid_spec(&self) -> &TextGridSpec;

    /// Returns all segments in order
    fn segments(&self) -> &[String];

    /// Adds one segment at the end
    fn append(&mut self, segment: impl Into<String>);

    /// Concatenates another text of the same addressing mode verbatim (including its anchors,
    /// if any). The caller is responsible for only ever extending at the logical end of a growing corpus.
    fn extend_grid(&mut self, other: Self);

    /// Resolves any position to an index in the segment array
    fn index_of(&self, position: Position) -> Result<usize, StandoffError>;

    /// Returns the position (as referenced from annotations) for a given index
    fn position_at(&self, index: usize) -> Result<AnchorRef, StandoffError>;

    /// Returns a new text holding the inclusive range `from..=to`
    fn slice_grid<'a>(
        &self,
        from: impl Into<Position<'a>>,
        to: impl Into<Position<'a>>,
    ) -> Result<Self, StandoffError>;

    /// Returns the number of segments
    fn len(&self) -> usize {
        self.segments().len()
    }

    fn is_empty(&self) -> bool {
        self.segments().is_empty()
    }

    /// Appends each of the segments individually (each receiving a fresh anchor, if applicable)
    fn extend_segments<I, S>(&mut self, segments: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for segment in segments {
            self.append(segment);
        }
    }

    /// Returns the segment at the given position
    fn element_at<'a>(&self, position: impl Into<Position<'a>>) -> Result<&str, StandoffError> {
        let index = self.index_of(position.into())?;
        Ok(self.segments()[index].as_str())
    }

    /// Returns the segments in the inclusive range `from..=to`
    fn slice<'a>(
        &self,
        from: impl Into<Position<'a>>,
        to: impl Into<Position<'a>>,
    ) -> Result<&[String], StandoffError> {
        let (begin, end) = self.index_range(from.into(), to.into())?;
        Ok(&self.segments()[begin..=end])
    }

    /// Returns the text in the inclusive range `from..=to`, segments joined by `delimiter`
    fn text_between<'a>(
        &self,
        from: impl Into<Position<'a>>,
        to: impl Into<Position<'a>>,
        delimiter: &str,
    ) -> Result<String, StandoffError> {
        Ok(self.slice(from, to)?.join(delimiter))
    }

    /// Resolves two positions to an ordered, inclusive index range
    fn index_range(&self, from: Position, to: Position) -> Result<(usize, usize), StandoffError> {
        let begin = self.index_of(from)?;
        let end = self.index_of(to)?;
        if begin > end {
            Err(StandoffError::LookupError(
                format!("range {}..={} (begin after end)", begin, end),
                "SegmentedText::index_range()",
            ))
        } else {
            Ok((begin, end))
        }
    }

    /// Iterate over all segments
    fn iter(&self) -> std::slice::Iter<'_, String> {
        self.segments().iter()
    }

    /// Returns the estimated memory footprint in bytes
    fn meminfo(&self) -> usize
    where
        Self: DataSize,
    {
        std::mem::size_of::<Self>() + data_size(self)
    }
}

pub(crate) fn out_of_range(index: usize, len: usize, context: &'static str) -> StandoffError {
    StandoffError::LookupError(
        format!("index {} (text has {} segments)", index, len),
        context,
    )
}
