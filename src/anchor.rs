/*
    Standoff Corpus Library (segmented text and standoff annotations)

        Licensed under the GNU General Public License v3
*/

//! This module defines [`Anchor`], an orderable position token that addresses a segment independent
//! of its current array index, and [`AnchorRef`], the position an annotation refers to.

use datasize::DataSize;
use nanoid::nanoid;
use serde::{Deserialize, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

use crate::error::StandoffError;

/// An anchor identifies a segment in an [`crate::AnchoredSegmentedText`].
///
/// Ordering and equality are determined by the sequence number **only**, the identifier does not
/// take part in comparison. This allows a new anchor to be interposed between two existing ones
/// (with a sequence number halfway between theirs) without renumbering anything else.
/// Anchors are immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, DataSize)]
pub struct Anchor {
    identifier: String,
    #[serde(serialize_with = "serialize_order_key")]
    sequence_number: f64,
}

/// Largest integer an `f64` holds exactly
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Integral order keys (those of appended segments) are written as JSON integers
fn serialize_order_key<S>(key: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if key.fract() == 0.0 && *key >= 0.0 && *key <= MAX_EXACT_INTEGER {
        serializer.serialize_u64(*key as u64)
    } else {
        serializer.serialize_f64(*key)
    }
}

impl Anchor {
    /// Creates a new anchor with a freshly generated random identifier
    pub fn new(sequence_number: f64) -> Self {
        Self {
            identifier: nanoid!(),
            sequence_number,
        }
    }

    /// Creates an anchor with a known identifier, used when reconstructing from a serialised form
    pub fn with_identifier(identifier: impl Into<String>, sequence_number: f64) -> Self {
        Self {
            identifier: identifier.into(),
            sequence_number,
        }
    }

    /// Returns the opaque identity of this anchor
    pub fn identifier(&self) -> &str {
        self.identifier.as_str()
    }

    /// Returns the order key
    pub fn sequence_number(&self) -> f64 {
        self.sequence_number
    }

    /// Tests identity (rather than position, which is what `==` tests)
    pub fn same_identity(&self, other: &Anchor) -> bool {
        self.identifier == other.identifier
    }

    /// Creates a new anchor that sorts strictly between `self` and an anchor with sequence number `upper`.
    /// Fails if no such key exists, either because the bounds are not ordered or because float precision is exhausted.
    pub(crate) fn interpolate(&self, upper: f64) -> Result<Anchor, StandoffError> {
        let key = (self.sequence_number + upper) / 2.0;
        if self.sequence_number < key && key < upper {
            Ok(Anchor::new(key))
        } else {
            Err(StandoffError::OrderingError(
                format!(
                    "no order key strictly between {} and {}",
                    self.sequence_number, upper
                ),
                "Anchor::interpolate()",
            ))
        }
    }

    /// Returns a copy carrying a different sequence number, used in re-keying
    pub(crate) fn rekeyed(&self, sequence_number: f64) -> Self {
        Self {
            identifier: self.identifier.clone(),
            sequence_number,
        }
    }
}

impl PartialEq for Anchor {
    fn eq(&self, other: &Self) -> bool {
        self.sequence_number == other.sequence_number
    }
}

impl PartialOrd for Anchor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.sequence_number.partial_cmp(&other.sequence_number)
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}@{}", self.identifier, self.sequence_number)
    }
}

/// A position as referenced from an annotation: a plain index for index-addressed resources,
/// or an anchor for identity-addressed ones. Serialised as a bare integer or as an
/// `{identifier, sequence_number}` object respectively.
///
/// Positions of different kinds are incomparable: all comparison operators return false.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnchorRef {
    Index(usize),
    Anchor(Anchor),
}

impl AnchorRef {
    /// Returns the index, if this is an index position
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Self::Index(index) => Some(*index),
            Self::Anchor(_) => None,
        }
    }

    /// Returns the anchor, if this is an anchor position
    pub fn as_anchor(&self) -> Option<&Anchor> {
        match self {
            Self::Index(_) => None,
            Self::Anchor(anchor) => Some(anchor),
        }
    }

    /// Shifts an index position by `offset`. Anchor positions are left as they are,
    /// as their order keys are already global.
    pub fn rebase(&self, offset: usize) -> Self {
        match self {
            Self::Index(index) => Self::Index(index + offset),
            Self::Anchor(anchor) => Self::Anchor(anchor.clone()),
        }
    }
}

impl PartialEq for AnchorRef {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Index(a), Self::Index(b)) => a == b,
            (Self::Anchor(a), Self::Anchor(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialOrd for AnchorRef {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Index(a), Self::Index(b)) => a.partial_cmp(b),
            (Self::Anchor(a), Self::Anchor(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl From<usize> for AnchorRef {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<Anchor> for AnchorRef {
    fn from(anchor: Anchor) -> Self {
        Self::Anchor(anchor)
    }
}

impl From<&Anchor> for AnchorRef {
    fn from(anchor: &Anchor) -> Self {
        Self::Anchor(anchor.clone())
    }
}

impl fmt::Display for AnchorRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "{}", index),
            Self::Anchor(anchor) => write!(f, "{}", anchor),
        }
    }
}
