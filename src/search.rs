/*
    Standoff Corpus Library (segmented text and standoff annotations)

        Licensed under the GNU General Public License v3
*/

//! This module implements the annotation query engine: pure functions over a slice of annotations.
//! None of them keep state; each behaves as a full scan filtered by resource, type and range.
//! The returned iterators are lazy and can be restarted by cloning them before consumption.

use std::collections::{BTreeMap, HashMap};

use crate::anchor::AnchorRef;
use crate::annotation::{Annotation, AnnotationKind};
use crate::error::StandoffError;

/// Tests whether annotation `a` overlaps with the range `begin`-`end`. This is the exact predicate:
///
/// * `begin <= a.begin < end` (left overlap, half-open), or
/// * `begin < a.end <= end` (right overlap, half-open on the other side), or
/// * `a.begin <= begin` and `a.end >= end` (full containment, closed).
///
/// Positions of different kinds (index vs anchor) never compare, so such annotations never overlap.
pub fn overlaps(a: &Annotation, begin: &AnchorRef, end: &AnchorRef) -> bool {
    (begin <= a.begin() && a.begin() < end)
        || (begin < a.end() && a.end() <= end)
        || (a.begin() <= begin && a.end() >= end)
}

/// Returns all annotations of the given type, optionally restricted to one resource
pub fn of_type<'a, 'q>(
    kind: &'q AnnotationKind,
    annotations: &'a [Annotation],
    resource_id: Option<&'q str>,
) -> impl Iterator<Item = &'a Annotation> + Clone + 'q
where
    'a: 'q,
{
    annotations.iter().filter(move |a| {
        a.kind() == kind && resource_id.map_or(true, |r| a.resource_id() == r)
    })
}

/// Returns all annotations on `resource_id` that overlap with `begin`-`end` (see [`overlaps()`])
pub fn overlapping<'a, 'q>(
    begin: &'q AnchorRef,
    end: &'q AnchorRef,
    annotations: &'a [Annotation],
    resource_id: &'q str,
) -> impl Iterator<Item = &'a Annotation> + Clone + 'q
where
    'a: 'q,
{
    annotations
        .iter()
        .filter(move |a| a.resource_id() == resource_id && overlaps(a, begin, end))
}

/// Returns all annotations of the given type on `resource_id` that overlap with `begin`-`end`
pub fn of_type_overlapping<'a, 'q>(
    kind: &'q AnnotationKind,
    begin: &'q AnchorRef,
    end: &'q AnchorRef,
    annotations: &'a [Annotation],
    resource_id: &'q str,
) -> impl Iterator<Item = &'a Annotation> + Clone + 'q
where
    'a: 'q,
{
    overlapping(begin, end, annotations, resource_id).filter(move |a| a.kind() == kind)
}

/// Returns all annotations on `resource_id` that overlap with `begin`-`end` and pass the filter
pub fn filtered_overlapping<'a, 'q>(
    filter: &'q AnnotationFilter,
    begin: &'q AnchorRef,
    end: &'q AnchorRef,
    annotations: &'a [Annotation],
    resource_id: &'q str,
) -> impl Iterator<Item = &'a Annotation> + Clone + 'q
where
    'a: 'q,
{
    overlapping(begin, end, annotations, resource_id).filter(move |a| filter.matches(a))
}

/// Returns the first annotation with the given id, or `None`
pub fn find_by_id<'a>(id: &str, annotations: &'a [Annotation]) -> Option<&'a Annotation> {
    annotations.iter().find(|a| a.id() == id)
}

/// Returns the first annotation with the given id. Fails with a `NotFoundError` if there is none;
/// whether that is fatal is up to the caller (see also [`find_by_id()`]).
pub fn by_id<'a>(id: &str, annotations: &'a [Annotation]) -> Result<&'a Annotation, StandoffError> {
    find_by_id(id, annotations)
        .ok_or_else(|| StandoffError::NotFoundError(id.to_string(), "search::by_id()"))
}

/// Groups annotations by `(resource_id, type, id)`, returning the indices of each group
/// (in order of occurrence) for groups with more than one member.
pub fn duplicates(annotations: &[Annotation]) -> BTreeMap<(String, AnnotationKind, String), Vec<usize>> {
    let mut groups: BTreeMap<(String, AnnotationKind, String), Vec<usize>> = BTreeMap::new();
    for (i, a) in annotations.iter().enumerate() {
        groups
            .entry((
                a.resource_id().to_string(),
                a.kind().clone(),
                a.id().to_string(),
            ))
            .or_default()
            .push(i);
    }
    groups.retain(|_, members| members.len() > 1);
    groups
}

/// A filter on annotations for [`filtered_overlapping()`]. A constraint that is not set does not
/// restrict anything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationFilter {
    kind: Option<AnnotationKind>,
    owner: Option<String>,
}

impl AnnotationFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, kind: impl Into<AnnotationKind>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Builds a filter from key/value pairs; recognised keys are `type` and `owner`
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self, StandoffError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut filter = Self::default();
        for (key, value) in pairs {
            match key {
                "type" => filter.kind = Some(AnnotationKind::from(value)),
                "owner" => filter.owner = Some(value.to_string()),
                other => {
                    return Err(StandoffError::InvalidFilter(
                        other.to_string(),
                        "AnnotationFilter::from_pairs()",
                    ))
                }
            }
        }
        Ok(filter)
    }

    pub fn matches(&self, annotation: &Annotation) -> bool {
        self.kind.as_ref().map_or(true, |k| annotation.kind() == k)
            && self
                .owner
                .as_deref()
                .map_or(true, |o| annotation.owner() == Some(o))
    }
}

impl TryFrom<&HashMap<String, String>> for AnnotationFilter {
    type Error = StandoffError;

    fn try_from(map: &HashMap<String, String>) -> Result<Self, Self::Error> {
        Self::from_pairs(map.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }
}

impl TryFrom<&BTreeMap<String, String>> for AnnotationFilter {
    type Error = StandoffError;

    fn try_from(map: &BTreeMap<String, String>) -> Result<Self, Self::Error> {
        Self::from_pairs(map.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }
}
