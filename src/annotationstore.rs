/*
    Standoff Corpus Library (segmented text and standoff annotations)

        Licensed under the GNU General Public License v3
*/

//! This module contains the [`AnnotationStore`], a flat collection of annotation records, serialised
//! as a plain JSON array. Queries delegate to the pure functions in [`crate::search`].

use sealed::sealed;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use crate::anchor::{Anchor, AnchorRef};
use crate::annotation::{Annotation, AnnotationKind};
use crate::config::Config;
use crate::error::StandoffError;
use crate::json::*;
use crate::search::{self, AnnotationFilter};
use crate::types::*;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationStore {
    annotations: Vec<Annotation>,
}

impl From<Vec<Annotation>> for AnnotationStore {
    fn from(annotations: Vec<Annotation>) -> Self {
        Self { annotations }
    }
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an annotation
    pub fn insert(&mut self, annotation: Annotation) {
        self.annotations.push(annotation);
    }

    /// Builder pattern variant of [`Self::insert()`]
    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.insert(annotation);
        self
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Annotation> {
        self.annotations.iter()
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn into_inner(self) -> Vec<Annotation> {
        self.annotations
    }

    /// Returns the distinct resource ids referenced by annotations in this store
    pub fn resources(&self) -> BTreeSet<&str> {
        self.annotations.iter().map(|a| a.resource_id()).collect()
    }

    /// See [`search::of_type()`]
    pub fn of_type<'a, 'q>(
        &'a self,
        kind: &'q AnnotationKind,
        resource_id: Option<&'q str>,
    ) -> impl Iterator<Item = &'a Annotation> + Clone + 'q
    where
        'a: 'q,
    {
        search::of_type(kind, &self.annotations, resource_id)
    }

    /// See [`search::overlapping()`]
    pub fn overlapping<'a, 'q>(
        &'a self,
        begin: &'q AnchorRef,
        end: &'q AnchorRef,
        resource_id: &'q str,
    ) -> impl Iterator<Item = &'a Annotation> + Clone + 'q
    where
        'a: 'q,
    {
        search::overlapping(begin, end, &self.annotations, resource_id)
    }

    /// See [`search::of_type_overlapping()`]
    pub fn of_type_overlapping<'a, 'q>(
        &'a self,
        kind: &'q AnnotationKind,
        begin: &'q AnchorRef,
        end: &'q AnchorRef,
        resource_id: &'q str,
    ) -> impl Iterator<Item = &'a Annotation> + Clone + 'q
    where
        'a: 'q,
    {
        search::of_type_overlapping(kind, begin, end, &self.annotations, resource_id)
    }

    /// See [`search::filtered_overlapping()`]
    pub fn filtered_overlapping<'a, 'q>(
        &'a self,
        filter: &'q AnnotationFilter,
        begin: &'q AnchorRef,
        end: &'q AnchorRef,
        resource_id: &'q str,
    ) -> impl Iterator<Item = &'a Annotation> + Clone + 'q
    where
        'a: 'q,
    {
        search::filtered_overlapping(filter, begin, end, &self.annotations, resource_id)
    }

    /// See [`search::by_id()`]
    pub fn by_id(&self, id: &str) -> Result<&Annotation, StandoffError> {
        search::by_id(id, &self.annotations)
    }

    /// See [`search::find_by_id()`]
    pub fn find_by_id(&self, id: &str) -> Option<&Annotation> {
        search::find_by_id(id, &self.annotations)
    }

    /// Merges annotations of the given kinds that share `(resource_id, type, id)`: the record with
    /// the minimum begin is kept (the first one on ties), its end is set to the maximum end across
    /// the group, and the others are discarded. Annotation order is otherwise preserved.
    /// Returns the number of discarded records. Running this twice changes nothing the second time.
    pub fn merge_duplicates(&mut self, kinds: &[AnnotationKind]) -> usize {
        let mut discard: BTreeSet<usize> = BTreeSet::new();
        let mut updates: Vec<(usize, AnchorRef)> = Vec::new();
        for ((_, kind, _), members) in search::duplicates(&self.annotations) {
            if !kinds.contains(&kind) {
                continue;
            }
            let mut keep = members[0];
            let mut max_end = members[0];
            for &i in members.iter().skip(1) {
                let a = &self.annotations[i];
                if a.begin().partial_cmp(self.annotations[keep].begin()) == Some(Ordering::Less) {
                    keep = i;
                }
                if a.end().partial_cmp(self.annotations[max_end].end()) == Some(Ordering::Greater)
                {
                    max_end = i;
                }
            }
            updates.push((keep, self.annotations[max_end].end().clone()));
            discard.extend(members.into_iter().filter(|&i| i != keep));
        }
        for (i, end) in updates {
            self.annotations[i].set_end(end);
        }
        if !discard.is_empty() {
            let mut i = 0;
            self.annotations.retain(|_| {
                let retain = !discard.contains(&i);
                i += 1;
                retain
            });
        }
        discard.len()
    }

    /// Applies a re-keying map (identifier to new order key, as produced by
    /// [`crate::AnchoredSegmentedText::rekey()`]) to all anchor positions.
    /// Returns the number of positions that were not found in the map.
    pub fn rekey_anchors(&mut self, map: &HashMap<String, f64>) -> usize {
        let mut missing = 0;
        let rekey = |anchorref: &AnchorRef, missing: &mut usize| -> AnchorRef {
            match anchorref {
                AnchorRef::Anchor(anchor) => match map.get(anchor.identifier()) {
                    Some(key) => AnchorRef::Anchor(Anchor::with_identifier(anchor.identifier(), *key)),
                    None => {
                        *missing += 1;
                        anchorref.clone()
                    }
                },
                AnchorRef::Index(_) => anchorref.clone(),
            }
        };
        for annotation in self.annotations.iter_mut() {
            let begin = rekey(annotation.begin(), &mut missing);
            let end = rekey(annotation.end(), &mut missing);
            annotation.set_range(begin, end);
        }
        missing
    }

    /// Converts all index positions of annotations to positions as given by `resolve`
    /// (typically the anchor at that index). Used when assembling an identity-addressed corpus.
    pub(crate) fn map_positions<F>(&mut self, mut resolve: F) -> Result<(), StandoffError>
    where
        F: FnMut(&Annotation, usize) -> Result<AnchorRef, StandoffError>,
    {
        for annotation in self.annotations.iter_mut() {
            if let (Some(begin), Some(end)) = (annotation.begin().as_index(), annotation.end().as_index()) {
                let begin = resolve(&*annotation, begin)?;
                let end = resolve(&*annotation, end)?;
                annotation.set_range(begin, end);
            }
        }
        Ok(())
    }

    #[cfg(feature = "textvalidation")]
    pub(crate) fn annotations_mut(&mut self) -> std::slice::IterMut<'_, Annotation> {
        self.annotations.iter_mut()
    }

    /// Appends all annotations from another store
    pub fn extend(&mut self, other: impl IntoIterator<Item = Annotation>) {
        self.annotations.extend(other);
    }
}

impl IntoIterator for AnnotationStore {
    type Item = Annotation;
    type IntoIter = std::vec::IntoIter<Annotation>;

    fn into_iter(self) -> Self::IntoIter {
        self.annotations.into_iter()
    }
}

#[sealed]
impl TypeInfo for AnnotationStore {
    fn typeinfo() -> Type {
        Type::AnnotationStore
    }
}

impl ToJson for AnnotationStore {}

impl FromJson for AnnotationStore {
    fn from_json_file(filename: &str, config: &Config) -> Result<Self, StandoffError> {
        debug(config, || format!("AnnotationStore::from_json_file: {}", filename));
        deserialize_file(filename, config, "Reading annotation store from file")
    }

    fn from_json_str(string: &str, _config: &Config) -> Result<Self, StandoffError> {
        deserialize_str(string, "Reading annotation store from string")
    }
}
