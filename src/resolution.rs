/*
    Standoff Corpus Library (segmented text and standoff annotations)

        Licensed under the GNU General Public License v3
*/

//! This module traverses resolution trees. These are structured independently of the corpus
//! text: instead of carrying text, their leaves reference lines of the corpus by line id
//! (`line_ranges`). The traversal is post-order like the text traversal, but yields
//! [`PendingAnnotation`]s whose begin and end are still line ids; the
//! [`crate::CrossReferenceResolver`] rewrites those to positions in the corpus.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::annotation::AnnotationKind;
use crate::config::Config;
use crate::crossref::LineRange;
use crate::error::StandoffError;
use crate::json::*;
use crate::traversal::{metadata_of, value_as_id, TraversalConfig};
use crate::types::*;

/// An annotation whose range is expressed in line ids, awaiting resolution against a corpus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingAnnotation {
    #[serde(rename = "type")]
    pub kind: AnnotationKind,
    pub id: String,
    pub begin_line: String,
    pub end_line: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Name of the field holding the line references of a leaf in a resolution tree
const LINE_RANGES: &str = "line_ranges";

/// Traverses one resolution tree. Node types are configured with the same [`TraversalConfig`]
/// table as text traversal; hooks are not run, since resolution nodes have no position yet.
pub struct ResolutionTraversal<'c> {
    types: &'c TraversalConfig,
    config: &'c Config,
    pending: Vec<PendingAnnotation>,
}

impl<'c> ResolutionTraversal<'c> {
    pub fn new(types: &'c TraversalConfig, config: &'c Config) -> Self {
        Self {
            types,
            config,
            pending: Vec::new(),
        }
    }

    /// Traverses the tree rooted at `root` (of type `root_type`). Nodes that (transitively)
    /// reference no lines at all yield no pending annotation.
    pub fn run(
        mut self,
        root: &Value,
        root_type: &str,
    ) -> Result<Vec<PendingAnnotation>, StandoffError> {
        self.traverse(root, root_type)?;
        debug(self.config, || {
            format!(
                "ResolutionTraversal::run: {} pending annotations",
                self.pending.len()
            )
        });
        Ok(self.pending)
    }

    /// Reads a resolution tree from a JSON file and traverses it
    pub fn run_file(
        self,
        filename: &str,
        root_type: &str,
    ) -> Result<Vec<PendingAnnotation>, StandoffError> {
        let root: Value = deserialize_file(filename, self.config, "Reading resolution tree")?;
        self.run(&root, root_type)
    }

    /// Returns the first and last line id covered by the node
    fn traverse(
        &mut self,
        node: &Value,
        node_type: &str,
    ) -> Result<Option<(String, String)>, StandoffError> {
        let types = self.types;
        let typeconfig = types.get(node_type)?;
        let obj = node.as_object().ok_or_else(|| {
            StandoffError::StructuralMismatch(
                format!("object of type '{}'", node_type),
                None,
                "ResolutionTraversal::traverse()",
            )
        })?;
        let id = obj.get("id").and_then(value_as_id).ok_or_else(|| {
            StandoffError::StructuralMismatch(
                "id".to_string(),
                None,
                "ResolutionTraversal::traverse()",
            )
        })?;

        let lines = match (typeconfig.child_key(), typeconfig.child_type()) {
            (Some(child_key), Some(child_type)) => {
                let children = obj
                    .get(child_key)
                    .and_then(|children| children.as_array())
                    .ok_or_else(|| {
                        StandoffError::StructuralMismatch(
                            child_key.to_string(),
                            Some(id.clone()),
                            "ResolutionTraversal::traverse()",
                        )
                    })?;
                let mut lines: Option<(String, String)> = None;
                for child in children {
                    if let Some((first, last)) = self.traverse(child, child_type)? {
                        lines = match lines {
                            None => Some((first, last)),
                            Some((begin, _)) => Some((begin, last)),
                        };
                    }
                }
                lines
            }
            (None, _) => {
                let ranges: Vec<LineRange> = match obj.get(LINE_RANGES) {
                    None | Some(Value::Null) => Vec::new(),
                    Some(value) => serde_json::from_value(value.clone()).map_err(|_| {
                        StandoffError::StructuralMismatch(
                            LINE_RANGES.to_string(),
                            Some(id.clone()),
                            "ResolutionTraversal::traverse()",
                        )
                    })?,
                };
                match (ranges.first(), ranges.last()) {
                    (Some(first), Some(last)) => {
                        Some((first.line_id.clone(), last.line_id.clone()))
                    }
                    _ => None,
                }
            }
            (Some(_), None) => {
                return Err(StandoffError::StructuralMismatch(
                    format!("child_type of node type '{}'", node_type),
                    Some(id),
                    "ResolutionTraversal::traverse()",
                ))
            }
        };

        let (begin_line, end_line) = match lines {
            Some(lines) => lines,
            None => {
                debug(self.config, || {
                    format!("ResolutionTraversal: {} {} references no lines", node_type, id)
                });
                return Ok(None);
            }
        };

        let metadata = metadata_of(obj, &id)?;
        let mut extra = BTreeMap::new();
        for field in typeconfig.extra_fields() {
            let value = obj.get(field).ok_or_else(|| {
                StandoffError::StructuralMismatch(
                    field.clone(),
                    Some(id.clone()),
                    "ResolutionTraversal::traverse()",
                )
            })?;
            extra.insert(field.clone(), value.clone());
        }
        self.pending.push(PendingAnnotation {
            kind: AnnotationKind::from(node_type),
            id,
            begin_line: begin_line.clone(),
            end_line: end_line.clone(),
            metadata,
            extra,
        });
        Ok(Some((begin_line, end_line)))
    }
}
