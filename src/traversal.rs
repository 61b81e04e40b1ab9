/*
    Standoff Corpus Library (segmented text and standoff annotations)

        Licensed under the GNU General Public License v3
*/

//! This module contains the traversal engine, which flattens one hierarchical source document into
//! a segmented text plus annotations.
//!
//! The traversal is depth-first and post-order: a container's span is only known once all of its
//! descendants have contributed their text, so its annotation is emitted after theirs. What counts
//! as a child, and which extra fields are carried over, is declared per node type in a
//! [`TraversalConfig`].

use sealed::sealed;
use serde::Deserialize;
use serde_json::{Map, Value};
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::fmt;

use crate::annotation::{Annotation, AnnotationKind};
use crate::config::Config;
use crate::error::StandoffError;
use crate::json::*;
use crate::resources::IndexedSegmentedText;
use crate::text::SegmentedText;
use crate::types::*;

/// A side effect attached to a node type. It runs right after the annotation for a node has been
/// emitted, with the node's (inclusive) begin and end index, before control returns to the parent.
pub trait NodeHook: fmt::Debug {
    fn apply(
        &self,
        node: &Value,
        begin: usize,
        end: usize,
        context: &TraversalContext,
        annotations: &mut Vec<Annotation>,
    ) -> Result<(), StandoffError>;
}

/// Emits synthetic `scan` and `page` annotations spanning a node, using identifiers found in the
/// node's metadata. The same scan or page is typically found via several text regions; the
/// resulting duplicates are merged after assembly.
#[derive(Debug, Clone)]
pub struct ScanPageHook {
    scan_field: String,
    page_field: String,
    link_field: String,
}

impl Default for ScanPageHook {
    fn default() -> Self {
        Self {
            scan_field: "scan_id".to_string(),
            page_field: "page_id".to_string(),
            link_field: "iiif_url".to_string(),
        }
    }
}

impl ScanPageHook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the metadata fields holding the scan id, the page id and the image link respectively
    pub fn with_fields(
        mut self,
        scan_field: impl Into<String>,
        page_field: impl Into<String>,
        link_field: impl Into<String>,
    ) -> Self {
        self.scan_field = scan_field.into();
        self.page_field = page_field.into();
        self.link_field = link_field.into();
        self
    }
}

impl NodeHook for ScanPageHook {
    fn apply(
        &self,
        node: &Value,
        begin: usize,
        end: usize,
        context: &TraversalContext,
        annotations: &mut Vec<Annotation>,
    ) -> Result<(), StandoffError> {
        let metadata = match node.get("metadata").and_then(|m| m.as_object()) {
            Some(metadata) => metadata,
            None => return Ok(()),
        };
        let link = metadata.get(&self.link_field).and_then(|v| v.as_str());
        for (field, kind) in [
            (&self.scan_field, AnnotationKind::Scan),
            (&self.page_field, AnnotationKind::Page),
        ] {
            if let Some(id) = metadata.get(field).and_then(value_as_id) {
                let mut builder = Annotation::builder(kind, id)
                    .with_resource(context.resource_id())
                    .with_range(begin, end);
                if let Some(link) = link {
                    builder = builder.with_region_link(link);
                }
                annotations.push(builder.build()?);
            }
        }
        Ok(())
    }
}

/// Hooks that can be named in a declarative (JSON) traversal configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookKind {
    ScanPage,
}

impl HookKind {
    fn instantiate(&self) -> Box<dyn NodeHook> {
        match self {
            Self::ScanPage => Box::new(ScanPageHook::default()),
        }
    }
}

/// Declares how nodes of one type are traversed
#[derive(Debug, Default)]
pub struct NodeTypeConfig {
    child_key: Option<String>,
    child_type: Option<String>,
    extra_fields: Vec<String>,
    hook: Option<Box<dyn NodeHook>>,
}

impl NodeTypeConfig {
    /// A leaf type: nodes carry `text` and have no children
    pub fn leaf() -> Self {
        Self::default()
    }

    /// A container type: children are found under `child_key` and are of type `child_type`
    pub fn container(child_key: impl Into<String>, child_type: impl Into<String>) -> Self {
        Self {
            child_key: Some(child_key.into()),
            child_type: Some(child_type.into()),
            ..Self::default()
        }
    }

    /// Adds a field that is copied from the node into its annotation; it must be present on every node
    pub fn with_extra_field(mut self, field: impl Into<String>) -> Self {
        self.extra_fields.push(field.into());
        self
    }

    pub fn with_hook(mut self, hook: Box<dyn NodeHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    pub fn child_key(&self) -> Option<&str> {
        self.child_key.as_deref()
    }

    pub fn child_type(&self) -> Option<&str> {
        self.child_type.as_deref()
    }

    pub fn extra_fields(&self) -> &[String] {
        &self.extra_fields
    }

    pub fn is_leaf(&self) -> bool {
        self.child_key.is_none()
    }
}

/// Serialised form of a [`NodeTypeConfig`]
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NodeTypeSpec {
    #[serde(default)]
    child_key: Option<String>,
    #[serde(default)]
    child_type: Option<String>,
    #[serde(default)]
    extra_fields: Vec<String>,
    #[serde(default)]
    hook: Option<HookKind>,
}

impl From<NodeTypeSpec> for NodeTypeConfig {
    fn from(spec: NodeTypeSpec) -> Self {
        Self {
            child_key: spec.child_key,
            child_type: spec.child_type,
            extra_fields: spec.extra_fields,
            hook: spec.hook.map(|hook| hook.instantiate()),
        }
    }
}

/// The per-node-type configuration table, keyed by node type name. The node type name is also the
/// type of the annotation emitted for such a node.
#[derive(Debug, Default)]
pub struct TraversalConfig {
    types: BTreeMap<String, NodeTypeConfig>,
}

impl TraversalConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the configuration for a node type
    pub fn with_type(mut self, node_type: impl Into<String>, config: NodeTypeConfig) -> Self {
        self.insert(node_type, config);
        self
    }

    pub fn insert(&mut self, node_type: impl Into<String>, config: NodeTypeConfig) {
        self.types.insert(node_type.into(), config);
    }

    /// Installs a hook on an already configured node type
    pub fn set_hook(
        &mut self,
        node_type: &str,
        hook: Box<dyn NodeHook>,
    ) -> Result<(), StandoffError> {
        let config = self.types.get_mut(node_type).ok_or_else(|| {
            StandoffError::LookupError(
                format!("node type {}", node_type),
                "TraversalConfig::set_hook()",
            )
        })?;
        config.hook = Some(hook);
        Ok(())
    }

    /// Returns the configuration for a node type. A type missing from the table means the document
    /// does not match the configuration.
    pub fn get(&self, node_type: &str) -> Result<&NodeTypeConfig, StandoffError> {
        self.types.get(node_type).ok_or_else(|| {
            StandoffError::StructuralMismatch(
                format!("configuration for node type '{}'", node_type),
                None,
                "TraversalConfig::get()",
            )
        })
    }

    /// Checks that every container names a child type that is itself configured
    pub fn validate(&self) -> Result<(), StandoffError> {
        for (node_type, config) in self.types.iter() {
            match (&config.child_key, &config.child_type) {
                (Some(_), Some(child_type)) => {
                    self.get(child_type)?;
                }
                (None, None) => {}
                _ => {
                    return Err(StandoffError::StructuralMismatch(
                        format!("child_key/child_type of node type '{}'", node_type),
                        None,
                        "TraversalConfig::validate()",
                    ))
                }
            }
        }
        Ok(())
    }

    fn from_specs(specs: BTreeMap<String, NodeTypeSpec>) -> Result<Self, StandoffError> {
        let config = Self {
            types: specs
                .into_iter()
                .map(|(node_type, spec)| (node_type, spec.into()))
                .collect(),
        };
        config.validate()?;
        Ok(config)
    }
}

#[sealed]
impl TypeInfo for TraversalConfig {
    fn typeinfo() -> Type {
        Type::TraversalConfig
    }
}

impl FromJson for TraversalConfig {
    fn from_json_file(filename: &str, config: &Config) -> Result<Self, StandoffError> {
        debug(config, || format!("TraversalConfig::from_json_file: {}", filename));
        Self::from_specs(deserialize_file(
            filename,
            config,
            "Reading traversal configuration from file",
        )?)
    }

    fn from_json_str(string: &str, _config: &Config) -> Result<Self, StandoffError> {
        Self::from_specs(deserialize_str(
            string,
            "Reading traversal configuration from string",
        )?)
    }
}

/// State threaded through a traversal: the resource being built and, per node type, the stack of
/// begin indices of the nodes of that type that are currently open (entered but not yet left).
#[derive(Debug, Default)]
pub struct TraversalContext {
    resource_id: String,
    open: BTreeMap<String, SmallVec<[usize; 4]>>,
    depth: usize,
}

impl TraversalContext {
    pub fn new(resource_id: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
            ..Self::default()
        }
    }

    pub fn resource_id(&self) -> &str {
        self.resource_id.as_str()
    }

    /// Current nesting depth (the root is at depth 1 while it is being traversed)
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Begin index of the innermost open node of the given type
    pub fn open_begin(&self, node_type: &str) -> Option<usize> {
        self.open
            .get(node_type)
            .and_then(|stack| stack.last().copied())
    }

    /// Number of open nodes of the given type
    pub fn open_count(&self, node_type: &str) -> usize {
        self.open.get(node_type).map(|stack| stack.len()).unwrap_or(0)
    }

    fn enter(&mut self, node_type: &str, begin: usize) {
        self.open
            .entry(node_type.to_string())
            .or_default()
            .push(begin);
        self.depth += 1;
    }

    fn leave(&mut self, node_type: &str) {
        if let Some(stack) = self.open.get_mut(node_type) {
            stack.pop();
        }
        self.depth -= 1;
    }
}

/// Runs over one source document, producing a fresh index-addressed text and its annotations.
pub struct Traversal<'c> {
    types: &'c TraversalConfig,
    config: &'c Config,
    text: IndexedSegmentedText,
    annotations: Vec<Annotation>,
    context: TraversalContext,
}

impl<'c> Traversal<'c> {
    pub fn new(
        types: &'c TraversalConfig,
        config: &'c Config,
        resource_id: impl Into<String>,
    ) -> Self {
        let resource_id = resource_id.into();
        Self {
            types,
            config,
            text: IndexedSegmentedText::new(resource_id.clone()),
            annotations: Vec::new(),
            context: TraversalContext::new(resource_id),
        }
    }

    /// Traverses the document rooted at `root` (of type `root_type`) and returns the resulting text
    /// and annotations, with positions counted from zero.
    pub fn run(
        mut self,
        root: &Value,
        root_type: &str,
    ) -> Result<(IndexedSegmentedText, Vec<Annotation>), StandoffError> {
        self.traverse(root, root_type)?;
        debug(self.config, || {
            format!(
                "Traversal::run: {} segments, {} annotations",
                self.text.len(),
                self.annotations.len()
            )
        });
        Ok((self.text, self.annotations))
    }

    fn traverse(&mut self, node: &Value, node_type: &str) -> Result<(), StandoffError> {
        let types = self.types;
        let typeconfig = types.get(node_type)?;
        let obj = node.as_object().ok_or_else(|| {
            StandoffError::StructuralMismatch(
                format!("object of type '{}'", node_type),
                None,
                "Traversal::traverse()",
            )
        })?;
        let id = obj.get("id").and_then(value_as_id).ok_or_else(|| {
            StandoffError::StructuralMismatch("id".to_string(), None, "Traversal::traverse()")
        })?;

        let begin = self.text.len();
        self.context.enter(node_type, begin);

        let end = match (typeconfig.child_key(), typeconfig.child_type()) {
            (Some(child_key), Some(child_type)) => {
                let children = obj
                    .get(child_key)
                    .and_then(|children| children.as_array())
                    .ok_or_else(|| {
                        StandoffError::StructuralMismatch(
                            child_key.to_string(),
                            Some(id.clone()),
                            "Traversal::traverse()",
                        )
                    })?;
                for child in children {
                    self.traverse(child, child_type)?;
                }
                if self.text.len() == begin {
                    debug(self.config, || {
                        format!("Traversal: {} {} has no text, no annotation", node_type, id)
                    });
                    self.context.leave(node_type);
                    return Ok(());
                }
                self.text.len() - 1
            }
            (None, _) => {
                match obj.get("text") {
                    Some(Value::String(text)) => self.text.append(text.as_str()),
                    None | Some(Value::Null) => self.text.append(self.config.null_text()),
                    Some(_) => {
                        return Err(StandoffError::StructuralMismatch(
                            "text".to_string(),
                            Some(id),
                            "Traversal::traverse()",
                        ))
                    }
                }
                // the index at the start of the leaf's own append
                begin
            }
            (Some(_), None) => {
                return Err(StandoffError::StructuralMismatch(
                    format!("child_type of node type '{}'", node_type),
                    Some(id),
                    "Traversal::traverse()",
                ))
            }
        };

        let metadata = metadata_of(obj, &id)?;
        let mut builder = Annotation::builder(node_type, id.as_str())
            .with_resource(self.context.resource_id())
            .with_range(begin, end)
            .with_metadata(metadata);
        for field in typeconfig.extra_fields() {
            let value = obj.get(field).ok_or_else(|| {
                StandoffError::StructuralMismatch(
                    field.clone(),
                    Some(id.clone()),
                    "Traversal::traverse()",
                )
            })?;
            builder = builder.with_extra(field.as_str(), value.clone());
        }
        self.annotations.push(builder.build()?);

        if let Some(hook) = typeconfig.hook.as_ref() {
            hook.apply(node, begin, end, &self.context, &mut self.annotations)?;
        }

        self.context.leave(node_type);
        Ok(())
    }
}

/// Returns the metadata mapping of a node; `null` or absent metadata yields `None`
pub(crate) fn metadata_of(
    obj: &Map<String, Value>,
    id: &str,
) -> Result<Option<Map<String, Value>>, StandoffError> {
    match obj.get("metadata") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(metadata)) => Ok(Some(metadata.clone())),
        Some(_) => Err(StandoffError::StructuralMismatch(
            "metadata".to_string(),
            Some(id.to_string()),
            "Traversal::traverse()",
        )),
    }
}

/// Identifiers may be strings or numbers in source documents
pub(crate) fn value_as_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
