/*
    Standoff Corpus Library (segmented text and standoff annotations)

        Licensed under the GNU General Public License v3
*/

//! This module contains the [`Config`] structure that governs a conversion run.

use sealed::sealed;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::StandoffError;
use crate::file::*;
use crate::json::ToJson;
use crate::types::*;

/// How positions in a segmented text are addressed
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Addressing {
    /// Plain integer indices, segments are never split after creation
    #[default]
    Indexed,
    /// Every segment has an [`crate::Anchor`] that survives splits elsewhere in the text
    Anchored,
}

pub trait Configurable: Sized {
    //// Obtain the configuration
    fn config(&self) -> &Config;

    //// Obtain the configuration mutably
    fn config_mut(&mut self) -> &mut Config;

    ///Builder pattern to associate a configuration
    fn with_config(mut self, config: Config) -> Self {
        self.set_config(config);
        self
    }

    ///Setter to associate a configuration
    fn set_config(&mut self, config: Config) -> &mut Self;
}

/// This holds the configuration for a conversion run. It is not limited to configuring a single step but unifies all in a single configuration.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    /// Debug mode
    pub(crate) debug: bool,

    /// Print warnings (anomalies) to standard error output
    pub(crate) warnings: bool,

    /// The working directory
    pub(crate) workdir: Option<PathBuf>,

    /// Addressing mode of the assembled corpus text
    pub(crate) addressing: Addressing,

    /// Annotation types whose duplicates (same resource, type and id) are merged after assembly
    pub(crate) merge_types: Vec<String>,

    /// A line id seen more often than this is reported as an anomaly
    pub(crate) line_occurrence_threshold: usize,

    /// Attach provenance records to annotations emitted by the assembler
    pub(crate) provenance: bool,

    /// Produce compact JSON rather than pretty-printed JSON
    pub(crate) compact: bool,

    /// Segment that is appended for a leaf node whose text is null
    pub(crate) null_text: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: false,
            warnings: true,
            workdir: None,
            addressing: Addressing::Indexed,
            merge_types: vec!["scan".to_string(), "page".to_string()],
            line_occurrence_threshold: 1,
            provenance: false,
            compact: false,
            null_text: "\n".to_string(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable debug mode. In debug mode, verbose output will be printed to standard error output
    pub fn with_debug(mut self, value: bool) -> Self {
        self.debug = value;
        self
    }

    /// Is debug mode enabled or not?
    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Enable or disable printing of warnings. Anomalies are recorded in the report regardless.
    pub fn with_warnings(mut self, value: bool) -> Self {
        self.warnings = value;
        self
    }

    pub fn warnings(&self) -> bool {
        self.warnings
    }

    /// Sets the working directory, relative paths are resolved against it first
    pub fn with_workdir(mut self, workdir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(workdir.into());
        self
    }

    ///  Return the working directory, if set
    pub fn workdir(&self) -> Option<&Path> {
        self.workdir.as_ref().map(|x| x.as_path())
    }

    /// Sets the addressing mode of the assembled corpus text
    pub fn with_addressing(mut self, value: Addressing) -> Self {
        self.addressing = value;
        self
    }

    pub fn addressing(&self) -> Addressing {
        self.addressing
    }

    /// Sets the annotation types whose duplicates are merged after assembly
    pub fn with_merge_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.merge_types = types.into_iter().map(|s| s.into()).collect();
        self
    }

    pub fn merge_types(&self) -> &[String] {
        &self.merge_types
    }

    /// A line id occurring more than this number of times is reported as an anomaly
    pub fn with_line_occurrence_threshold(mut self, value: usize) -> Self {
        self.line_occurrence_threshold = value;
        self
    }

    pub fn line_occurrence_threshold(&self) -> usize {
        self.line_occurrence_threshold
    }

    /// Attach provenance (source file and creation time) to every assembled annotation
    pub fn with_provenance(mut self, value: bool) -> Self {
        self.provenance = value;
        self
    }

    pub fn provenance(&self) -> bool {
        self.provenance
    }

    /// Serialise JSON compactly instead of pretty-printed
    pub fn with_compact(mut self, value: bool) -> Self {
        self.compact = value;
        self
    }

    pub fn compact(&self) -> bool {
        self.compact
    }

    /// Sets the segment used for leaf nodes without text
    pub fn with_null_text(mut self, value: impl Into<String>) -> Self {
        self.null_text = value.into();
        self
    }

    pub fn null_text(&self) -> &str {
        self.null_text.as_str()
    }

    /// Loads configuration from a JSON file. Missing fields take their default values.
    pub fn from_file(filename: &str) -> Result<Self, StandoffError> {
        let reader = open_file_reader(filename, &Config::default())?;
        let deserializer = &mut serde_json::Deserializer::from_reader(reader);
        let result: Result<Self, _> = serde_path_to_error::deserialize(deserializer);
        result.map_err(|e| {
            StandoffError::JsonError(e, filename.to_string(), "Reading config from file")
        })
    }
}

#[sealed]
impl TypeInfo for Config {
    fn typeinfo() -> Type {
        Type::Config
    }
}

impl ToJson for Config {}
