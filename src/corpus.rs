/*
    Standoff Corpus Library (segmented text and standoff annotations)

        Licensed under the GNU General Public License v3
*/

//! This module contains the corpus assembler. A [`CorpusBuilder`] owns the growing corpus text and
//! annotation list for one run and drives a fresh [`Traversal`] over each source document, in the
//! order the documents are supplied. Per-document positions are rebased onto the corpus before
//! the results are appended, so all documents share one position space.
//!
//! Documents must be added in true document order; the builder never reorders them.

use regex::Regex;
use serde_json::Value;
use std::path::Path;

use crate::annotation::{AnnotationKind, Provenance};
use crate::annotationstore::AnnotationStore;
use crate::config::{Addressing, Config, Configurable};
use crate::error::StandoffError;
use crate::file::discover_files;
use crate::json::*;
use crate::report::{Anomaly, AnomalyReport};
use crate::resources::{IndexedSegmentedText, StoredText, TextStore};
use crate::text::SegmentedText;
use crate::traversal::{Traversal, TraversalConfig};
use crate::types::*;

pub struct CorpusBuilder {
    config: Config,
    types: TraversalConfig,
    root_type: String,
    text: IndexedSegmentedText,
    annotations: AnnotationStore,
    report: AnomalyReport,
    documents: usize,
}

impl Configurable for CorpusBuilder {
    fn config(&self) -> &Config {
        &self.config
    }

    fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    fn set_config(&mut self, config: Config) -> &mut Self {
        self.config = config;
        self
    }
}

impl CorpusBuilder {
    /// Creates a builder for the corpus text `resource_id`. Every source document is traversed
    /// starting from a root node of type `root_type`, as configured in `types`.
    pub fn new(
        resource_id: impl Into<String>,
        types: TraversalConfig,
        root_type: impl Into<String>,
    ) -> Self {
        Self {
            config: Config::default(),
            types,
            root_type: root_type.into(),
            text: IndexedSegmentedText::new(resource_id),
            annotations: AnnotationStore::new(),
            report: AnomalyReport::new(),
            documents: 0,
        }
    }

    pub fn resource_id(&self) -> &str {
        self.text.resource_id()
    }

    /// The corpus text as assembled so far
    pub fn text(&self) -> &IndexedSegmentedText {
        &self.text
    }

    /// The annotations as assembled so far (positions are indices into [`Self::text()`])
    pub fn annotations(&self) -> &AnnotationStore {
        &self.annotations
    }

    pub fn report(&self) -> &AnomalyReport {
        &self.report
    }

    /// Number of documents added so far
    pub fn documents(&self) -> usize {
        self.documents
    }

    /// Traverses one source document and appends its text and annotations to the corpus.
    /// `source` names where the document came from, it is used for provenance records.
    ///
    /// If the document is malformed, an error is returned and the corpus is left untouched.
    pub fn add_document(&mut self, root: &Value, source: Option<&str>) -> Result<(), StandoffError> {
        let (text, annotations) = Traversal::new(&self.types, &self.config, self.text.resource_id())
            .run(root, &self.root_type)?;
        let offset = self.text.len();
        debug(&self.config, || {
            format!(
                "CorpusBuilder.add_document: {} segments, {} annotations, offset {}",
                text.len(),
                annotations.len(),
                offset
            )
        });
        let provenance = match (self.config.provenance(), source) {
            (true, Some(source)) => Some(Provenance::new(source)),
            _ => None,
        };
        self.annotations
            .extend(annotations.into_iter().map(|mut annotation| {
                annotation.rebase(offset);
                if let Some(provenance) = provenance.as_ref() {
                    annotation.set_provenance(provenance.clone());
                }
                annotation
            }));
        self.text.extend_grid(text);
        self.documents += 1;
        Ok(())
    }

    /// Reads a source document from a JSON file and adds it, see [`Self::add_document()`]
    pub fn add_file(&mut self, filename: &str) -> Result<(), StandoffError> {
        debug(&self.config, || format!("CorpusBuilder.add_file: {}", filename));
        let root: Value = deserialize_file(filename, &self.config, "Reading source document")?;
        self.add_document(&root, Some(filename))
    }

    /// Adds files strictly in the order given. Stops at the first file that fails; all files
    /// before it remain part of the corpus.
    pub fn add_files<I, P>(&mut self, filenames: I) -> Result<(), StandoffError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        for filename in filenames {
            let filename = filename.as_ref().to_string_lossy();
            self.add_file(&filename)?;
        }
        Ok(())
    }

    /// Adds all files in `dir` whose name matches `pattern`, in lexical order of their names
    pub fn add_directory(
        &mut self,
        dir: impl AsRef<Path>,
        pattern: &Regex,
    ) -> Result<(), StandoffError> {
        let files = discover_files(dir, pattern, &self.config)?;
        self.add_files(files)
    }

    /// Completes the assembly: merges duplicate annotations of the configured types and, in
    /// anchored addressing mode, converts the corpus text and all annotation positions to anchors.
    pub fn finish(mut self) -> Result<Corpus, StandoffError> {
        let kinds: Vec<AnnotationKind> = self
            .config
            .merge_types()
            .iter()
            .map(|t| AnnotationKind::from(t.as_str()))
            .collect();
        for kind in kinds {
            let discarded = self.annotations.merge_duplicates(std::slice::from_ref(&kind));
            if discarded > 0 {
                warn(&self.config, || {
                    format!("merged duplicate {} annotations, {} discarded", kind, discarded)
                });
                self.report.record(Anomaly::MergedDuplicates {
                    annotation_type: kind.to_string(),
                    discarded,
                });
            }
        }

        let text = match self.config.addressing() {
            Addressing::Indexed => StoredText::from(self.text),
            Addressing::Anchored => {
                let text = self.text.into_anchored();
                self.annotations
                    .map_positions(|_, index| text.position_at(index))?;
                StoredText::from(text)
            }
        };
        debug(&self.config, || {
            format!(
                "CorpusBuilder.finish: {} documents, {} segments, {} annotations",
                self.documents,
                text.segments().len(),
                self.annotations.len()
            )
        });
        Ok(Corpus {
            config: self.config,
            text,
            annotations: self.annotations,
            report: self.report,
        })
    }
}

/// A fully assembled corpus: one text, its annotations and the anomalies met along the way
#[derive(Debug)]
pub struct Corpus {
    config: Config,
    text: StoredText,
    annotations: AnnotationStore,
    report: AnomalyReport,
}

impl Configurable for Corpus {
    fn config(&self) -> &Config {
        &self.config
    }

    fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    fn set_config(&mut self, config: Config) -> &mut Self {
        self.config = config;
        self
    }
}

impl Corpus {
    pub fn text(&self) -> &StoredText {
        &self.text
    }

    pub fn annotations(&self) -> &AnnotationStore {
        &self.annotations
    }

    /// Mutable access to the annotations, for post-processing steps such as cross-reference resolution
    pub fn annotations_mut(&mut self) -> &mut AnnotationStore {
        &mut self.annotations
    }

    pub fn report(&self) -> &AnomalyReport {
        &self.report
    }

    pub fn report_mut(&mut self) -> &mut AnomalyReport {
        &mut self.report
    }

    /// Returns a text store holding (a copy of) the corpus text
    pub fn text_store(&self) -> Result<TextStore, StandoffError> {
        TextStore::new().with_text(self.text.clone())
    }

    /// Writes the text store and the annotation store, the two persisted outputs of a run
    pub fn to_json_files(&self, text_filename: &str, annotations_filename: &str) -> Result<(), StandoffError> {
        self.text_store()?.to_json_file(text_filename, &self.config)?;
        self.annotations
            .to_json_file(annotations_filename, &self.config)
    }

    pub fn into_parts(self) -> (StoredText, AnnotationStore, AnomalyReport) {
        (self.text, self.annotations, self.report)
    }
}
