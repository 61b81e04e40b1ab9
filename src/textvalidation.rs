/*
    Standoff Corpus Library (segmented text and standoff annotations)

        Licensed under the GNU General Public License v3
*/

//! This module implements text validation: annotations can be stamped with a checksum of the
//! text they cover, so that a later consumer can verify that the text store and the annotation
//! store still agree (e.g. after segments were split or files were regenerated).
//!
//! This module is an extra feature and may be enabled/disabled at compile time.

use base16ct;
use serde_json::Value;
use sha1::{Digest, Sha1};

use crate::annotation::Annotation;
use crate::annotationstore::AnnotationStore;
use crate::error::StandoffError;
use crate::text::SegmentedText;

/// Name of the extra field holding the checksum
pub const CHECKSUM_FIELD: &str = "text_checksum";

/// Returns the SHA-1 checksum (lowercase hex) of a string.
/// Note that this is cryptographically insecure! (but fast)
pub fn sha1_checksum(text: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(text);
    base16ct::lower::encode_string(&hasher.finalize())
}

impl Annotation {
    /// Computes the checksum of the text this annotation covers
    pub fn text_checksum<T: SegmentedText>(
        &self,
        text: &T,
        delimiter: &str,
    ) -> Result<String, StandoffError> {
        Ok(sha1_checksum(&self.text(text, delimiter)?))
    }

    /// Returns the stored checksum, if any. To compute the actual checksum, use [`Self::text_checksum()`]
    pub fn validation_checksum(&self) -> Option<&str> {
        self.extra(CHECKSUM_FIELD).and_then(|v| v.as_str())
    }

    /// Tests if the annotation's text is still valid.
    /// Returns false if there is no validation information in the annotation at all!
    pub fn validate_text<T: SegmentedText>(
        &self,
        text: &T,
        delimiter: &str,
    ) -> Result<bool, StandoffError> {
        match self.validation_checksum() {
            Some(refchecksum) => Ok(self.text_checksum(text, delimiter)? == refchecksum),
            None => Ok(false),
        }
    }
}

impl AnnotationStore {
    /// Stamps all annotations on the resource of `text` that do not have a checksum yet.
    /// Returns the number of annotations stamped.
    pub fn make_validation_checksums<T: SegmentedText>(
        &mut self,
        text: &T,
        delimiter: &str,
    ) -> Result<usize, StandoffError> {
        let mut count = 0;
        for annotation in self.annotations_mut() {
            if annotation.resource_id() != text.resource_id()
                || annotation.validation_checksum().is_some()
            {
                continue;
            }
            let checksum = annotation.text_checksum(text, delimiter)?;
            annotation.set_extra(CHECKSUM_FIELD, Value::String(checksum));
            count += 1;
        }
        Ok(count)
    }

    /// Tests if any annotation in the store carries validation info.
    /// This does not guarantee that all annotations have it.
    pub fn has_validation_info(&self) -> bool {
        self.iter().any(|a| a.validation_checksum().is_some())
    }

    /// Validates the text of all annotations on the resource of `text` that carry a checksum.
    /// Fails on the first mismatch, or, if `warn_for_all` is set, reports every mismatch and fails at the end.
    pub fn validate_text<T: SegmentedText>(
        &self,
        text: &T,
        delimiter: &str,
        warn_for_all: bool,
    ) -> Result<(), StandoffError> {
        let mut failures = 0;
        for annotation in self.iter() {
            if annotation.resource_id() != text.resource_id()
                || annotation.validation_checksum().is_none()
            {
                continue;
            }
            if !annotation.validate_text(text, delimiter)? {
                let msg = format!("Failed on {} {}", annotation.kind(), annotation.id());
                failures += 1;
                if warn_for_all {
                    eprintln!("[standoff validation] {}", msg);
                } else {
                    return Err(StandoffError::ValidationError(
                        msg,
                        "AnnotationStore::validate_text()",
                    ));
                }
            }
        }
        if failures == 0 {
            Ok(())
        } else {
            Err(StandoffError::ValidationError(
                format!("{} annotations failed to validate their text!", failures),
                "AnnotationStore::validate_text()",
            ))
        }
    }
}
