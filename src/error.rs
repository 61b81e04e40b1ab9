/*
    Standoff Corpus Library (segmented text and standoff annotations)

        Licensed under the GNU General Public License v3
*/

//! This module contains the [`StandoffError`] type that all fallible operations in this library return.

use std::error::Error;
use std::fmt;

/// Context message, names the operation that raised the error
pub type Context = &'static str;

#[derive(Debug)]
pub enum StandoffError {
    /// An anchor, position, line id or resource could not be resolved
    LookupError(String, Context),

    /// An anchor could not be interpolated (no successor, or float precision exhausted)
    OrderingError(String, Context),

    /// No item with the requested public identifier exists
    NotFoundError(String, Context),

    /// A character span does not fall within any line. Non-fatal: the span is skipped.
    SpanResolutionError {
        offset: usize,
        end: usize,
        context: Context,
    },

    /// The source document does not have the shape the traversal configuration declares.
    /// First field is the field/key involved, second is the id (if known) of the offending node.
    StructuralMismatch(String, Option<String>, Context),

    /// A filter map contains a key that is not recognised
    InvalidFilter(String, Context),

    IOError(std::io::Error, String, Context),

    /// Deserialisation error, carries the path of the failing element, the filename and context
    JsonError(
        serde_path_to_error::Error<serde_json::Error>,
        String,
        Context,
    ),

    SerializationError(String),

    #[cfg(feature = "csv")]
    CsvError(String, Context),

    ValidationError(String, Context),

    OtherError(Context),
}

impl StandoffError {
    /// Returns true if this error should abort processing of the current file.
    /// Non-fatal errors concern a single item (span, line reference) and are reported
    /// as anomalies instead.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::SpanResolutionError { .. } | Self::LookupError(..) | Self::NotFoundError(..)
        )
    }
}

impl From<&StandoffError> for String {
    /// Returns the error message as a String
    fn from(error: &StandoffError) -> String {
        match error {
            StandoffError::LookupError(item, contextmsg) => {
                format!("LookupError: Unable to resolve {} ({})", item, contextmsg)
            }
            StandoffError::OrderingError(msg, contextmsg) => {
                format!("OrderingError: {} ({})", msg, contextmsg)
            }
            StandoffError::NotFoundError(id, contextmsg) => {
                format!("NotFoundError: No such id: {} ({})", id, contextmsg)
            }
            StandoffError::SpanResolutionError {
                offset,
                end,
                context,
            } => format!(
                "SpanResolutionError: Character span {}-{} does not match any line ({})",
                offset, end, context
            ),
            StandoffError::StructuralMismatch(field, Some(nodeid), contextmsg) => format!(
                "StructuralMismatch: Expected field '{}' is absent or malformed on node {} ({})",
                field, nodeid, contextmsg
            ),
            StandoffError::StructuralMismatch(field, None, contextmsg) => format!(
                "StructuralMismatch: Expected field '{}' is absent or malformed ({})",
                field, contextmsg
            ),
            StandoffError::InvalidFilter(key, contextmsg) => format!(
                "InvalidFilter: Unrecognised filter key '{}', expected 'type' or 'owner' ({})",
                key, contextmsg
            ),
            StandoffError::IOError(err, filename, contextmsg) => {
                format!("IOError: {}: {} ({})", filename, err, contextmsg)
            }
            StandoffError::JsonError(err, filename, contextmsg) => format!(
                "JsonError: Parsing failed: {} at {}, in {} ({})",
                err.inner(),
                err.path(),
                filename,
                contextmsg
            ),
            StandoffError::SerializationError(msg) => format!("SerializationError: {}", msg),
            #[cfg(feature = "csv")]
            StandoffError::CsvError(msg, contextmsg) => {
                format!("CsvError: {} ({})", msg, contextmsg)
            }
            StandoffError::ValidationError(msg, contextmsg) => {
                format!("ValidationError: {} ({})", msg, contextmsg)
            }
            StandoffError::OtherError(contextmsg) => format!("OtherError: {}", contextmsg),
        }
    }
}

impl fmt::Display for StandoffError {
    /// Formats the error message for printing
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let errmsg: String = String::from(self);
        write!(f, "[StandoffError] {}", errmsg)
    }
}

impl Error for StandoffError {}
