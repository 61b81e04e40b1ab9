/*
    Standoff Corpus Library (segmented text and standoff annotations)

        Licensed under the GNU General Public License v3
*/

//! This module contains some common types and helper functions used throughout the library.

use sealed::sealed;
use std::fmt;

use crate::config::Config;

/// An enumeration of the main serialisable types in this library
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    SegmentedText,
    TextStore,
    Annotation,
    AnnotationStore,
    AnomalyReport,
    Config,
    TraversalConfig,
}

impl Type {
    fn as_str(&self) -> &'static str {
        match self {
            Self::SegmentedText => "SegmentedText",
            Self::TextStore => "TextStore",
            Self::Annotation => "Annotation",
            Self::AnnotationStore => "AnnotationStore",
            Self::AnomalyReport => "AnomalyReport",
            Self::Config => "Config",
            Self::TraversalConfig => "TraversalConfig",
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Provides type introspection, used in (de)serialisation messages.
/// This is a sealed trait, not implementable outside this crate.
#[sealed(pub(crate))]
pub trait TypeInfo {
    fn typeinfo() -> Type;
}

/// Prints a debug message to stderr, only if debug mode is enabled in the configuration.
/// The message is passed as a closure so it is only formatted when actually needed.
pub(crate) fn debug<F>(config: &Config, message_func: F)
where
    F: FnOnce() -> String,
{
    if config.debug() {
        eprintln!("[standoff debug] {}", message_func());
    }
}

/// Prints a warning to stderr, unless warnings are disabled in the configuration.
/// Warnings never interrupt processing; they are also recorded in an [`crate::AnomalyReport`] by the caller.
pub(crate) fn warn<F>(config: &Config, message_func: F)
where
    F: FnOnce() -> String,
{
    if config.warnings() {
        eprintln!("[standoff warning] {}", message_func());
    }
}
