/*
    Standoff Corpus Library (segmented text and standoff annotations)

        Licensed under the GNU General Public License v3
*/

//! This module contains the [`ToJson`] and [`FromJson`] traits that are used
//! in serialisation to/from the persisted JSON stores. The actual shapes are defined
//! alongside the data structures themselves, not here.

use serde::de::DeserializeOwned;
use std::io::Write;

use crate::config::Config;
use crate::error::{Context, StandoffError};
use crate::file::*;
use crate::types::*;

pub trait ToJson
where
    Self: TypeInfo + serde::Serialize,
{
    /// Writes a serialisation to any writer
    /// Lower-level function
    fn to_json_writer<W>(&self, writer: W, compact: bool) -> Result<(), StandoffError>
    where
        W: std::io::Write,
    {
        match compact {
            false => serde_json::to_writer_pretty(writer, &self),
            true => serde_json::to_writer(writer, &self),
        }
        .map_err(|e| {
            StandoffError::SerializationError(format!(
                "Writing {} to file: {}",
                Self::typeinfo(),
                e
            ))
        })
    }

    /// Writes this structure to a file
    fn to_json_file(&self, filename: &str, config: &Config) -> Result<(), StandoffError> {
        debug(config, || {
            format!("{}.to_json_file: filename={:?}", Self::typeinfo(), filename)
        });
        let mut writer = open_file_writer(filename, config)?;
        self.to_json_writer(&mut writer, config.compact())?;
        writer.flush().map_err(|e| {
            StandoffError::IOError(e, filename.to_string(), "Flushing output file failed")
        })
    }

    /// Serializes this structure to one string.
    fn to_json_string(&self, config: &Config) -> Result<String, StandoffError> {
        match config.compact() {
            false => serde_json::to_string_pretty(&self),
            true => serde_json::to_string(&self),
        }
        .map_err(|e| {
            StandoffError::SerializationError(format!(
                "Writing {} to string: {}",
                Self::typeinfo(),
                e
            ))
        })
    }
}

pub trait FromJson
where
    Self: TypeInfo + Sized,
{
    fn from_json_file(filename: &str, config: &Config) -> Result<Self, StandoffError>;

    fn from_json_str(string: &str, config: &Config) -> Result<Self, StandoffError>;
}

/// Deserialises any type from a JSON file, reporting the path of the failing element on error
pub(crate) fn deserialize_file<T>(
    filename: &str,
    config: &Config,
    context: Context,
) -> Result<T, StandoffError>
where
    T: DeserializeOwned,
{
    let reader = open_file_reader(filename, config)?;
    let deserializer = &mut serde_json::Deserializer::from_reader(reader);
    serde_path_to_error::deserialize(deserializer)
        .map_err(|e| StandoffError::JsonError(e, filename.to_string(), context))
}

/// Deserialises any type from a JSON string, reporting the path of the failing element on error
pub(crate) fn deserialize_str<T>(string: &str, context: Context) -> Result<T, StandoffError>
where
    T: DeserializeOwned,
{
    let deserializer = &mut serde_json::Deserializer::from_str(string);
    serde_path_to_error::deserialize(deserializer)
        .map_err(|e| StandoffError::JsonError(e, "(string)".to_string(), context))
}
