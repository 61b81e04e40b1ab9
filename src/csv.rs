/*
    Standoff Corpus Library (segmented text and standoff annotations)

        Licensed under the GNU General Public License v3
*/

//! This module implements a flat CSV export of the annotation store, one row per annotation.
//! Metadata and type-specific fields are not part of the table; the JSON store remains the
//! authoritative form.
//!
//! This module is an extra feature and may be enabled/disabled at compile time.

use csv;
use sealed::sealed;
use serde::Serialize;

use crate::annotationstore::AnnotationStore;
use crate::config::Config;
use crate::error::StandoffError;
use crate::file::*;
use crate::types::*;

#[derive(Serialize)]
struct AnnotationCsv<'a> {
    resource_id: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    id: &'a str,
    begin_anchor: String,
    end_anchor: String,
    owner: Option<&'a str>,
}

#[sealed(pub(crate))]
pub trait ToCsv: TypeInfo {
    /// Writes CSV output to the writer
    fn csv_writer<W>(&self, writer: W) -> Result<(), StandoffError>
    where
        W: std::io::Write;

    /// Writes CSV output to a file
    fn to_csv_file(&self, filename: &str, config: &Config) -> Result<(), StandoffError> {
        debug(config, || {
            format!("{}.to_csv_file: filename={:?}", Self::typeinfo(), filename)
        });
        let writer = open_file_writer(filename, config)?;
        self.csv_writer(writer)
    }

    /// Writes CSV output to a string
    fn to_csv_string(&self) -> Result<String, StandoffError> {
        let mut buffer: Vec<u8> = Vec::new();
        self.csv_writer(&mut buffer)?;
        String::from_utf8(buffer).map_err(|e| {
            StandoffError::CsvError(format!("{}", e), "ToCsv::to_csv_string()")
        })
    }
}

#[sealed]
impl ToCsv for AnnotationStore {
    fn csv_writer<W>(&self, writer: W) -> Result<(), StandoffError>
    where
        W: std::io::Write,
    {
        let mut writer = csv::Writer::from_writer(writer);
        for annotation in self.iter() {
            writer
                .serialize(AnnotationCsv {
                    resource_id: annotation.resource_id(),
                    kind: annotation.kind().as_str(),
                    id: annotation.id(),
                    begin_anchor: annotation.begin().to_string(),
                    end_anchor: annotation.end().to_string(),
                    owner: annotation.owner(),
                })
                .map_err(|e| {
                    StandoffError::CsvError(format!("{}", e), "Failure serializing CSV")
                })?;
        }
        writer
            .flush()
            .map_err(|e| StandoffError::CsvError(format!("{}", e), "Failure flushing CSV"))
    }
}
