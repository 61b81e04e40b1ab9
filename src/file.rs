/*
    Standoff Corpus Library (segmented text and standoff annotations)

        Licensed under the GNU General Public License v3
*/

//! This module contains some common helper functions for dealing with file I/O

use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::StandoffError;
use crate::types::*;

/// Get a file for reading or writing, this resolves relative files more intelligently
pub(crate) fn get_filepath(
    filename: &str,
    workdir: Option<&Path>,
) -> Result<PathBuf, StandoffError> {
    if filename == "-" {
        //designates stdin or stdout
        return Ok(filename.into());
    }
    if filename.starts_with("https://") || filename.starts_with("http://") {
        // harvesting is done by an external collaborator
        return Err(StandoffError::OtherError(
            "Loading URLs is not supported, harvest the documents first",
        ));
    }
    let path = if let Some(stripped) = filename.strip_prefix("file://") {
        PathBuf::from(stripped)
    } else {
        PathBuf::from(filename)
    };
    if path.is_absolute() {
        Ok(path)
    } else {
        //check whether we can find one in our workdir first
        if let Some(workdir) = workdir {
            let path = workdir.join(&path);
            if path.is_file() {
                return Ok(path);
            }
        }

        //final fallback is simply relative to the current working directory
        Ok(path)
    }
}

fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Auxiliary function to help open files
pub(crate) fn open_file(filename: &str, config: &Config) -> Result<File, StandoffError> {
    let found_filename = get_filepath(filename, config.workdir())?;
    debug(config, || format!("open_file: {:?}", found_filename));
    File::open(found_filename.as_path()).map_err(|e| {
        StandoffError::IOError(
            e,
            path_to_string(&found_filename),
            "Opening file for reading failed",
        )
    })
}

/// Auxiliary function to help create files
pub(crate) fn create_file(filename: &str, config: &Config) -> Result<File, StandoffError> {
    let found_filename = get_filepath(filename, config.workdir())?;
    debug(config, || format!("create_file: {:?}", found_filename));
    File::create(found_filename.as_path()).map_err(|e| {
        StandoffError::IOError(
            e,
            path_to_string(&found_filename),
            "Opening file for writing failed",
        )
    })
}

/// Auxiliary function to help open files
pub(crate) fn open_file_reader(
    filename: &str,
    config: &Config,
) -> Result<Box<dyn BufRead>, StandoffError> {
    if filename == "-" {
        Ok(Box::new(std::io::stdin().lock()))
    } else {
        Ok(Box::new(BufReader::new(open_file(filename, config)?)))
    }
}

/// Auxiliary function to help open files
pub(crate) fn open_file_writer(
    filename: &str,
    config: &Config,
) -> Result<Box<dyn Write>, StandoffError> {
    if filename == "-" {
        Ok(Box::new(std::io::stdout()))
    } else {
        Ok(Box::new(BufWriter::new(create_file(filename, config)?)))
    }
}

/// Lists all files in `dir` whose file name matches `pattern`, sorted lexically by file name.
///
/// Lexical order of file names is the conventional document order of harvested source
/// files; the result can be passed straight to [`crate::CorpusBuilder::add_files()`].
/// Subdirectories are not descended into.
pub fn discover_files(
    dir: impl AsRef<Path>,
    pattern: &Regex,
    config: &Config,
) -> Result<Vec<PathBuf>, StandoffError> {
    let dir = dir.as_ref();
    let dir = if dir.is_relative() {
        config
            .workdir()
            .map(|workdir| workdir.join(dir))
            .unwrap_or_else(|| dir.to_path_buf())
    } else {
        dir.to_path_buf()
    };
    let entries = std::fs::read_dir(&dir).map_err(|e| {
        StandoffError::IOError(e, path_to_string(&dir), "Reading directory failed")
    })?;
    let mut found = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            StandoffError::IOError(e, path_to_string(&dir), "Reading directory entry failed")
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| pattern.is_match(name))
            .unwrap_or(false);
        if matches {
            found.push(path);
        }
    }
    found.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    debug(config, || {
        format!("discover_files: {} files in {:?}", found.len(), dir)
    });
    Ok(found)
}
