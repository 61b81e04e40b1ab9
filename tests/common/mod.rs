#![allow(dead_code)]
use serde_json::{json, Value};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use standoff::*;

/// session -> text regions -> lines
pub fn session_types() -> TraversalConfig {
    TraversalConfig::new()
        .with_type(
            "session",
            NodeTypeConfig::container("regions", "text_region"),
        )
        .with_type(
            "text_region",
            NodeTypeConfig::container("lines", "line").with_hook(Box::new(ScanPageHook::new())),
        )
        .with_type("line", NodeTypeConfig::leaf())
}

pub fn session_types_json() -> &'static str {
    r#"{
        "session": {"child_key": "regions", "child_type": "text_region"},
        "text_region": {"child_key": "lines", "child_type": "line", "hook": "scan_page"},
        "line": {}
    }"#
}

pub fn scenario_a() -> Value {
    json!({"id": "s1", "regions": [
        {"id": "r1", "lines": [
            {"id": "l1", "text": "Hello"},
            {"id": "l2", "text": "World"}
        ]}
    ]})
}

/// A session with one region of three lines, on the given scan
pub fn three_line_session(session: &str, lines: [&str; 3], scan: &str) -> Value {
    json!({"id": session, "regions": [
        {"id": format!("{}-r", session), "metadata": {"scan_id": scan, "page_id": format!("{}-p", scan)},
         "lines": [
            {"id": lines[0], "text": format!("{} one", session)},
            {"id": lines[1], "text": format!("{} two", session)},
            {"id": lines[2], "text": format!("{} three", session)}
        ]}
    ]})
}

/// A directory in the system temporary directory, unique per test process and name
pub fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("standoff-test-{}-{}", std::process::id(), name));
    std::fs::create_dir_all(&dir).expect("creating temporary directory");
    dir
}

pub fn write_json(dir: &Path, filename: &str, value: &Value) -> PathBuf {
    let path = dir.join(filename);
    let mut file = File::create(&path).expect("creating file");
    file.write_all(value.to_string().as_bytes())
        .expect("writing file");
    path
}

/// The corpus for two sessions: lines L1-L3 (session 1) and L4-L6 (session 2); both sessions
/// were scanned on the same scan
pub fn two_session_corpus(config: Config) -> Result<Corpus, StandoffError> {
    let mut builder = CorpusBuilder::new("corpus", session_types(), "session").with_config(config);
    builder.add_document(&three_line_session("s1", ["L1", "L2", "L3"], "scan1"), None)?;
    builder.add_document(&three_line_session("s2", ["L4", "L5", "L6"], "scan1"), None)?;
    builder.finish()
}
