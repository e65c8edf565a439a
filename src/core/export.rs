//! Purpose: Write one JSON artifact per version-matching map record.
//! Exports: `export`, `ExportSummary`, `ARTIFACT_SUFFIX`.
//! Role: Orchestrates filter -> path -> serialize -> write for one batch run.
//! Invariants: Artifacts are written to a temp name and renamed, so the
//! output directory never holds a partially written `.json` file.
//! Invariants: Re-exporting the same record overwrites in place (idempotent).
//! Invariants: A write failure aborts the run; prior artifacts remain.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use serde_json::ser::PrettyFormatter;
use time::PrimitiveDateTime;
use time::macros::format_description;

use crate::core::error::{Error, ErrorKind};
use crate::core::filter;
use crate::core::record::MapRecord;
use crate::core::sanitize::build_artifact_path;

/// File suffix shared by export and cross-reference listing.
pub const ARTIFACT_SUFFIX: &str = ".json";

/// Per-record outcome of one export run, in match order.
#[derive(Clone, Debug)]
pub struct ExportSummary {
    /// 1-based position within this run.
    pub seq: usize,
    pub map_id: i32,
    pub version: String,
    pub role: String,
    /// Serialized artifact length in bytes.
    pub bytes: u64,
    /// Last-modified timestamp, formatted `YYYY-MM-DD HH:MM`.
    pub modified_at: String,
    pub path: PathBuf,
}

/// Export every record matching `target_version` into `output_dir`, invoking
/// `on_export` once per artifact as it lands.
pub fn export(
    records: &[MapRecord],
    target_version: &str,
    output_dir: &Path,
    mut on_export: impl FnMut(&ExportSummary),
) -> Result<Vec<ExportSummary>, Error> {
    fs::create_dir_all(output_dir).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to create output directory")
            .with_path(output_dir)
            .with_source(err)
    })?;

    let matches = filter::select(records, target_version);
    let mut summaries = Vec::with_capacity(matches.len());
    for (index, matched) in matches.iter().enumerate() {
        let path = build_artifact_path(output_dir, &matched.version, &matched.role, matched.record.id);
        let payload = serialize_document(&matched.record.document)?;
        write_artifact(&path, &payload)?;
        let summary = ExportSummary {
            seq: index + 1,
            map_id: matched.record.id,
            version: matched.version.clone(),
            role: matched.role.clone(),
            bytes: payload.len() as u64,
            modified_at: format_modified_at(matched.record.modified_at)?,
            path,
        };
        on_export(&summary);
        summaries.push(summary);
    }
    Ok(summaries)
}

/// Serialize with recursively sorted keys and 4-space indentation so repeated
/// exports of the same document are byte-identical and diff cleanly.
fn serialize_document(document: &Value) -> Result<Vec<u8>, Error> {
    let mut out = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    sorted(document)
        .serialize(&mut serializer)
        .map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message("failed to serialize document")
                .with_source(err)
        })?;
    Ok(out)
}

fn sorted(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys = map.keys().cloned().collect::<Vec<_>>();
            keys.sort();
            let mut out = serde_json::Map::new();
            for key in keys {
                out.insert(key.clone(), sorted(&map[&key]));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
        other => other.clone(),
    }
}

fn write_artifact(path: &Path, payload: &[u8]) -> Result<(), Error> {
    let tmp = tmp_path(path);
    fs::write(&tmp, payload).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to write artifact")
            .with_path(&tmp)
            .with_source(err)
    })?;
    fs::rename(&tmp, path).map_err(|err| {
        let _ = fs::remove_file(&tmp);
        Error::new(ErrorKind::Io)
            .with_message("failed to finalize artifact")
            .with_path(path)
            .with_source(err)
    })
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn format_modified_at(modified_at: PrimitiveDateTime) -> Result<String, Error> {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]");
    modified_at.format(format).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("failed to format modified timestamp")
            .with_source(err)
    })
}
