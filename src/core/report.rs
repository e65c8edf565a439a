//! Purpose: Resolve exported artifact names back to owner registration rows.
//! Exports: `cross_reference`, `artifact_map_id`, `write_report`, `ReportRow`,
//! `MissingPolicy`.
//! Role: Second batch stage; re-derives everything from artifact file names,
//! sharing no in-process state with the export stage.
//! Invariants: The record identifier is the last maximal digit run in the
//! artifact name.
//! Invariants: Report rows preserve the iteration order of the input names.

use std::io::Write;

use crate::core::error::{Error, ErrorKind};
use crate::core::record::{MapRecord, UserRecord};

pub const REPORT_HEADER: &str = "Map ID\tUser ID\tName\tEmail\tState\tReason";

/// One cross-referenced artifact: map identity joined to owner registration.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReportRow {
    pub map_id: i32,
    pub user_id: i32,
    pub name: String,
    pub email: String,
    pub state: String,
    pub reason: String,
}

/// What to do when an artifact cannot be resolved to a map or user.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MissingPolicy {
    /// Fail the whole report on the first unresolved artifact.
    Abort,
    /// Record the failure and keep going.
    Skip,
}

#[derive(Debug)]
pub struct SkippedArtifact {
    pub file_name: String,
    pub error: Error,
}

#[derive(Debug)]
pub struct CrossReference {
    pub rows: Vec<ReportRow>,
    pub skipped: Vec<SkippedArtifact>,
}

/// Extract the record identifier encoded in an artifact file name: the last
/// maximal digit run, which tolerates digits inside the version or role
/// tokens (`2_0-Nurse2-14.json` resolves to 14).
pub fn artifact_map_id(file_name: &str) -> Option<i32> {
    let mut last_run: Option<(usize, usize)> = None;
    let mut start = None;
    for (index, ch) in file_name.char_indices() {
        if ch.is_ascii_digit() {
            if start.is_none() {
                start = Some(index);
            }
        } else if let Some(begin) = start.take() {
            last_run = Some((begin, index));
        }
    }
    if let Some(begin) = start {
        last_run = Some((begin, file_name.len()));
    }
    let (begin, end) = last_run?;
    file_name[begin..end].parse().ok()
}

/// Resolve each artifact name to a `ReportRow` via map id -> owner id ->
/// user row. Unresolved artifacts abort or are skipped per `policy`.
pub fn cross_reference(
    artifact_names: &[String],
    maps: &[MapRecord],
    users: &[UserRecord],
    policy: MissingPolicy,
) -> Result<CrossReference, Error> {
    let mut rows = Vec::with_capacity(artifact_names.len());
    let mut skipped = Vec::new();
    for file_name in artifact_names {
        match resolve_row(file_name, maps, users) {
            Ok(row) => rows.push(row),
            Err(error) => match policy {
                MissingPolicy::Abort => return Err(error),
                MissingPolicy::Skip => skipped.push(SkippedArtifact {
                    file_name: file_name.clone(),
                    error,
                }),
            },
        }
    }
    Ok(CrossReference { rows, skipped })
}

fn resolve_row(
    file_name: &str,
    maps: &[MapRecord],
    users: &[UserRecord],
) -> Result<ReportRow, Error> {
    let map_id = artifact_map_id(file_name).ok_or_else(|| {
        Error::new(ErrorKind::Lookup)
            .with_message(format!("no record identifier in artifact name {file_name:?}"))
            .with_hint("Artifact names end in the record id: {version}-{role}-{id}.json.")
    })?;
    let map = maps.iter().find(|map| map.id == map_id).ok_or_else(|| {
        Error::new(ErrorKind::Lookup)
            .with_message("no map record for artifact")
            .with_table("maps")
            .with_map_id(map_id)
    })?;
    let user = users.iter().find(|user| user.id == map.owner).ok_or_else(|| {
        Error::new(ErrorKind::Lookup)
            .with_message(format!("no user record for map owner {}", map.owner))
            .with_table("users")
            .with_map_id(map_id)
    })?;
    Ok(ReportRow {
        map_id,
        user_id: user.id,
        name: user.name.clone(),
        email: user.email.clone(),
        state: user.state.clone(),
        reason: user.reason.clone(),
    })
}

/// Emit the tab-separated report: header row, then one row per artifact.
pub fn write_report(rows: &[ReportRow], out: &mut impl Write) -> Result<(), Error> {
    write_rows(rows, out).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to write report")
            .with_source(err)
    })
}

fn write_rows(rows: &[ReportRow], out: &mut impl Write) -> std::io::Result<()> {
    writeln!(out, "{REPORT_HEADER}")?;
    for row in rows {
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}",
            row.map_id, row.user_id, row.name, row.email, row.state, row.reason
        )?;
    }
    out.flush()
}
