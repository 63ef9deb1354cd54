//! Dated output documents and audit logs.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use cinemerge_merge::{AuditEvent, MergeError, MergedRecord};
use serde_json::{json, Value};
use tracing::info;

use crate::present::{shape, Layout};

pub const DEFAULT_PREFIX: &str = "movies_merged";

/// `<dir>/<prefix>_<YYYY-MM-DD>.json`. One file per day; a rerun overwrites it.
pub fn output_filename(dir: &Path, prefix: &str, date: NaiveDate) -> PathBuf {
    dir.join(format!("{prefix}_{}.json", date.format("%Y-%m-%d")))
}

/// Wrap shaped records as `{"generated_at": ..., "records": [...]}`.
pub fn build_document(records: &[MergedRecord], layout: Layout, generated_at: &str) -> Value {
    let shaped: Vec<Value> = records.iter().map(|r| shape(r, layout)).collect();
    json!({
        "generated_at": generated_at,
        "records": shaped,
    })
}

pub fn write_document(path: &Path, document: &Value) -> Result<(), MergeError> {
    let text = serde_json::to_string_pretty(document)
        .map_err(|e| MergeError::Io(format!("JSON serialization error: {e}")))?;
    std::fs::write(path, text)
        .map_err(|e| MergeError::Io(format!("cannot write {}: {e}", path.display())))?;
    info!(path = %path.display(), "wrote merged records");
    Ok(())
}

/// Write the audit stream as JSON Lines, one event per line.
pub fn write_audit(path: &Path, events: &[AuditEvent]) -> Result<(), MergeError> {
    let io_err = |e: std::io::Error| MergeError::Io(format!("cannot write {}: {e}", path.display()));

    let file = std::fs::File::create(path).map_err(io_err)?;
    let mut out = std::io::BufWriter::new(file);
    for event in events {
        let line = serde_json::to_string(event)
            .map_err(|e| MergeError::Io(format!("JSON serialization error: {e}")))?;
        writeln!(out, "{line}").map_err(io_err)?;
    }
    out.flush().map_err(io_err)?;
    info!(path = %path.display(), events = events.len(), "wrote audit log");
    Ok(())
}
