//! Locate and unwrap canonical record documents.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use cinemerge_merge::MergeError;
use serde_json::Value;
use tracing::{debug, info};

/// Filename prefix of dated canonical documents (`movies_canonical_2025-11-20.json`).
pub const DEFAULT_PATTERN: &str = "movies_canonical_";

/// Canonical records as read from disk, wrapper removed.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalDocument {
    pub generated_at: Option<String>,
    /// The bare record array, ready for `MergeEngine::parse_records`.
    pub records: Value,
}

/// Pick the input file.
///
/// An existing file is used as-is. Anything else is treated as a location to
/// search: the path itself when it has no extension, its parent otherwise.
/// The newest `<pattern>*.json` there wins.
pub fn resolve_input(path: &Path, pattern: &str) -> Result<PathBuf, MergeError> {
    if path.is_file() {
        return Ok(path.to_path_buf());
    }

    let search_dir = if path.extension().is_some() {
        path.parent().unwrap_or_else(|| Path::new("."))
    } else {
        path
    };
    let search_dir = if search_dir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        search_dir
    };

    let glob_pattern = format!(
        "{}/{}*.json",
        glob::Pattern::escape(&search_dir.to_string_lossy()),
        glob::Pattern::escape(pattern)
    );
    let entries = glob::glob(&glob_pattern).map_err(|e| MergeError::Io(e.to_string()))?;

    let mut candidates: Vec<(SystemTime, PathBuf)> = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| MergeError::Io(e.to_string()))?;
        let modified = path
            .metadata()
            .and_then(|m| m.modified())
            .map_err(|e| MergeError::Io(format!("{}: {e}", path.display())))?;
        candidates.push((modified, path));
    }

    // Newest first; name breaks mtime ties so the pick is stable.
    candidates.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));

    match candidates.into_iter().next() {
        Some((_, newest)) => {
            debug!(path = %newest.display(), "resolved latest canonical file");
            Ok(newest)
        }
        None => Err(MergeError::Io(format!(
            "no {pattern}*.json found in {}",
            search_dir.display()
        ))),
    }
}

/// Read a canonical document from disk.
pub fn read_document(path: &Path) -> Result<CanonicalDocument, MergeError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| MergeError::Io(format!("cannot read {}: {e}", path.display())))?;
    let value: Value = serde_json::from_str(&text).map_err(|e| MergeError::InvalidInput {
        index: None,
        reason: format!("{}: {e}", path.display()),
    })?;

    let doc = unwrap_document(value)?;
    if let Some(ref generated_at) = doc.generated_at {
        info!(file = %path.display(), %generated_at, "canonical data generated at {generated_at}");
    }
    Ok(doc)
}

/// Accept either a bare array or `{"generated_at": ..., "records": [...]}`.
/// A wrapper without `records` holds no records.
pub fn unwrap_document(value: Value) -> Result<CanonicalDocument, MergeError> {
    match value {
        Value::Array(items) => Ok(CanonicalDocument {
            generated_at: None,
            records: Value::Array(items),
        }),
        Value::Object(mut obj) => {
            let generated_at = obj
                .get("generated_at")
                .and_then(Value::as_str)
                .map(str::to_string);
            let records = obj.remove("records").unwrap_or_else(|| Value::Array(Vec::new()));
            Ok(CanonicalDocument {
                generated_at,
                records,
            })
        }
        _ => Err(MergeError::InvalidInput {
            index: None,
            reason: "document must be an array or an object with \"records\"".into(),
        }),
    }
}
