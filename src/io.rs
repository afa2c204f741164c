//! Board file I/O.
//! Reads the input document, pretty-prints the result with 4-space indent and
//! writes it through a temp file in the destination directory, so the output
//! path only ever holds a complete document.

use serde::Serialize;
use serde_json::Value;
use serde_json::ser::PrettyFormatter;
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::error::FixError;

/// `board-2.json` -> `board-2-fixed.json`, next to the input.
pub fn fixed_path(input: &Path) -> PathBuf {
    let mut name = OsString::new();
    name.push(input.file_stem().unwrap_or_default());
    name.push("-fixed");
    if let Some(ext) = input.extension() {
        name.push(".");
        name.push(ext);
    }
    input.with_file_name(name)
}

/// Resolves `..`, `.` and symlinks so two spellings of one file compare equal.
/// A path that does not exist yet is resolved through its parent directory.
pub fn resolve_path(path: &Path) -> PathBuf {
    if let Ok(resolved) = fs::canonicalize(path) {
        return resolved;
    }
    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    match (fs::canonicalize(parent), path.file_name()) {
        (Ok(dir), Some(name)) => dir.join(name),
        _ => std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf()),
    }
}

pub fn same_file(a: &Path, b: &Path) -> bool {
    a == b || resolve_path(a) == resolve_path(b)
}

pub fn read_document(path: &Path) -> Result<Value, FixError> {
    let text = fs::read_to_string(path).map_err(|source| FixError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| FixError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Pretty JSON, 4-space indent, trailing newline.
pub fn to_pretty_json(value: &Value) -> serde_json::Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    buf.push(b'\n');
    Ok(buf)
}

/// Writes `bytes` to `path` via a sibling temp file and a rename.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), FixError> {
    let io_err = |source| FixError::Io {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(bytes).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}
