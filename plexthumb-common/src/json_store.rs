//! JSON document persistence
//!
//! State lives in small pretty-printed JSON files so it can be browsed and
//! edited by hand. Writes replace the whole file atomically (temp file in the
//! same directory, then rename) so a reader never sees a half-written document.

use crate::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::warn;

/// Read a JSON document.
///
/// Returns `Ok(None)` when the file does not exist.
pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.is_file() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&content)?))
}

/// Read a JSON document, falling back to `T::default()` on any failure.
///
/// Failures other than a missing file are logged.
pub fn load_json_file<T: DeserializeOwned + Default>(path: &Path) -> T {
    match read_json_file(path) {
        Ok(Some(value)) => value,
        Ok(None) => T::default(),
        Err(e) => {
            warn!("Failed loading {}: {}", path.display(), e);
            T::default()
        }
    }
}

/// Atomically replace a JSON document
pub fn save_json_file<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut body = serde_json::to_vec_pretty(data)?;
    body.push(b'\n');

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(&body)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
