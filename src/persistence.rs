//! JSON document persistence helpers
//!
//! Documents are written pretty-printed with two-space indentation and
//! non-ASCII characters kept literally, so cached upstream payloads and
//! settings files stay human-readable.

use crate::error::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Serialize `value` and write it to `path`, creating parent directories.
///
/// The document is written to a sibling `.tmp` file and renamed into place,
/// so readers never observe a partially written file.
pub fn store_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let contents = serde_json::to_string_pretty(value)?;
    let temp_path = path.with_extension("tmp");
    std::fs::write(&temp_path, contents)?;
    std::fs::rename(&temp_path, path)?;
    Ok(())
}

/// Read and deserialize a JSON document from `path`
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}
