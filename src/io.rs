//! File helpers for the command-line tool.
//!
//! - `load_delivery`: read one normalized delivery JSON into a validated
//!   [`DeliveryRecord`].
//! - `load_deliveries`: the same for a list of paths, failing on the first bad file.
//! - `write_json_file`: pretty-print a serializable value to disk, creating
//!   parent directories as needed.
use crate::delivery::DeliveryRecord;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub fn load_delivery(path: &Path) -> Result<DeliveryRecord, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read delivery {}: {e}", path.display()))?;
    serde_json::from_str(&data)
        .map_err(|e| format!("Failed to parse delivery {}: {e}", path.display()))
}

pub fn load_deliveries(paths: &[PathBuf]) -> Result<Vec<DeliveryRecord>, String> {
    paths.iter().map(|p| load_delivery(p)).collect()
}

/// Write `value` as pretty JSON to `path`.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), String> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize JSON for {}: {e}", path.display()))?;
    fs::write(path, json).map_err(|e| format!("Failed to write JSON {}: {e}", path.display()))
}

fn ensure_parent_dir(path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {e}", parent.display()))?;
        }
    }
    Ok(())
}
