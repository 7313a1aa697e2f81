//! Shared helpers for command handlers.

use std::path::Path;

use watts_core::{Coordinator, CoreError, Device};

use crate::error::CliError;

/// Find a device by composite id (`SH#C001-000`) or short id.
///
/// A short id present in more than one smarthome is ambiguous.
pub fn resolve_device(coordinator: &Coordinator, reference: &str) -> Result<Device, CliError> {
    let state = coordinator.data().ok_or(CoreError::NoData)?;
    let reference = reference.trim();

    let mut matches = state
        .devices()
        .filter(|d| d.id == reference || d.id_device == reference);
    let Some(first) = matches.next() else {
        return Err(CliError::NotFound {
            resource_type: "device".into(),
            identifier: reference.into(),
        });
    };
    if let Some(other) = matches.next() {
        return Err(CliError::Validation {
            field: "device".into(),
            reason: format!(
                "'{reference}' matches {} and {}; use the composite id",
                first.id, other.id
            ),
        });
    }
    Ok(first.clone())
}

/// Read and parse a JSON file.
pub fn read_json_file(path: &Path) -> Result<serde_json::Value, CliError> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| CliError::Validation {
        field: "file".into(),
        reason: format!("invalid JSON: {e}"),
    })
}
