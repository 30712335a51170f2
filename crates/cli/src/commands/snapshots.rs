//! Raw snapshot commands.
//!
//! # Usage
//!
//! ```bash
//! mg-cli snapshots list [--device <id>]
//! mg-cli snapshots show <key>
//! mg-cli snapshots purge <key> | --device <id>
//! ```

use marigold_core::DeviceId;
use marigold_storefront::devices::namespace;
use marigold_storefront::store::SnapshotBackend;

use super::CliError;

/// Keys stored for `device`, or every key.
fn matching_keys(
    backend: &dyn SnapshotBackend,
    device: Option<DeviceId>,
) -> Result<Vec<String>, CliError> {
    let mut keys = backend.keys()?;
    if let Some(device) = device {
        let prefix = format!("{}/", namespace(device));
        keys.retain(|key| key.starts_with(&prefix));
    }
    keys.sort();
    Ok(keys)
}

/// Print snapshot keys, one per line.
#[allow(clippy::print_stdout)]
pub fn list(backend: &dyn SnapshotBackend, device: Option<DeviceId>) -> Result<(), CliError> {
    let keys = matching_keys(backend, device)?;
    for key in &keys {
        println!("{key}");
    }
    tracing::info!(count = keys.len(), "Listed snapshots");
    Ok(())
}

/// Print a snapshot, pretty-printed when it is valid JSON.
#[allow(clippy::print_stdout)]
pub fn show(backend: &dyn SnapshotBackend, key: &str) -> Result<(), CliError> {
    let raw = backend
        .read(key)?
        .ok_or_else(|| CliError::MissingSnapshot(key.to_owned()))?;

    match serde_json::from_str::<serde_json::Value>(&raw) {
        Ok(value) => {
            let pretty = serde_json::to_string_pretty(&value).unwrap_or(raw);
            println!("{pretty}");
        }
        Err(e) => {
            tracing::warn!(key, error = %e, "Snapshot is not valid JSON, printing as stored");
            println!("{raw}");
        }
    }
    Ok(())
}

/// Delete one snapshot or every snapshot of a device. Returns how many were deleted.
pub fn purge(
    backend: &dyn SnapshotBackend,
    key: Option<&str>,
    device: Option<DeviceId>,
) -> Result<usize, CliError> {
    let keys = match key {
        Some(key) => {
            if backend.read(key)?.is_none() {
                return Err(CliError::MissingSnapshot(key.to_owned()));
            }
            vec![key.to_owned()]
        }
        None => matching_keys(backend, device)?,
    };

    for key in &keys {
        backend.delete(key)?;
        tracing::debug!(key, "Deleted snapshot");
    }
    tracing::info!(count = keys.len(), "Purged snapshots");
    Ok(keys.len())
}
