// SPDX-License-Identifier: MIT
//
// Fileset resolution — turn a user-supplied input (explicit file list,
// single file, or directory) into an ordered, filtered sequence of items.

use std::path::PathBuf;

use quire_core::error::{QuireError, Result};
use quire_core::types::SourceItem;
use tracing::{debug, info, instrument};

/// What the caller handed us as merge input.
#[derive(Debug, Clone)]
pub enum InputSpec {
    /// Explicit list of files, e.g. from a multi-select.
    Files(Vec<PathBuf>),
    /// A single file, or a directory to scan (immediate children only).
    Path(PathBuf),
}

/// Resolve an input spec into source items sorted by natural filename order.
///
/// Non-existing entries in an explicit list and unsupported extensions are
/// filtered silently; the result may be empty, and callers decide whether
/// that is fatal. The ordering is identical regardless of where the inputs
/// came from, so merge order is deterministic.
#[instrument(skip_all)]
pub fn resolve(spec: &InputSpec) -> Result<Vec<SourceItem>> {
    let mut items = match spec {
        InputSpec::Files(paths) => paths
            .iter()
            .filter(|path| path.is_file())
            .filter_map(SourceItem::from_path)
            .collect::<Vec<_>>(),
        InputSpec::Path(path) => {
            if path.is_dir() {
                info!("Scanning folder: {}", path.display());
                std::fs::read_dir(path)?
                    .filter_map(|entry| entry.ok())
                    .map(|entry| entry.path())
                    .filter(|child| child.is_file())
                    .filter_map(SourceItem::from_path)
                    .collect()
            } else if path.is_file() {
                SourceItem::from_path(path.clone()).into_iter().collect()
            } else {
                return Err(QuireError::InputNotFound(path.display().to_string()));
            }
        }
    };

    items.sort_by(|a, b| a.sort_key.cmp(&b.sort_key));
    debug!(count = items.len(), "Fileset resolved");
    Ok(items)
}
