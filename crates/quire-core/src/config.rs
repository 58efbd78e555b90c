// SPDX-License-Identifier: MIT
//
// Engine configuration. Passed into the engines at construction time; there
// are no global settings.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Settings consumed by the split and merge engines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Directory containing the Poppler binaries (`pdftoppm`), for
    /// installations where they are not on `PATH`.
    pub raster_tool_dir: Option<PathBuf>,
    /// Resolution used when rasterizing PDF pages to images.
    pub raster_dpi: u32,
    /// Quality for JPG split artifacts (1-100).
    pub jpeg_quality: u8,
    /// Upper bound on a single rasterizer invocation, in seconds. `None`
    /// disables the timeout.
    pub raster_timeout_secs: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            raster_tool_dir: None,
            raster_dpi: 150,
            jpeg_quality: 90,
            raster_timeout_secs: None,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Write configuration to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path.as_ref(), serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
