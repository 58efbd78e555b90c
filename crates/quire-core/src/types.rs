// SPDX-License-Identifier: MIT
//
// Core domain types for the Quire document engine.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::sort::NaturalSortKey;

/// Unique identifier for a split or merge job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What an input file is treated as during a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    /// A PDF whose pages are appended directly.
    Pdf,
    /// A raster image converted to a one-page PDF before appending.
    Image,
}

impl SourceKind {
    /// Classify a file extension. Returns `None` for anything the engine
    /// does not accept.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "jpg" | "jpeg" | "png" => Some(Self::Image),
            _ => None,
        }
    }

    /// Classify a path by its extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
}

/// One resolved input file, tagged and ordered. Created during fileset
/// resolution and owned by the job that resolved it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceItem {
    pub path: PathBuf,
    pub kind: SourceKind,
    pub sort_key: NaturalSortKey,
}

impl SourceItem {
    /// Build an item from a path, or `None` if the extension is unsupported.
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let kind = SourceKind::from_path(&path)?;
        let sort_key = NaturalSortKey::from_path(&path);
        Some(Self {
            path,
            kind,
            sort_key,
        })
    }

    /// Base filename for status lines.
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Output image format for the split-to-images mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Png,
    Jpg,
}

impl ImageFormat {
    /// File extension used for split artifacts.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpg => "jpg",
        }
    }
}

/// What a split job produces for each page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitMode {
    /// One single-page PDF per source page.
    Pdf,
    /// One raster image per source page.
    Image(ImageFormat),
}

/// Why an individual merge input was left out of the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// Extension not in the supported set. The resolver already filters
    /// these; this is the safety net for hand-built items.
    UnsupportedFileType,
    /// Encrypted PDF that a single empty-password attempt could not open.
    EncryptedDocument,
    /// PDF that failed to parse or whose pages could not be read.
    CorruptDocument,
    /// Image that failed to decode, convert, or validate as a one-page PDF.
    ConversionFailure,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::UnsupportedFileType => "unsupported file type",
            Self::EncryptedDocument => "encrypted document",
            Self::CorruptDocument => "invalid or corrupted document",
            Self::ConversionFailure => "image conversion failed",
        };
        f.write_str(text)
    }
}

/// Per-item result of a merge, one per input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemOutcome {
    pub path: PathBuf,
    pub disposition: ItemDisposition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemDisposition {
    /// The item's pages are in the output.
    Included { pages: u32 },
    /// The item was skipped; the job continued without it.
    Skipped { reason: SkipReason },
}

/// Terminal result of a job, returned once per invocation.
///
/// Job-level failures are returned as errors instead; a `JobResult` always
/// describes a job that ran to successful completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    pub job_id: JobId,
    /// Artifacts written (split) or inputs merged into the output (merge).
    pub items_included: u32,
    pub items_skipped: u32,
    /// One outcome per merge input, in processing order. Empty for splits.
    pub outcomes: Vec<ItemOutcome>,
    pub final_message: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_from_extension_is_case_insensitive() {
        assert_eq!(SourceKind::from_extension("PDF"), Some(SourceKind::Pdf));
        assert_eq!(SourceKind::from_extension("Jpeg"), Some(SourceKind::Image));
        assert_eq!(SourceKind::from_extension("png"), Some(SourceKind::Image));
        assert_eq!(SourceKind::from_extension("txt"), None);
    }

    #[test]
    fn item_from_unsupported_path_is_none() {
        assert!(SourceItem::from_path("/tmp/readme.txt").is_none());
        assert!(SourceItem::from_path("/tmp/no_extension").is_none());
    }

    #[test]
    fn item_carries_filename_key() {
        let a = SourceItem::from_path("/tmp/scan_2.pdf").unwrap();
        let b = SourceItem::from_path("/tmp/scan_10.jpg").unwrap();
        assert_eq!(a.kind, SourceKind::Pdf);
        assert_eq!(b.kind, SourceKind::Image);
        assert!(a.sort_key < b.sort_key);
    }
}
