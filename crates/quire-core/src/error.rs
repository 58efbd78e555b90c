// SPDX-License-Identifier: MIT
//
// Unified error types for Quire.
//
// Job-level failures abort an entire split or merge job and surface here.
// Item-level failures during a merge do not — they are recorded as a
// `SkipReason` on the item's outcome and the job continues.

use thiserror::Error;

/// Top-level error type for all Quire operations.
#[derive(Debug, Error)]
pub enum QuireError {
    #[error("input not found: {0}")]
    InputNotFound(String),

    #[error("output path invalid or not creatable: {0}")]
    OutputPathInvalid(String),

    #[error("invalid or corrupted PDF: {0}")]
    CorruptDocument(String),

    #[error("external rasterizer failure: {0}")]
    ExternalToolFailure(String),

    #[error("all input files were skipped due to errors or being invalid")]
    AllItemsSkipped,

    #[error("no valid pages could be extracted or converted from the input files")]
    NoPagesExtracted,

    #[error("job cancelled")]
    Cancelled,

    #[error("PDF operation failed: {0}")]
    Pdf(String),

    #[error("image processing failed: {0}")]
    Image(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, QuireError>;
