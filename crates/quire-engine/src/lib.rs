// SPDX-License-Identifier: MIT
//
// quire-engine — Document assembly and disassembly.
//
// The split engine turns one source PDF into per-page artifacts (single-page
// PDFs or raster images); the merge engine turns a naturally-ordered, mixed
// sequence of PDFs and images into one output PDF, isolating per-item
// failures without aborting the job. Each job is one sequential unit of
// work: output order must match input order and the underlying page
// assembler is not safe for concurrent mutation, so there is no internal
// parallelism. Callers that need a responsive foreground run the job on a
// worker thread of their choosing.

pub mod cancel;
pub mod fileset;
pub mod merge;
pub mod progress;
pub mod split;

#[cfg(test)]
pub(crate) mod testutil;

pub use cancel::CancelToken;
pub use fileset::{InputSpec, resolve};
pub use merge::{MergeEngine, MergeJob};
pub use progress::{JobMonitor, NullMonitor};
pub use split::{SplitEngine, SplitJob};
