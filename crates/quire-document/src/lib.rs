// SPDX-License-Identifier: MIT
//
// quire-document — The collaborators the Quire engines orchestrate.
//
// Provides a PDF source reader (open, inspect, single empty-password decrypt
// attempt, per-page extraction), a page assembler that re-homes pages from
// many documents into one output, a composer that turns a raster image into
// a one-page PDF, image loading with color-model normalization, and the
// rasterizer interface with a Poppler-backed implementation.

pub mod image;
pub mod pdf;
pub mod raster;

#[cfg(any(test, feature = "testing"))]
pub mod testutil;

pub use image::PageImage;
pub use pdf::{PageAssembler, PdfComposer, PdfSource};
pub use raster::{PopplerRasterizer, RasterError, Rasterizer};
