// SPDX-License-Identifier: MIT
//
// PDF module — reading sources, assembling pages into a new document, and
// composing one-page PDFs from images.

pub mod assembler;
pub mod composer;
pub mod source;

pub use assembler::PageAssembler;
pub use composer::PdfComposer;
pub use source::PdfSource;
