// SPDX-License-Identifier: MIT
//
// PDF source — open and inspect an existing PDF with `lopdf`, attempt a
// single empty-password decrypt on encrypted files, and extract individual
// pages as standalone single-page documents.

use std::path::{Path, PathBuf};

use lopdf::Document;
use quire_core::error::{QuireError, Result};
use tracing::{debug, info, instrument, warn};

use crate::pdf::assembler::PageAssembler;

/// A readable source PDF.
#[derive(Debug)]
pub struct PdfSource {
    document: Document,
    source_path: PathBuf,
}

impl PdfSource {
    /// Open a PDF from the filesystem.
    ///
    /// A missing file is `InputNotFound`; a file that fails to parse is
    /// `CorruptDocument`.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        if !path_ref.is_file() {
            return Err(QuireError::InputNotFound(path_ref.display().to_string()));
        }

        info!("Opening PDF: {}", path_ref.display());
        let document = Document::load(path_ref).map_err(|err| {
            QuireError::CorruptDocument(format!("{}: {}", path_ref.display(), err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded");

        Ok(Self {
            document,
            source_path: path_ref.to_path_buf(),
        })
    }

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Filename without extension, used as the base for split artifacts.
    pub fn file_stem(&self) -> String {
        self.source_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string())
    }

    /// Whether the document carries an encryption dictionary.
    pub fn is_encrypted(&self) -> bool {
        self.document.is_encrypted()
    }

    /// Attempt exactly one decrypt with the empty password.
    ///
    /// Returns `true` only if the attempt yields an openable document with a
    /// readable page tree. No other credentials are ever tried.
    pub fn decrypt_with_empty_password(&mut self) -> bool {
        // The loader already authenticates the empty password and decrypts
        // object contents when that succeeds; a second pass would re-encrypt
        // them (RC4 is symmetric).
        if self.document.encryption_state.is_some() {
            return !self.document.get_pages().is_empty();
        }
        match self.document.decrypt("") {
            Ok(()) => {
                let readable = !self.document.get_pages().is_empty();
                if !readable {
                    warn!(
                        path = %self.source_path.display(),
                        "empty-password decrypt produced no readable pages"
                    );
                }
                readable
            }
            Err(err) => {
                warn!(
                    path = %self.source_path.display(),
                    %err,
                    "empty-password decrypt failed"
                );
                false
            }
        }
    }

    /// Borrow the underlying lopdf document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Extract a single page (1-indexed) into a new standalone PDF, returned
    /// as serialized bytes.
    #[instrument(skip(self), fields(page_number))]
    pub fn extract_page(&self, page_number: u32) -> Result<Vec<u8>> {
        let pages = self.document.get_pages();
        if page_number == 0 || page_number as usize > pages.len() {
            return Err(QuireError::Pdf(format!(
                "page {} out of range (document has {} pages)",
                page_number,
                pages.len()
            )));
        }

        let page_id = *pages.get(&page_number).ok_or_else(|| {
            QuireError::Pdf(format!("page {} not found in page tree", page_number))
        })?;

        let mut assembler = PageAssembler::new();
        assembler.append_page(&self.document, page_id)?;
        let bytes = assembler.finish_to_bytes()?;

        debug!(page_number, output_bytes = bytes.len(), "Page extracted");
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::sample_document;

    #[test]
    fn open_reports_missing_input() {
        let err = PdfSource::open("/nonexistent/input.pdf").unwrap_err();
        assert!(matches!(err, QuireError::InputNotFound(_)));
    }

    #[test]
    fn open_reports_corrupt_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"not a pdf at all").unwrap();

        let err = PdfSource::open(&path).unwrap_err();
        assert!(matches!(err, QuireError::CorruptDocument(_)));
    }

    #[test]
    fn extract_page_yields_single_page_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("three.pdf");
        sample_document(3).save(&path).unwrap();

        let source = PdfSource::open(&path).unwrap();
        assert_eq!(source.page_count(), 3);
        assert_eq!(source.file_stem(), "three");

        let bytes = source.extract_page(2).unwrap();
        let extracted = Document::load_mem(&bytes).unwrap();
        assert_eq!(extracted.get_pages().len(), 1);
    }

    #[test]
    fn blank_password_document_decrypts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank-pass.pdf");
        std::fs::write(&path, crate::testutil::encrypted_blank_password_pdf()).unwrap();

        let mut source = PdfSource::open(&path).unwrap();
        assert!(source.is_encrypted());
        assert!(source.decrypt_with_empty_password());
        assert_eq!(source.page_count(), 1);
    }

    #[test]
    fn locked_document_refuses_empty_password() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("locked.pdf");
        std::fs::write(&path, crate::testutil::encrypted_locked_pdf()).unwrap();

        let mut source = PdfSource::open(&path).unwrap();
        assert!(source.is_encrypted());
        assert!(!source.decrypt_with_empty_password());
    }

    #[test]
    fn extract_page_rejects_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("one.pdf");
        sample_document(1).save(&path).unwrap();

        let source = PdfSource::open(&path).unwrap();
        assert!(source.extract_page(0).is_err());
        assert!(source.extract_page(2).is_err());
    }
}
