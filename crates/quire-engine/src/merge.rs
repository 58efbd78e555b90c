// SPDX-License-Identifier: MIT
//
// Merge engine — an ordered, mixed sequence of PDFs and images in, one PDF
// out. Fault isolation is the central design decision here: an item that
// fails to decode, convert, or decrypt is skipped and reported, and the job
// carries on. Only job-level faults (cancellation, an unwritable output)
// abort the whole merge.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use lopdf::Document;
use quire_core::error::{QuireError, Result};
use quire_core::types::{
    ItemDisposition, ItemOutcome, JobId, JobResult, SkipReason, SourceItem, SourceKind,
};
use quire_document::image::PageImage;
use quire_document::pdf::{PageAssembler, PdfComposer, PdfSource};
use tracing::{info, instrument, warn};

use crate::cancel::CancelToken;
use crate::progress::{JobMonitor, report};

/// Description of one merge job.
///
/// Items are sorted by natural filename order at construction and the order
/// is never re-derived mid-job.
#[derive(Debug, Clone)]
pub struct MergeJob {
    items: Vec<SourceItem>,
    output_path: PathBuf,
}

impl MergeJob {
    pub fn new(mut items: Vec<SourceItem>, output_path: impl Into<PathBuf>) -> Self {
        // Stable sort: byte-identical names keep their input order.
        items.sort_by(|a, b| a.sort_key.cmp(&b.sort_key));
        Self {
            items,
            output_path: output_path.into(),
        }
    }

    pub fn items(&self) -> &[SourceItem] {
        &self.items
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }
}

/// Merges resolved items into one output PDF.
pub struct MergeEngine {
    composer: PdfComposer,
}

impl MergeEngine {
    pub fn new() -> Self {
        Self {
            composer: PdfComposer::default(),
        }
    }

    /// Run the job to completion on the caller's thread.
    ///
    /// Items are processed strictly in their resolved order; the page
    /// assembler is owned exclusively by this job and appends sequentially.
    #[instrument(skip_all, fields(items = job.items.len(), output = %job.output_path.display()))]
    pub fn run(
        &self,
        job: &MergeJob,
        monitor: &mut dyn JobMonitor,
        cancel: &CancelToken,
    ) -> Result<JobResult> {
        let started_at = Utc::now();
        let total = job.items.len();

        monitor.status(&format!(
            "found {} file(s) to merge (sorted naturally)",
            total
        ));
        report(monitor, 0, total as u64);

        let mut assembler = PageAssembler::new();
        let mut outcomes: Vec<ItemOutcome> = Vec::with_capacity(total);
        let mut included: u32 = 0;
        let mut skipped: u32 = 0;

        for (index, item) in job.items.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(QuireError::Cancelled);
            }

            let name = item.display_name();
            monitor.status(&format!("processing: {} ({}/{})", name, index + 1, total));

            // The resolver already filters extensions; re-deriving the kind
            // here is the safety net for hand-built items.
            let attempt = match SourceKind::from_path(&item.path) {
                None => Err(SkipReason::UnsupportedFileType),
                Some(SourceKind::Image) => self.append_image(item, &mut assembler),
                Some(SourceKind::Pdf) => self.append_pdf(item, &mut assembler),
            };

            match attempt {
                Ok(pages) => {
                    included += 1;
                    outcomes.push(ItemOutcome {
                        path: item.path.clone(),
                        disposition: ItemDisposition::Included { pages },
                    });
                    monitor.status(&format!("appended: {} ({} pages)", name, pages));
                }
                Err(reason) => {
                    skipped += 1;
                    outcomes.push(ItemOutcome {
                        path: item.path.clone(),
                        disposition: ItemDisposition::Skipped { reason },
                    });
                    monitor.status(&format!("skipping {}: {}", name, reason));
                }
            }
            report(monitor, (index + 1) as u64, total as u64);
        }

        if included == 0 || assembler.page_count() == 0 {
            monitor.status("merging failed: no valid content merged");
            return Err(if skipped as usize == total && total > 0 {
                QuireError::AllItemsSkipped
            } else {
                QuireError::NoPagesExtracted
            });
        }

        if let Some(parent) = job.output_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|err| {
                QuireError::OutputPathInvalid(format!("{}: {}", parent.display(), err))
            })?;
        }

        let merged_pages = assembler.page_count();
        assembler.write_to_file(&job.output_path)?;
        info!(
            pages = merged_pages,
            included, skipped, "Merged output written"
        );

        let output_name = job
            .output_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| job.output_path.display().to_string());
        let mut final_message = format!("merging complete: {}", output_name);
        if skipped > 0 {
            final_message.push_str(&format!(" ({} file(s) skipped)", skipped));
        }
        monitor.status(&final_message);

        Ok(JobResult {
            job_id: JobId::new(),
            items_included: included,
            items_skipped: skipped,
            outcomes,
            final_message,
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// Append a PDF item, or say why it must be skipped.
    fn append_pdf(
        &self,
        item: &SourceItem,
        assembler: &mut PageAssembler,
    ) -> std::result::Result<u32, SkipReason> {
        let mut source = match PdfSource::open(&item.path) {
            Ok(source) => source,
            Err(err) => {
                warn!(path = %item.path.display(), %err, "Cannot open PDF item");
                return Err(SkipReason::CorruptDocument);
            }
        };

        if source.is_encrypted() && !source.decrypt_with_empty_password() {
            // One empty-password attempt only; anything else is skipped.
            return Err(SkipReason::EncryptedDocument);
        }

        assembler.append_document(source.document()).map_err(|err| {
            warn!(path = %item.path.display(), %err, "Cannot append PDF item");
            SkipReason::CorruptDocument
        })
    }

    /// Convert an image item to a one-page PDF and append it, or say why it
    /// must be skipped.
    fn append_image(
        &self,
        item: &SourceItem,
        assembler: &mut PageAssembler,
    ) -> std::result::Result<u32, SkipReason> {
        let image = PageImage::open(&item.path).map_err(|err| {
            warn!(path = %item.path.display(), %err, "Cannot decode image item");
            SkipReason::ConversionFailure
        })?;

        let flattened = image.into_opaque_rgb();
        let bytes = self
            .composer
            .compose(flattened.as_dynamic(), &item.display_name())
            .map_err(|err| {
                warn!(path = %item.path.display(), %err, "Cannot compose image page");
                SkipReason::ConversionFailure
            })?;

        // Validate before accepting: the composed bytes must re-open as a
        // document with at least one page.
        let document = Document::load_mem(&bytes).map_err(|err| {
            warn!(path = %item.path.display(), %err, "Composed page failed validation");
            SkipReason::ConversionFailure
        })?;
        if document.get_pages().is_empty() {
            warn!(path = %item.path.display(), "Composed page has no pages");
            return Err(SkipReason::ConversionFailure);
        }

        assembler.append_document(&document).map_err(|err| {
            warn!(path = %item.path.display(), %err, "Cannot append converted image");
            SkipReason::ConversionFailure
        })
    }
}

impl Default for MergeEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fileset::{InputSpec, resolve};
    use crate::progress::NullMonitor;
    use crate::split::{SplitEngine, SplitJob};
    use crate::testutil::{Recorder, sample_pdf_file};
    use image::{Rgba, RgbaImage};
    use quire_core::config::EngineConfig;
    use quire_core::sort::NaturalSortKey;
    use quire_core::types::SplitMode;

    fn item(path: &Path) -> SourceItem {
        SourceItem::from_path(path).unwrap()
    }

    fn png_fixture(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        RgbaImage::from_pixel(5, 5, Rgba([90, 90, 200, 120]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn corrupt_item_is_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let a1 = sample_pdf_file(dir.path(), "a1.pdf", 1);
        let a2 = sample_pdf_file(dir.path(), "a2.pdf", 2);
        let a3 = dir.path().join("a3.pdf");
        std::fs::write(&a3, b"this is not a pdf").unwrap();
        let a4 = sample_pdf_file(dir.path(), "a4.pdf", 1);

        let output = dir.path().join("merged.pdf");
        let job = MergeJob::new(
            vec![item(&a1), item(&a2), item(&a3), item(&a4)],
            &output,
        );
        let result = MergeEngine::new()
            .run(&job, &mut NullMonitor, &CancelToken::new())
            .unwrap();

        assert_eq!(result.items_included, 3);
        assert_eq!(result.items_skipped, 1);
        assert!(matches!(
            result.outcomes[2].disposition,
            ItemDisposition::Skipped {
                reason: SkipReason::CorruptDocument
            }
        ));

        let merged = Document::load(&output).unwrap();
        assert_eq!(merged.get_pages().len(), 4);
    }

    #[test]
    fn all_skipped_fails_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let bad1 = dir.path().join("x1.pdf");
        let bad2 = dir.path().join("x2.pdf");
        std::fs::write(&bad1, b"junk").unwrap();
        std::fs::write(&bad2, b"more junk").unwrap();

        let output = dir.path().join("merged.pdf");
        let job = MergeJob::new(vec![item(&bad1), item(&bad2)], &output);
        let err = MergeEngine::new()
            .run(&job, &mut NullMonitor, &CancelToken::new())
            .unwrap_err();

        assert!(matches!(err, QuireError::AllItemsSkipped));
        assert!(!output.exists());
    }

    #[test]
    fn encrypted_items_get_one_empty_password_attempt() {
        let dir = tempfile::tempdir().unwrap();
        let plain = sample_pdf_file(dir.path(), "b1.pdf", 1);
        let blank_pass = dir.path().join("b2.pdf");
        std::fs::write(
            &blank_pass,
            quire_document::testutil::encrypted_blank_password_pdf(),
        )
        .unwrap();
        let locked = dir.path().join("b3.pdf");
        std::fs::write(&locked, quire_document::testutil::encrypted_locked_pdf()).unwrap();

        let output = dir.path().join("out.pdf");
        let job = MergeJob::new(
            vec![item(&plain), item(&blank_pass), item(&locked)],
            &output,
        );
        let result = MergeEngine::new()
            .run(&job, &mut NullMonitor, &CancelToken::new())
            .unwrap();

        assert_eq!(result.items_included, 2);
        assert_eq!(result.items_skipped, 1);
        assert!(matches!(
            result.outcomes[2].disposition,
            ItemDisposition::Skipped {
                reason: SkipReason::EncryptedDocument
            }
        ));

        let merged = Document::load(&output).unwrap();
        assert_eq!(merged.get_pages().len(), 2);
    }

    #[test]
    fn images_are_converted_to_single_pages() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = sample_pdf_file(dir.path(), "body.pdf", 2);
        let png = png_fixture(dir.path(), "cover.png");

        let output = dir.path().join("book.pdf");
        let job = MergeJob::new(vec![item(&png), item(&pdf)], &output);
        let result = MergeEngine::new()
            .run(&job, &mut NullMonitor, &CancelToken::new())
            .unwrap();

        assert_eq!(result.items_included, 2);
        let merged = Document::load(&output).unwrap();
        assert_eq!(merged.get_pages().len(), 3);
    }

    #[test]
    fn items_are_sorted_at_construction() {
        let dir = tempfile::tempdir().unwrap();
        let p10 = sample_pdf_file(dir.path(), "p10.pdf", 1);
        let p2 = sample_pdf_file(dir.path(), "p2.pdf", 1);

        let job = MergeJob::new(
            vec![item(&p10), item(&p2)],
            dir.path().join("out.pdf"),
        );
        let names: Vec<String> = job.items().iter().map(|i| i.display_name()).collect();
        assert_eq!(names, vec!["p2.pdf", "p10.pdf"]);
    }

    #[test]
    fn unsupported_extension_is_the_safety_net() {
        let dir = tempfile::tempdir().unwrap();
        let txt = dir.path().join("notes.txt");
        std::fs::write(&txt, b"hello").unwrap();
        let pdf = sample_pdf_file(dir.path(), "real.pdf", 1);

        // Hand-built item that the resolver would have filtered out.
        let rogue = SourceItem {
            path: txt.clone(),
            kind: SourceKind::Image,
            sort_key: NaturalSortKey::from_path(&txt),
        };

        let output = dir.path().join("out.pdf");
        let job = MergeJob::new(vec![rogue, item(&pdf)], &output);
        let result = MergeEngine::new()
            .run(&job, &mut NullMonitor, &CancelToken::new())
            .unwrap();

        assert_eq!(result.items_skipped, 1);
        assert!(matches!(
            result.outcomes[0].disposition,
            ItemDisposition::Skipped {
                reason: SkipReason::UnsupportedFileType
            }
        ));
    }

    #[test]
    fn progress_is_monotone_with_fixed_total() {
        let dir = tempfile::tempdir().unwrap();
        let a = sample_pdf_file(dir.path(), "a.pdf", 1);
        let b = sample_pdf_file(dir.path(), "b.pdf", 1);

        let mut recorder = Recorder::default();
        let job = MergeJob::new(vec![item(&a), item(&b)], dir.path().join("out.pdf"));
        MergeEngine::new()
            .run(&job, &mut recorder, &CancelToken::new())
            .unwrap();

        let ticks = &recorder.progress;
        assert!(ticks.windows(2).all(|w| w[0].0 <= w[1].0));
        assert!(ticks.iter().all(|&(_, total)| total == 2));
        assert_eq!(*ticks.last().unwrap(), (2, 2));
    }

    #[test]
    fn cancelled_token_stops_before_items() {
        let dir = tempfile::tempdir().unwrap();
        let a = sample_pdf_file(dir.path(), "a.pdf", 1);
        let output = dir.path().join("out.pdf");

        let token = CancelToken::new();
        token.cancel();
        let job = MergeJob::new(vec![item(&a)], &output);
        let err = MergeEngine::new()
            .run(&job, &mut NullMonitor, &token)
            .unwrap_err();

        assert!(matches!(err, QuireError::Cancelled));
        assert!(!output.exists());
    }

    #[test]
    fn output_parent_directories_are_created() {
        let dir = tempfile::tempdir().unwrap();
        let a = sample_pdf_file(dir.path(), "a.pdf", 1);
        let output = dir.path().join("deep/nested/out.pdf");

        let job = MergeJob::new(vec![item(&a)], &output);
        MergeEngine::new()
            .run(&job, &mut NullMonitor, &CancelToken::new())
            .unwrap();
        assert!(output.is_file());
    }

    #[test]
    fn split_then_merge_round_trips_page_count() {
        let dir = tempfile::tempdir().unwrap();
        let source = sample_pdf_file(dir.path(), "original.pdf", 3);
        let pages_dir = dir.path().join("pages");

        let split_job = SplitJob {
            source_path: source,
            output_dir: pages_dir.clone(),
            mode: SplitMode::Pdf,
        };
        SplitEngine::new(&EngineConfig::default())
            .run(&split_job, &mut NullMonitor, &CancelToken::new())
            .unwrap();

        let items = resolve(&InputSpec::Path(pages_dir)).unwrap();
        assert_eq!(items.len(), 3);

        let output = dir.path().join("rebuilt.pdf");
        let merge_job = MergeJob::new(items, &output);
        let result = MergeEngine::new()
            .run(&merge_job, &mut NullMonitor, &CancelToken::new())
            .unwrap();

        assert_eq!(result.items_included, 3);
        let rebuilt = Document::load(&output).unwrap();
        assert_eq!(rebuilt.get_pages().len(), 3);
    }
}
