// SPDX-License-Identifier: MIT
//
// Split engine — one source PDF in, N per-page artifacts out.
//
// PDF mode extracts each page into its own single-page PDF. Image mode hands
// the whole document to the rasterizer collaborator in one blocking call and
// then encodes each rendered page. A malformed source aborts the whole job;
// pages already written before the fault stay on disk.

use std::fs;
use std::path::PathBuf;

use chrono::Utc;
use quire_core::config::EngineConfig;
use quire_core::error::{QuireError, Result};
use quire_core::types::{ImageFormat, JobId, JobResult, SplitMode};
use quire_document::image::PageImage;
use quire_document::pdf::PdfSource;
use quire_document::raster::{PopplerRasterizer, Rasterizer};
use tracing::{info, instrument};

use crate::cancel::CancelToken;
use crate::progress::{JobMonitor, report};

/// Description of one split job.
#[derive(Debug, Clone)]
pub struct SplitJob {
    pub source_path: PathBuf,
    pub output_dir: PathBuf,
    pub mode: SplitMode,
}

/// Splits a PDF into per-page artifacts.
pub struct SplitEngine {
    rasterizer: Box<dyn Rasterizer>,
    jpeg_quality: u8,
}

impl SplitEngine {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            rasterizer: Box::new(PopplerRasterizer::new(config)),
            jpeg_quality: config.jpeg_quality,
        }
    }

    /// Substitute the rasterizer collaborator.
    pub fn with_rasterizer(rasterizer: Box<dyn Rasterizer>, jpeg_quality: u8) -> Self {
        Self {
            rasterizer,
            jpeg_quality,
        }
    }

    /// Run the job to completion on the caller's thread.
    #[instrument(skip_all, fields(source = %job.source_path.display(), mode = ?job.mode))]
    pub fn run(
        &self,
        job: &SplitJob,
        monitor: &mut dyn JobMonitor,
        cancel: &CancelToken,
    ) -> Result<JobResult> {
        let started_at = Utc::now();

        if cancel.is_cancelled() {
            return Err(QuireError::Cancelled);
        }
        if !job.source_path.is_file() {
            return Err(QuireError::InputNotFound(
                job.source_path.display().to_string(),
            ));
        }
        if !job.output_dir.is_dir() {
            fs::create_dir_all(&job.output_dir).map_err(|err| {
                QuireError::OutputPathInvalid(format!("{}: {}", job.output_dir.display(), err))
            })?;
            monitor.status(&format!(
                "created output directory: {}",
                job.output_dir.display()
            ));
        }

        let source = PdfSource::open(&job.source_path)?;
        info!(pages = source.page_count(), "Source opened for splitting");

        let (artifacts, final_message) = match job.mode {
            SplitMode::Pdf => {
                let count = self.split_to_pdfs(&source, job, monitor, cancel)?;
                (count, format!("splitting to PDFs complete ({} pages)", count))
            }
            SplitMode::Image(format) => {
                let count = self.split_to_images(&source, job, monitor, cancel, format)?;
                (
                    count,
                    format!("splitting to images complete ({} pages)", count),
                )
            }
        };

        monitor.status(&final_message);
        Ok(JobResult {
            job_id: JobId::new(),
            items_included: artifacts,
            items_skipped: 0,
            outcomes: Vec::new(),
            final_message,
            started_at,
            finished_at: Utc::now(),
        })
    }

    fn split_to_pdfs(
        &self,
        source: &PdfSource,
        job: &SplitJob,
        monitor: &mut dyn JobMonitor,
        cancel: &CancelToken,
    ) -> Result<u32> {
        let total = source.page_count() as u32;
        let base = source.file_stem();
        report(monitor, 0, total as u64);

        // 1-indexed, unpadded, matching the source page numbers.
        for page_number in 1..=total {
            if cancel.is_cancelled() {
                return Err(QuireError::Cancelled);
            }
            let bytes = source.extract_page(page_number)?;
            let file_name = format!("{}_page_{}.pdf", base, page_number);
            fs::write(job.output_dir.join(&file_name), &bytes)?;
            monitor.status(&format!("created: {}", file_name));
            report(monitor, page_number as u64, total as u64);
        }

        Ok(total)
    }

    fn split_to_images(
        &self,
        source: &PdfSource,
        job: &SplitJob,
        monitor: &mut dyn JobMonitor,
        cancel: &CancelToken,
        format: ImageFormat,
    ) -> Result<u32> {
        // Single blocking call for the whole document; no progress
        // granularity exists inside it.
        monitor.status("converting PDF pages to images (this may take a while)");
        report(monitor, 0, 1);
        let pages = self.rasterizer.rasterize(&job.source_path)?;
        report(monitor, 1, 1);

        let total = pages.len() as u32;
        let base = source.file_stem();
        report(monitor, 0, total as u64);

        for (index, page) in pages.into_iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(QuireError::Cancelled);
            }
            let page_number = index as u32 + 1;

            let mut image = PageImage::from_dynamic(page);
            if format == ImageFormat::Jpg && image.has_alpha() {
                image = image.into_opaque_rgb();
            }

            let file_name = format!("{}_page_{}.{}", base, page_number, format.extension());
            image.save(job.output_dir.join(&file_name), format, self.jpeg_quality)?;
            monitor.status(&format!("saved: {}", file_name));
            report(monitor, page_number as u64, total as u64);
        }

        Ok(total)
    }
}
