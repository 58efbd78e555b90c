// SPDX-License-Identifier: MIT
//
// Rasterizer collaborator — renders every page of a PDF to a raster image.
//
// The engine never rasterizes PDFs itself; it calls this interface once per
// split-to-images job. The bundled implementation shells out to Poppler's
// `pdftoppm`, the same external tool the rest of the ecosystem leans on.
// Failures carry an explicit kind so callers never have to sniff diagnostic
// text to tell "tool not installed" from "tool choked on this document".

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use image::DynamicImage;
use quire_core::config::EngineConfig;
use quire_core::error::QuireError;
use quire_core::sort::NaturalSortKey;
use thiserror::Error;
use tracing::{debug, info, instrument};

const PDFTOPPM: &str = "pdftoppm";
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Failure modes of a rasterizer invocation.
#[derive(Debug, Error)]
pub enum RasterError {
    /// The external tool binary could not be found or started.
    #[error("rasterizer executable not found: {0}")]
    ToolMissing(String),

    /// The tool ran but exited unsuccessfully.
    #[error("rasterizer exited with status {status}: {stderr}")]
    ToolFailed { status: i32, stderr: String },

    /// The tool exceeded the configured time budget and was killed.
    #[error("rasterizer timed out after {0:?}")]
    Timeout(Duration),

    /// A rendered page could not be decoded back into an image.
    #[error("failed to decode rasterized page: {0}")]
    Decode(String),

    #[error("rasterizer I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<RasterError> for QuireError {
    fn from(err: RasterError) -> Self {
        match err {
            RasterError::ToolMissing(_) | RasterError::Timeout(_) => {
                QuireError::ExternalToolFailure(err.to_string())
            }
            RasterError::ToolFailed { .. } => {
                QuireError::Pdf(format!("rasterization failed: {}", err))
            }
            RasterError::Decode(message) => QuireError::Image(message),
            RasterError::Io(inner) => QuireError::Io(inner),
        }
    }
}

/// Renders a whole PDF to a sequence of page images, in page order.
pub trait Rasterizer {
    fn rasterize(&self, source: &Path) -> Result<Vec<DynamicImage>, RasterError>;
}

/// `pdftoppm`-backed rasterizer.
///
/// The tool location hint, DPI, and timeout come from [`EngineConfig`]; a
/// hint of `None` resolves the binary through `PATH`.
pub struct PopplerRasterizer {
    tool_dir: Option<PathBuf>,
    dpi: u32,
    timeout: Option<Duration>,
}

impl PopplerRasterizer {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            tool_dir: config.raster_tool_dir.clone(),
            dpi: config.raster_dpi,
            timeout: config.raster_timeout_secs.map(Duration::from_secs),
        }
    }

    fn executable(&self) -> PathBuf {
        match &self.tool_dir {
            Some(dir) => dir.join(PDFTOPPM),
            None => PathBuf::from(PDFTOPPM),
        }
    }

    /// Check that the external tool can be started at all.
    ///
    /// Callers decide what an unavailable tool means — report it, degrade,
    /// or refuse the job. Nothing here exits the process.
    pub fn verify(&self) -> Result<(), RasterError> {
        let executable = self.executable();
        match Command::new(&executable)
            .arg("-v")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
        {
            Ok(_) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(RasterError::ToolMissing(executable.display().to_string()))
            }
            Err(err) => Err(RasterError::Io(err)),
        }
    }

    fn wait_with_timeout(&self, child: &mut Child) -> Result<ExitStatus, RasterError> {
        let Some(limit) = self.timeout else {
            return Ok(child.wait()?);
        };

        let deadline = Instant::now() + limit;
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                child.kill().ok();
                child.wait().ok();
                return Err(RasterError::Timeout(limit));
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }
}

impl Rasterizer for PopplerRasterizer {
    /// Render every page of `source` to PNG in a scratch directory, then
    /// decode the pages back in natural filename order (pdftoppm numbers
    /// its outputs, zero-padded).
    #[instrument(skip_all, fields(source = %source.display(), dpi = self.dpi))]
    fn rasterize(&self, source: &Path) -> Result<Vec<DynamicImage>, RasterError> {
        let workdir = tempfile::tempdir()?;
        let prefix = workdir.path().join("page");
        let executable = self.executable();

        info!("Rasterizing with {}", executable.display());

        let mut child = Command::new(&executable)
            .arg("-png")
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg(source)
            .arg(&prefix)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| {
                if err.kind() == std::io::ErrorKind::NotFound {
                    RasterError::ToolMissing(executable.display().to_string())
                } else {
                    RasterError::Io(err)
                }
            })?;

        // Drain stderr on its own thread while waiting: a damaged document
        // can produce more diagnostics than the pipe buffer holds, and a full
        // pipe would block the child forever.
        let stderr_pipe = child.stderr.take();
        let stderr_drain = std::thread::spawn(move || {
            let mut buf = String::new();
            if let Some(mut pipe) = stderr_pipe {
                pipe.read_to_string(&mut buf).ok();
            }
            buf
        });

        let status = self.wait_with_timeout(&mut child)?;
        let stderr = stderr_drain.join().unwrap_or_default();
        if !status.success() {
            return Err(RasterError::ToolFailed {
                status: status.code().unwrap_or(-1),
                stderr: stderr.trim().to_string(),
            });
        }

        let mut page_files: Vec<PathBuf> = std::fs::read_dir(workdir.path())?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "png"))
            .collect();
        page_files.sort_by_key(|path| NaturalSortKey::from_path(path));

        let mut pages = Vec::with_capacity(page_files.len());
        for path in &page_files {
            let page = image::open(path)
                .map_err(|err| RasterError::Decode(format!("{}: {}", path.display(), err)))?;
            pages.push(page);
        }

        debug!(pages = pages.len(), "Rasterization complete");
        Ok(pages)
    }
}
