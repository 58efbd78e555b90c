// SPDX-License-Identifier: MIT
//
// quire — split multi-page PDFs into per-page artifacts, or merge PDFs and
// images into one document.

use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use quire_core::config::EngineConfig;
use quire_core::types::{ImageFormat, SplitMode};
use quire_document::raster::PopplerRasterizer;
use quire_engine::cancel::CancelToken;
use quire_engine::fileset::{InputSpec, resolve};
use quire_engine::merge::{MergeEngine, MergeJob};
use quire_engine::progress::JobMonitor;
use quire_engine::split::{SplitEngine, SplitJob};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "quire", version, about = "Split and merge PDF and image files")]
struct Cli {
    /// Path to a JSON engine configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Split a PDF into per-page PDFs or images.
    Split {
        /// Source PDF.
        input: PathBuf,
        /// Directory for the per-page artifacts, created if missing.
        #[arg(short, long)]
        output_dir: PathBuf,
        /// Produce raster images instead of single-page PDFs.
        #[arg(long)]
        images: bool,
        /// Image format for --images.
        #[arg(long, value_enum, default_value_t = FormatArg::Png)]
        format: FormatArg,
    },
    /// Merge PDFs and images into a single PDF, in natural filename order.
    Merge {
        /// Input files, or a single directory to scan.
        inputs: Vec<PathBuf>,
        /// Output PDF path, parent directories created if missing.
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Check that external dependencies are available.
    Doctor,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Png,
    Jpg,
}

impl From<FormatArg> for ImageFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Png => ImageFormat::Png,
            FormatArg::Jpg => ImageFormat::Jpg,
        }
    }
}

/// Prints status lines to stderr so stdout stays clean for the summary.
struct ConsoleMonitor;

impl JobMonitor for ConsoleMonitor {
    fn status(&mut self, message: &str) {
        eprintln!("{}", message);
    }

    fn progress(&mut self, _current: u64, _total: u64) {}
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Command::Split {
            input,
            output_dir,
            images,
            format,
        } => {
            if images {
                PopplerRasterizer::new(&config)
                    .verify()
                    .context("rasterizer unavailable; install Poppler or set raster_tool_dir")?;
            }
            let mode = if images {
                SplitMode::Image(format.into())
            } else {
                SplitMode::Pdf
            };
            let job = SplitJob {
                source_path: input,
                output_dir,
                mode,
            };
            let result =
                SplitEngine::new(&config).run(&job, &mut ConsoleMonitor, &CancelToken::new())?;
            println!("{}", result.final_message);
        }
        Command::Merge { mut inputs, output } => {
            let spec = match inputs.len() {
                0 => bail!("no inputs given; pass files or a directory"),
                1 => InputSpec::Path(inputs.remove(0)),
                _ => InputSpec::Files(inputs),
            };
            let items = resolve(&spec)?;
            if items.is_empty() {
                bail!("no PDF or image files found to merge");
            }
            let job = MergeJob::new(items, output);
            let result =
                MergeEngine::new().run(&job, &mut ConsoleMonitor, &CancelToken::new())?;
            println!("{}", result.final_message);
        }
        Command::Doctor => match PopplerRasterizer::new(&config).verify() {
            Ok(()) => println!("rasterizer: ok (pdftoppm found)"),
            Err(err) => bail!("rasterizer: {}", err),
        },
    }

    Ok(())
}
