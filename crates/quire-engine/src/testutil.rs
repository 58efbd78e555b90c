// SPDX-License-Identifier: MIT
//
// Shared fixtures for the engine tests.

use std::path::{Path, PathBuf};

use crate::progress::JobMonitor;

/// Monitor that records every status line and progress tick.
#[derive(Default)]
pub struct Recorder {
    pub statuses: Vec<String>,
    pub progress: Vec<(u64, u64)>,
}

impl JobMonitor for Recorder {
    fn status(&mut self, message: &str) {
        self.statuses.push(message.to_string());
    }

    fn progress(&mut self, current: u64, total: u64) {
        self.progress.push((current, total));
    }
}

/// Write a PDF with `pages` empty letter-sized pages into `dir`.
pub fn sample_pdf_file(dir: &Path, name: &str, pages: usize) -> PathBuf {
    let path = dir.join(name);
    let mut doc = quire_document::testutil::sample_document(pages);
    doc.save(&path).unwrap();
    path
}
