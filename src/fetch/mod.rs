//! Acquisition of the versioned toolchain archives
//!
//! Each archive goes through download → optional checksum verification →
//! extraction. Failures are fatal; nothing is retried.

pub mod download;
pub mod extract;

pub use download::{read_with_progress, sha256_hex, verify_sha256, Downloader, CHUNK_SIZE};
pub use extract::{extract_all, ExtractFilter, ExtractSummary};

use crate::config::Dependency;
use crate::progress::ProgressHandler;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to download {url}: {message}")]
    Download { url: String, message: String },

    #[error("Corrupt archive for {artifact}: {message}")]
    Archive { artifact: String, message: String },

    #[error("Checksum mismatch for {artifact}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        artifact: String,
        expected: String,
        actual: String,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
}

impl FetchError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        FetchError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Downloads, verifies and unpacks one dependency at a time
pub struct ArtifactFetcher {
    downloader: Downloader,
    progress: Arc<dyn ProgressHandler>,
}

impl ArtifactFetcher {
    pub fn new(progress: Arc<dyn ProgressHandler>) -> Result<Self, FetchError> {
        Ok(Self {
            downloader: Downloader::new()?,
            progress,
        })
    }

    /// Fetches `dependency` and extracts it into `target_dir`
    pub fn fetch(
        &self,
        dependency: &Dependency,
        target_dir: &Path,
    ) -> Result<ExtractSummary, FetchError> {
        let artifact = dependency.kind.display_name();
        let data = self
            .downloader
            .download(&dependency.url, artifact, self.progress.as_ref())?;

        if let Some(expected) = &dependency.sha256 {
            verify_sha256(&data, expected, artifact)?;
        }

        let filter = ExtractFilter::for_kind(dependency.kind);
        let summary = extract_all(
            &data,
            target_dir,
            artifact,
            |name| filter.skips(name),
            self.progress.as_ref(),
        )?;

        info!(
            artifact,
            version = %dependency.version,
            extracted = summary.extracted,
            skipped = summary.skipped,
            target = %target_dir.display(),
            "Installed {}", artifact
        );
        Ok(summary)
    }
}
