//! Logging-based progress handler

use super::{ProgressEvent, ProgressHandler};
use tracing::{debug, info};

/// Handler that logs progress events using tracing
///
/// Chunk-level download events are logged at trace level only; everything
/// else goes to info or debug.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ProgressHandler for LoggingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::DownloadStarted { artifact, url } => {
                info!(artifact = %artifact, url = %url, "Downloading");
            }
            ProgressEvent::DownloadProgress {
                artifact,
                bytes_read,
                total_bytes,
            } => {
                tracing::trace!(
                    artifact = %artifact,
                    bytes_read,
                    total_bytes = ?total_bytes,
                    percent = ?event.percent(),
                    "Download progress"
                );
            }
            ProgressEvent::DownloadComplete { artifact, bytes } => {
                info!(artifact = %artifact, bytes, "Download complete");
            }
            ProgressEvent::ExtractProgress {
                artifact,
                processed,
                total,
            } => {
                tracing::trace!(
                    artifact = %artifact,
                    progress = format!("{}/{}", processed, total),
                    "Extract progress"
                );
            }
            ProgressEvent::ExtractComplete {
                artifact,
                extracted,
                skipped,
            } => {
                info!(artifact = %artifact, extracted, skipped, "Extraction complete");
            }
            ProgressEvent::BuildConfigWritten { path } => {
                info!(path = %path.display(), "Build configuration written");
            }
            ProgressEvent::DeclarationBatch { processed, total } => {
                debug!(
                    progress = format!("{}/{}", processed, total),
                    percent = ?event.percent(),
                    "Declaration batch complete"
                );
            }
            ProgressEvent::ReferencesWritten { path, entries } => {
                info!(path = %path.display(), entries, "Reference file written");
            }
        }
    }
}
