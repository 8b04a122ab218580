//! Progress handler trait and events

use std::path::PathBuf;

/// Events emitted while the pipelines make progress
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Archive download started
    DownloadStarted { artifact: String, url: String },

    /// A chunk of the archive arrived
    DownloadProgress {
        artifact: String,
        bytes_read: u64,
        /// Declared content length, if the server reported a usable one
        total_bytes: Option<u64>,
    },

    /// Archive fully buffered
    DownloadComplete { artifact: String, bytes: u64 },

    /// One archive entry handled (extracted or skipped)
    ExtractProgress {
        artifact: String,
        processed: usize,
        total: usize,
    },

    /// All archive entries handled
    ExtractComplete {
        artifact: String,
        extracted: usize,
        skipped: usize,
    },

    /// Generated build configuration written
    BuildConfigWritten { path: PathBuf },

    /// A declaration batch finished
    DeclarationBatch { processed: usize, total: usize },

    /// Aggregate reference file written
    ReferencesWritten { path: PathBuf, entries: usize },
}

impl ProgressEvent {
    /// Completion percentage for events that carry one
    ///
    /// Returns `None` for events without a measurable total, including downloads
    /// whose content length is unknown or zero.
    pub fn percent(&self) -> Option<u8> {
        match self {
            ProgressEvent::DownloadProgress {
                bytes_read,
                total_bytes: Some(total),
                ..
            } => ratio(*bytes_read, *total),
            ProgressEvent::ExtractProgress {
                processed, total, ..
            }
            | ProgressEvent::DeclarationBatch { processed, total } => {
                ratio(*processed as u64, *total as u64)
            }
            ProgressEvent::DownloadComplete { .. }
            | ProgressEvent::ExtractComplete { .. }
            | ProgressEvent::BuildConfigWritten { .. }
            | ProgressEvent::ReferencesWritten { .. } => Some(100),
            _ => None,
        }
    }
}

fn ratio(done: u64, total: u64) -> Option<u8> {
    if total == 0 {
        return None;
    }
    Some((done.min(total) * 100 / total) as u8)
}

/// Trait for observing pipeline progress
pub trait ProgressHandler: Send + Sync {
    /// Called when a progress event occurs
    fn on_progress(&self, event: &ProgressEvent);
}

/// No-op handler that ignores all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHandler;

impl ProgressHandler for NoOpHandler {
    fn on_progress(&self, _event: &ProgressEvent) {
        // Intentionally empty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingHandler {
        count: Arc<AtomicUsize>,
    }

    impl ProgressHandler for CountingHandler {
        fn on_progress(&self, _event: &ProgressEvent) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn download(bytes_read: u64, total_bytes: Option<u64>) -> ProgressEvent {
        ProgressEvent::DownloadProgress {
            artifact: "PROTOBUF".to_string(),
            bytes_read,
            total_bytes,
        }
    }

    #[test]
    fn test_noop_handler() {
        let handler = NoOpHandler;
        handler.on_progress(&ProgressEvent::DeclarationBatch {
            processed: 1,
            total: 2,
        });
    }

    #[test]
    fn test_handler_receives_events() {
        let count = Arc::new(AtomicUsize::new(0));
        let handler = CountingHandler {
            count: count.clone(),
        };

        handler.on_progress(&download(8192, Some(16384)));
        handler.on_progress(&ProgressEvent::BuildConfigWritten {
            path: PathBuf::from("build.ini"),
        });

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_download_percent() {
        assert_eq!(download(0, Some(100)).percent(), Some(0));
        assert_eq!(download(8192, Some(16384)).percent(), Some(50));
        assert_eq!(download(16384, Some(16384)).percent(), Some(100));
    }

    #[test]
    fn test_unknown_length_is_indeterminate() {
        assert_eq!(download(8192, None).percent(), None);
        assert_eq!(download(8192, Some(0)).percent(), None);
    }

    #[test]
    fn test_percent_is_capped() {
        // Servers occasionally under-report the length
        assert_eq!(download(300, Some(100)).percent(), Some(100));
    }

    #[test]
    fn test_batch_percent() {
        let event = ProgressEvent::DeclarationBatch {
            processed: 15,
            total: 31,
        };
        assert_eq!(event.percent(), Some(48));

        let empty = ProgressEvent::DeclarationBatch {
            processed: 0,
            total: 0,
        };
        assert_eq!(empty.percent(), None);
    }
}
