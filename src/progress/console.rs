//! Terminal progress bars

use super::{ProgressEvent, ProgressHandler};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::Mutex;

const BAR_TEMPLATE: &str = "{msg:<24} [{bar:30}] {percent:>3}%";
const SPINNER_TEMPLATE: &str = "{msg:<24} {spinner} {bytes}";

/// Renders one progress bar per stage on stderr
///
/// Only one bar is live at a time; the pipelines are sequential.
pub struct ConsoleHandler {
    bar: Mutex<Option<ProgressBar>>,
    draw_target: fn() -> ProgressDrawTarget,
}

impl Default for ConsoleHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleHandler {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
            draw_target: ProgressDrawTarget::stderr,
        }
    }

    /// Handler that tracks state without drawing anything
    pub fn hidden() -> Self {
        Self {
            bar: Mutex::new(None),
            draw_target: ProgressDrawTarget::hidden,
        }
    }

    fn start(&self, message: String, length: Option<u64>) {
        let bar = match length {
            Some(len) => ProgressBar::with_draw_target(Some(len), (self.draw_target)())
                .with_style(bar_style()),
            None => ProgressBar::with_draw_target(None, (self.draw_target)())
                .with_style(spinner_style()),
        };
        bar.set_message(message);

        if let Ok(mut slot) = self.bar.lock() {
            if let Some(previous) = slot.replace(bar) {
                previous.finish_and_clear();
            }
        }
    }

    fn update(&self, position: u64, length: Option<u64>) {
        if let Ok(slot) = self.bar.lock() {
            if let Some(bar) = slot.as_ref() {
                if let Some(len) = length.filter(|len| *len > 0) {
                    if bar.length() != Some(len) {
                        bar.set_length(len);
                        bar.set_style(bar_style());
                    }
                }
                bar.set_position(position);
            }
        }
    }

    fn finish(&self, message: String) {
        if let Ok(mut slot) = self.bar.lock() {
            if let Some(bar) = slot.take() {
                bar.finish_with_message(message);
            }
        }
    }

    /// Position of the live bar, if any
    pub fn position(&self) -> Option<u64> {
        self.bar
            .lock()
            .ok()
            .and_then(|slot| slot.as_ref().map(|bar| bar.position()))
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template(BAR_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template(SPINNER_TEMPLATE).unwrap_or_else(|_| ProgressStyle::default_spinner())
}

impl ProgressHandler for ConsoleHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::DownloadStarted { artifact, .. } => {
                self.start(format!("Downloading {}", artifact), None);
            }
            ProgressEvent::DownloadProgress {
                bytes_read,
                total_bytes,
                ..
            } => self.update(*bytes_read, *total_bytes),
            ProgressEvent::DownloadComplete { artifact, .. } => {
                self.finish(format!("Downloaded {}", artifact));
            }
            ProgressEvent::ExtractProgress {
                artifact,
                processed,
                total,
            } => {
                if *processed <= 1 {
                    self.start(format!("Extracting {}", artifact), Some(*total as u64));
                }
                self.update(*processed as u64, Some(*total as u64));
            }
            ProgressEvent::ExtractComplete { artifact, .. } => {
                self.finish(format!("Extracted {}", artifact));
            }
            ProgressEvent::DeclarationBatch { processed, total } => {
                if self.position().is_none() {
                    self.start("Generating d.ts files".to_string(), Some(*total as u64));
                }
                self.update(*processed as u64, Some(*total as u64));
                if processed >= total {
                    self.finish("Generated d.ts files".to_string());
                }
            }
            ProgressEvent::BuildConfigWritten { .. } | ProgressEvent::ReferencesWritten { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_bar_lifecycle() {
        let handler = ConsoleHandler::hidden();

        handler.on_progress(&ProgressEvent::DownloadStarted {
            artifact: "PROTOBUF".to_string(),
            url: "https://example.com/protobuf.zip".to_string(),
        });
        assert_eq!(handler.position(), Some(0));

        handler.on_progress(&ProgressEvent::DownloadProgress {
            artifact: "PROTOBUF".to_string(),
            bytes_read: 8192,
            total_bytes: Some(16384),
        });
        assert_eq!(handler.position(), Some(8192));

        handler.on_progress(&ProgressEvent::DownloadComplete {
            artifact: "PROTOBUF".to_string(),
            bytes: 16384,
        });
        assert_eq!(handler.position(), None);
    }

    #[test]
    fn test_declaration_batches_finish_bar() {
        let handler = ConsoleHandler::hidden();

        handler.on_progress(&ProgressEvent::DeclarationBatch {
            processed: 15,
            total: 16,
        });
        assert_eq!(handler.position(), Some(15));

        handler.on_progress(&ProgressEvent::DeclarationBatch {
            processed: 16,
            total: 16,
        });
        assert_eq!(handler.position(), None);
    }
}
