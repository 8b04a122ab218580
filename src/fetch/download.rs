//! Archive download with chunked progress reporting

use super::FetchError;
use crate::progress::{ProgressEvent, ProgressHandler};
use reqwest::blocking::Client;
use sha2::{Digest, Sha256};
use std::io::{self, Read};
use std::time::Duration;
use tracing::{debug, info};

/// Bytes read from the network per progress update
pub const CHUNK_SIZE: usize = 8192;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Downloads archives into memory
pub struct Downloader {
    client: Client,
}

impl Downloader {
    /// Creates a downloader without a request timeout
    ///
    /// Toolchain archives are large; a slow mirror should finish rather than fail.
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(None::<Duration>)
            .build()
            .map_err(|e| FetchError::Download {
                url: String::new(),
                message: format!("failed to initialize HTTP client: {}", e),
            })?;
        Ok(Self { client })
    }

    /// Downloads `url` into a buffer, reporting progress for `artifact`
    pub fn download(
        &self,
        url: &str,
        artifact: &str,
        progress: &dyn ProgressHandler,
    ) -> Result<Vec<u8>, FetchError> {
        let download_error = |message: String| FetchError::Download {
            url: url.to_string(),
            message,
        };

        info!(artifact, url, "Downloading {}", artifact);
        progress.on_progress(&ProgressEvent::DownloadStarted {
            artifact: artifact.to_string(),
            url: url.to_string(),
        });

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| download_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(download_error(format!("server responded with {}", status)));
        }

        let total = response.content_length().filter(|len| *len > 0);
        if total.is_none() {
            debug!(artifact, "No content length reported, progress is indeterminate");
        }

        let data = read_with_progress(response, total, artifact, progress)
            .map_err(|e| download_error(e.to_string()))?;

        progress.on_progress(&ProgressEvent::DownloadComplete {
            artifact: artifact.to_string(),
            bytes: data.len() as u64,
        });
        debug!(artifact, bytes = data.len(), "Download finished");

        Ok(data)
    }
}

/// Drains `reader` in [`CHUNK_SIZE`] chunks, emitting a progress event per chunk
pub fn read_with_progress<R: Read>(
    mut reader: R,
    total_bytes: Option<u64>,
    artifact: &str,
    progress: &dyn ProgressHandler,
) -> io::Result<Vec<u8>> {
    let capacity = total_bytes.and_then(|t| usize::try_from(t).ok()).unwrap_or(0);
    let mut data = Vec::with_capacity(capacity);
    let mut chunk = [0u8; CHUNK_SIZE];

    loop {
        let read = match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        data.extend_from_slice(&chunk[..read]);

        progress.on_progress(&ProgressEvent::DownloadProgress {
            artifact: artifact.to_string(),
            bytes_read: data.len() as u64,
            total_bytes,
        });
    }

    Ok(data)
}

/// Hex encoded SHA-256 of `data`
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Compares the archive digest with the expected hex value (case-insensitive)
pub fn verify_sha256(data: &[u8], expected: &str, artifact: &str) -> Result<(), FetchError> {
    let actual = sha256_hex(data);
    if actual.eq_ignore_ascii_case(expected.trim()) {
        debug!(artifact, "Checksum verified");
        Ok(())
    } else {
        Err(FetchError::ChecksumMismatch {
            artifact: artifact.to_string(),
            expected: expected.trim().to_lowercase(),
            actual,
        })
    }
}
