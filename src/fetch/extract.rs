//! Zip extraction with an entry exclusion filter

use super::FetchError;
use crate::config::DependencyKind;
use crate::progress::{ProgressEvent, ProgressHandler};
use std::fs;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Which archive entries to leave out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractFilter {
    /// Extract everything
    All,
    /// Skip JavaScript test scripts (`*test*.js`)
    SkipTestScripts,
}

impl ExtractFilter {
    /// Only the protobuf archive ships test scripts that break the closure build
    pub fn for_kind(kind: DependencyKind) -> Self {
        match kind {
            DependencyKind::Protobuf => ExtractFilter::SkipTestScripts,
            DependencyKind::ClosureLibrary | DependencyKind::ClosureCompiler => ExtractFilter::All,
        }
    }

    /// Whether the entry with this archive name must not be extracted
    pub fn skips(&self, entry_name: &str) -> bool {
        match self {
            ExtractFilter::All => false,
            ExtractFilter::SkipTestScripts => {
                let name = entry_name.replace('\\', "/").to_lowercase();
                name.contains("test") && name.ends_with(".js")
            }
        }
    }
}

/// Counts reported once extraction completes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    pub extracted: usize,
    pub skipped: usize,
}

const S_IFMT: u32 = 0o170000;
const S_IFLNK: u32 = 0o120000;

fn is_symlink(unix_mode: Option<u32>) -> bool {
    unix_mode.is_some_and(|mode| mode & S_IFMT == S_IFLNK)
}

/// Converts an archive entry name into a safe relative path
///
/// Returns `Ok(None)` for names that refer to the archive root.
fn entry_relpath(name: &str) -> Result<Option<PathBuf>, String> {
    let normalized = name.replace('\\', "/");

    if normalized.starts_with('/') {
        return Err(format!("absolute path in entry {:?}", name));
    }
    if normalized
        .split('/')
        .next()
        .is_some_and(|first| first.contains(':'))
    {
        return Err(format!("drive prefix in entry {:?}", name));
    }

    let mut rel = PathBuf::new();
    for part in normalized.split('/') {
        match part {
            "" | "." => continue,
            ".." => return Err(format!("parent traversal in entry {:?}", name)),
            other => rel.push(other),
        }
    }

    Ok(if rel.as_os_str().is_empty() {
        None
    } else {
        Some(rel)
    })
}

/// Extracts every entry of the zip in `data` below `target`, except those
/// `exclude` returns true for
///
/// Symbolic link entries are rejected; the dependency archives never need them.
pub fn extract_all<F>(
    data: &[u8],
    target: &Path,
    artifact: &str,
    exclude: F,
    progress: &dyn ProgressHandler,
) -> Result<ExtractSummary, FetchError>
where
    F: Fn(&str) -> bool,
{
    let archive_error = |message: String| FetchError::Archive {
        artifact: artifact.to_string(),
        message,
    };

    let mut archive =
        zip::ZipArchive::new(Cursor::new(data)).map_err(|e| archive_error(e.to_string()))?;
    let total = archive.len();
    debug!(artifact, entries = total, target = %target.display(), "Extracting archive");

    fs::create_dir_all(target).map_err(|e| FetchError::io(target, e))?;

    let mut summary = ExtractSummary::default();
    for index in 0..total {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| archive_error(e.to_string()))?;
        let name = entry.name().to_string();

        if exclude(&name) {
            trace!(entry = %name, "Skipping excluded entry");
            summary.skipped += 1;
        } else if is_symlink(entry.unix_mode()) {
            return Err(archive_error(format!("symbolic link entry {:?}", name)));
        } else if let Some(rel) = entry_relpath(&name).map_err(archive_error)? {
            let out_path = target.join(rel);
            if entry.is_dir() {
                fs::create_dir_all(&out_path).map_err(|e| FetchError::io(&out_path, e))?;
            } else {
                if let Some(parent) = out_path.parent() {
                    fs::create_dir_all(parent).map_err(|e| FetchError::io(parent, e))?;
                }
                let mut out = fs::File::create(&out_path).map_err(|e| FetchError::io(&out_path, e))?;
                io::copy(&mut entry, &mut out).map_err(|e| match e.kind() {
                    io::ErrorKind::InvalidData => archive_error(format!("{}: {}", name, e)),
                    _ => FetchError::io(&out_path, e),
                })?;
            }
            summary.extracted += 1;
        }

        progress.on_progress(&ProgressEvent::ExtractProgress {
            artifact: artifact.to_string(),
            processed: index + 1,
            total,
        });
    }

    progress.on_progress(&ProgressEvent::ExtractComplete {
        artifact: artifact.to_string(),
        extracted: summary.extracted,
        skipped: summary.skipped,
    });

    Ok(summary)
}
