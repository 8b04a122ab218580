//! Deterministic source tree traversal with suffix exclusions

use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Closure library files that closurets cannot handle, plus our own aggregate
pub const CLOSURE_LIBRARY_EXCLUSIONS: [&str; 4] = [
    "doc/js/article_test.js",
    "closure/goog/demos/autocompleteremotedata.js",
    "closure/goog/demos/autocompleterichremotedata.js",
    "all.d.ts",
];

/// Path as a `/` separated string
pub fn normalize(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Path suffixes that are never processed
///
/// A suffix matches on segment boundaries only: `all.d.ts` excludes
/// `lib/all.d.ts` but not `lib/small.d.ts`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    suffixes: Vec<String>,
}

impl ExclusionSet {
    pub fn new<I, S>(suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let suffixes = suffixes
            .into_iter()
            .map(|s| s.as_ref().replace('\\', "/").trim_start_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .collect();
        Self { suffixes }
    }

    pub fn closure_library() -> Self {
        Self::new(CLOSURE_LIBRARY_EXCLUSIONS)
    }

    pub fn len(&self) -> usize {
        self.suffixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.suffixes.is_empty()
    }

    pub fn matches(&self, path: &Path) -> bool {
        let path = normalize(path);
        self.suffixes.iter().any(|suffix| {
            path == *suffix
                || path
                    .strip_suffix(suffix.as_str())
                    .is_some_and(|head| head.ends_with('/'))
        })
    }
}

/// A directory tree that can be traversed any number of times
#[derive(Debug, Clone)]
pub struct SourceTree {
    root: PathBuf,
    exclusions: ExclusionSet,
}

impl SourceTree {
    pub fn new(root: impl Into<PathBuf>, exclusions: ExclusionSet) -> Self {
        Self {
            root: root.into(),
            exclusions,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn exclusions(&self) -> &ExclusionSet {
        &self.exclusions
    }

    /// Files below the root with the given extension (`"js"` or `".js"`)
    ///
    /// Depth-first, entries sorted by file name, symlinks not followed and no
    /// ignore files honoured. Unreadable entries are logged and skipped. The
    /// walk is lazy and has no side effects.
    pub fn traverse<'a>(&'a self, extension: &'a str) -> impl Iterator<Item = PathBuf> + 'a {
        let extension = extension.trim_start_matches('.');

        WalkBuilder::new(&self.root)
            .standard_filters(false)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .build()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    warn!(error = %err, "Failed to read directory entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
            .map(|entry| entry.into_path())
            .filter(move |path| path.extension().is_some_and(|ext| ext == extension))
            .filter(move |path| !self.exclusions.matches(path))
    }

    /// `/` separated path of `path` relative to the root
    pub fn relative(&self, path: &Path) -> String {
        normalize(path.strip_prefix(&self.root).unwrap_or(path))
    }
}
