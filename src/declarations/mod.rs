//! TypeScript declaration generation for the closure library
//!
//! The closure library sources are handed to closurets in batches, which
//! writes a `.d.ts` next to every `.js` file. Afterwards the generated files
//! are stitched together: `<library>/all.d.ts` references every declaration
//! file, and a top-level `<parent>.d.ts` references `all.d.ts`, so a single
//! reference pulls in the whole set.

pub mod batch;
pub mod walker;

pub use batch::{batch_count, file_batches, DEFAULT_BATCH_SIZE};
pub use walker::{normalize, ExclusionSet, SourceTree, CLOSURE_LIBRARY_EXCLUSIONS};

use crate::config::{BuildSettings, ConfigError, ToolchainConfig};
use crate::error::PipelineError;
use crate::process::{ProcessRunner, ToolCommand};
use crate::progress::{ProgressEvent, ProgressHandler};
use crate::util::write_atomic;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Aggregate written inside the traversed root
pub const AGGREGATE_FILE: &str = "all.d.ts";

/// Ordered list of relative paths rendered as reference directives
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceManifest {
    entries: Vec<String>,
}

impl ReferenceManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, relative_path: impl AsRef<str>) {
        let entry = relative_path.as_ref().replace('\\', "/");
        let entry = entry.trim_start_matches("./").trim_start_matches('/');
        self.entries.push(entry.to_string());
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|entry| format!("/// <reference path=\"./{}\" />\n", entry))
            .collect()
    }
}

impl<S: AsRef<str>> FromIterator<S> for ReferenceManifest {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut manifest = ReferenceManifest::new();
        for entry in iter {
            manifest.push(entry);
        }
        manifest
    }
}

/// Location of the top-level aggregate for `root` and the path it references
///
/// For `closure-library/closure-library-20170124` this is
/// `closure-library/closure-library.d.ts` referencing
/// `closure-library-20170124/all.d.ts`.
pub fn top_level_aggregate(root: &Path) -> (PathBuf, String) {
    let root_name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| ".".to_string());
    let reference = format!("{}/{}", root_name, AGGREGATE_FILE);

    let parent = root.parent().filter(|p| !p.as_os_str().is_empty());
    let path = match parent.and_then(|p| p.file_name().map(|name| (p, name))) {
        Some((parent, name)) => parent.join(format!("{}.d.ts", name.to_string_lossy())),
        None => root.with_file_name(format!("{}.d.ts", root_name)),
    };
    (path, reference)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationReport {
    pub files: usize,
    pub batches: usize,
    pub failed_batches: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StitchReport {
    pub aggregate: PathBuf,
    pub top_level: PathBuf,
    pub entries: usize,
}

/// Generate-then-stitch pipeline over one library root
pub struct DeclarationPipeline<R: ProcessRunner> {
    tree: SourceTree,
    toolchain: ToolchainConfig,
    project_dir: PathBuf,
    runner: R,
    progress: Arc<dyn ProgressHandler>,
}

impl<R: ProcessRunner> DeclarationPipeline<R> {
    pub fn new(
        root: impl Into<PathBuf>,
        toolchain: ToolchainConfig,
        project_dir: impl Into<PathBuf>,
        runner: R,
        progress: Arc<dyn ProgressHandler>,
    ) -> Self {
        let project_dir = project_dir.into();
        let root = project_dir.join(root.into());
        Self {
            tree: SourceTree::new(root, ExclusionSet::closure_library()),
            toolchain,
            project_dir,
            runner,
            progress,
        }
    }

    /// Pipeline over the closure library named in `build.ini`
    pub fn from_settings(
        settings: &BuildSettings,
        toolchain: ToolchainConfig,
        project_dir: impl Into<PathBuf>,
        runner: R,
        progress: Arc<dyn ProgressHandler>,
    ) -> Self {
        Self::new(
            &settings.closure_library,
            toolchain,
            project_dir,
            runner,
            progress,
        )
    }

    pub fn with_exclusions(mut self, exclusions: ExclusionSet) -> Self {
        self.tree = SourceTree::new(self.tree.root().to_path_buf(), exclusions);
        self
    }

    pub fn tree(&self) -> &SourceTree {
        &self.tree
    }

    pub fn generator_command(&self, batch: &[PathBuf]) -> ToolCommand {
        ToolCommand::new(&self.toolchain.closurets)
            .args(batch)
            .current_dir(&self.project_dir)
    }

    /// Runs the generator over `files`, one batch at a time
    ///
    /// A batch that exits non-zero is logged and counted; the remaining
    /// batches still run. Failing to start the generator is fatal.
    pub fn generate_declarations(
        &self,
        files: &[PathBuf],
    ) -> Result<GenerationReport, PipelineError> {
        let total = files.len();
        let mut report = GenerationReport {
            files: total,
            ..Default::default()
        };
        info!(files = total, "Generating d.ts files");

        let mut processed = 0;
        for batch in file_batches(files, self.toolchain.batch_size) {
            let status = self.runner.run(&self.generator_command(batch))?;
            report.batches += 1;
            processed += batch.len();

            if !status.success() {
                report.failed_batches += 1;
                warn!(
                    code = ?status.code,
                    first = %batch[0].display(),
                    files = batch.len(),
                    "closurets failed for batch"
                );
            }

            self.progress
                .on_progress(&ProgressEvent::DeclarationBatch { processed, total });
        }

        Ok(report)
    }

    /// Writes the aggregate reference files for every declaration under the root
    pub fn stitch_references(&self) -> Result<StitchReport, PipelineError> {
        let manifest: ReferenceManifest = self
            .tree
            .traverse("ts")
            .map(|path| self.tree.relative(&path))
            .collect();

        let aggregate = self.tree.root().join(AGGREGATE_FILE);
        write_atomic(&aggregate, &manifest.render())?;
        self.progress.on_progress(&ProgressEvent::ReferencesWritten {
            path: aggregate.clone(),
            entries: manifest.len(),
        });

        let (top_level, reference) = top_level_aggregate(self.tree.root());
        let top_manifest: ReferenceManifest = std::iter::once(reference).collect();
        write_atomic(&top_level, &top_manifest.render())?;
        self.progress.on_progress(&ProgressEvent::ReferencesWritten {
            path: top_level.clone(),
            entries: top_manifest.len(),
        });

        info!(
            entries = manifest.len(),
            aggregate = %aggregate.display(),
            top_level = %top_level.display(),
            "Reference files generated"
        );
        Ok(StitchReport {
            aggregate,
            top_level,
            entries: manifest.len(),
        })
    }

    /// Generates declarations for every `.js` file, then stitches the references
    pub fn run(&self) -> Result<(GenerationReport, StitchReport), PipelineError> {
        let root = self.tree.root();
        if !root.is_dir() {
            return Err(ConfigError::Invalid(format!(
                "Closure library not found at {}; run setup first",
                root.display()
            ))
            .into());
        }

        let files: Vec<PathBuf> = self.tree.traverse("js").collect();
        let generation = self.generate_declarations(&files)?;
        let stitch = self.stitch_references()?;

        if generation.failed_batches > 0 {
            return Err(PipelineError::GenerationFailed {
                failed: generation.failed_batches,
                total: generation.batches,
            });
        }

        info!("Generation done!");
        Ok((generation, stitch))
    }
}
