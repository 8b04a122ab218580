//! Environment provisioning: fetch the toolchains, then generate `build.ini`

pub mod build_config;

pub use build_config::{render_build_config, write_build_config, ProjectLayout};

use crate::config::{Configuration, DependencyKind, DependencyManifest, BUILD_FILE, DEPENDENCY_FILE};
use crate::error::PipelineError;
use crate::fetch::{ArtifactFetcher, ExtractSummary};
use crate::progress::{ProgressEvent, ProgressHandler};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Outcome of a successful setup run
#[derive(Debug, Clone)]
pub struct SetupReport {
    pub installed: Vec<(DependencyKind, ExtractSummary)>,
    pub build_file: PathBuf,
}

/// Downloads every dependency listed in `dependency.ini` and writes `build.ini`
pub struct SetupPipeline {
    project_dir: PathBuf,
    dependency_file: PathBuf,
    build_file: PathBuf,
    layout: ProjectLayout,
    progress: Arc<dyn ProgressHandler>,
}

impl SetupPipeline {
    pub fn new(project_dir: impl Into<PathBuf>, progress: Arc<dyn ProgressHandler>) -> Self {
        Self {
            project_dir: project_dir.into(),
            dependency_file: PathBuf::from(DEPENDENCY_FILE),
            build_file: PathBuf::from(BUILD_FILE),
            layout: ProjectLayout::default(),
            progress,
        }
    }

    /// Dependency file, relative to the project directory unless absolute
    pub fn with_dependency_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.dependency_file = path.into();
        self
    }

    /// Build file to generate, relative to the project directory unless absolute
    pub fn with_build_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.build_file = path.into();
        self
    }

    pub fn with_layout(mut self, layout: ProjectLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    pub fn run(&self) -> Result<SetupReport, PipelineError> {
        let start = Instant::now();
        let config = Configuration::load(self.project_dir.join(&self.dependency_file))?;
        let manifest = DependencyManifest::from_config(&config)?;

        let fetcher = ArtifactFetcher::new(self.progress.clone())?;
        let mut installed = Vec::with_capacity(DependencyKind::ALL.len());
        for dependency in manifest.iter() {
            let target = self.project_dir.join(dependency.kind.install_dir());
            let summary = fetcher.fetch(dependency, &target)?;
            installed.push((dependency.kind, summary));
        }

        let build_file = self.project_dir.join(&self.build_file);
        info!(path = %build_file.display(), "Creating build configuration");
        write_build_config(&build_file, &self.layout, &manifest)?;
        self.progress.on_progress(&ProgressEvent::BuildConfigWritten {
            path: build_file.clone(),
        });

        info!(
            duration_ms = start.elapsed().as_millis() as u64,
            "Setup complete"
        );
        Ok(SetupReport {
            installed,
            build_file,
        })
    }
}
