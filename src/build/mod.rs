//! Bundle compilation
//!
//! closurebuilder.py resolves the dependency graph of the compile namespace and
//! prints the ordered list of source files; that list becomes the input of the
//! closure compiler. The two steps always run in this order.

use crate::config::{BuildSettings, ToolchainConfig};
use crate::error::PipelineError;
use crate::process::{ProcessRunner, ToolCommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Script inside the closure library that resolves namespace dependencies
const CLOSUREBUILDER_SCRIPT: &str = "closure/bin/build/closurebuilder.py";

/// Extra compiler flags for human readable output
pub const DEBUG_FLAGS: [&str; 3] = [
    "--formatting=PRETTY_PRINT",
    "--formatting=PRINT_INPUT_DELIMITER",
    "--debug",
];

/// True for `debug`, `--debug`, `-DEBUG` and similar
pub fn is_debug_token(arg: &str) -> bool {
    arg.replace('-', "").eq_ignore_ascii_case("debug")
}

pub fn debug_requested<I, S>(args: I) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    args.into_iter().any(|a| is_debug_token(a.as_ref()))
}

/// Where the build currently is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildState {
    Idle,
    Resolving,
    ResolutionFailed { code: i32 },
    Resolved { files: usize },
    Compiling,
    Compiled,
    CompileFailed { code: i32 },
}

impl BuildState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BuildState::ResolutionFailed { .. } | BuildState::Compiled | BuildState::CompileFailed { .. }
        )
    }
}

/// Ordered source files reported by the resolver
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyList {
    files: Vec<String>,
}

impl DependencyList {
    /// Parses resolver output, one path per line; CRLF and blank lines are tolerated
    pub fn parse(stdout: &str) -> Self {
        let files = stdout
            .replace("\r\n", "\n")
            .split('\n')
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Self { files }
    }

    pub fn files(&self) -> &[String] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Space separated form, as printed in logs
    pub fn joined(&self) -> String {
        self.files.join(" ")
    }
}

/// Result of a finished build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub out_file: PathBuf,
    pub dependencies: DependencyList,
}

/// Resolve-then-compile pipeline
pub struct BuildPipeline<R: ProcessRunner> {
    settings: BuildSettings,
    toolchain: ToolchainConfig,
    project_dir: PathBuf,
    debug: bool,
    runner: R,
    state: BuildState,
}

impl<R: ProcessRunner> BuildPipeline<R> {
    pub fn new(
        settings: BuildSettings,
        toolchain: ToolchainConfig,
        project_dir: impl Into<PathBuf>,
        runner: R,
    ) -> Self {
        Self {
            settings,
            toolchain,
            project_dir: project_dir.into(),
            debug: false,
            runner,
            state: BuildState::Idle,
        }
    }

    /// Enables pretty printed compiler output
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn state(&self) -> &BuildState {
        &self.state
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// Command line for closurebuilder.py
    pub fn resolver_command(&self) -> ToolCommand {
        let library = &self.settings.closure_library;
        let mut cmd = ToolCommand::new(&self.toolchain.python)
            .arg(format!("{}/{}", library, CLOSUREBUILDER_SCRIPT))
            .option("root", format!("{}/", library))
            .option("root", &self.settings.library_root);

        if let Some(protobuf) = &self.settings.protobuf_library {
            cmd = cmd.option("root", protobuf);
        }

        cmd.arg(format!("--namespace={}", self.settings.compile_namespace))
            .current_dir(&self.project_dir)
    }

    /// Command line for the closure compiler
    pub fn compiler_command(&self, dependencies: &DependencyList) -> ToolCommand {
        let mut cmd = ToolCommand::new(&self.toolchain.java)
            .arg("-jar")
            .arg(&self.settings.closure_compiler)
            .arg("--js_output_file")
            .arg(&self.settings.out_file);

        if self.debug {
            cmd = cmd.args(DEBUG_FLAGS);
        }

        cmd.args(dependencies.files()).current_dir(&self.project_dir)
    }

    /// Runs the resolver and captures its dependency list
    ///
    /// A non-zero exit aborts with `ResolutionFailed` carrying the resolver's code.
    pub fn resolve(&mut self) -> Result<DependencyList, PipelineError> {
        self.state = BuildState::Resolving;
        let command = self.resolver_command();
        info!(command = %command, "Building dependency tree");

        let output = match self.runner.capture(&command) {
            Ok(output) => output,
            Err(e) => {
                self.state = BuildState::ResolutionFailed { code: 1 };
                return Err(e.into());
            }
        };

        if !output.status.success() {
            let code = output.status.exit_code();
            error!(code, "Error during building dependency tree");
            self.state = BuildState::ResolutionFailed { code };
            return Err(PipelineError::ResolutionFailed { code });
        }

        let dependencies = DependencyList::parse(&output.stdout);
        info!(files = dependencies.len(), "Dependency tree:");
        for file in dependencies.files() {
            info!("  {}", file);
        }
        if dependencies.is_empty() {
            warn!("closurebuilder reported no source files");
        }

        self.state = BuildState::Resolved {
            files: dependencies.len(),
        };
        Ok(dependencies)
    }

    /// Compiles the resolved files into the configured output file
    pub fn compile(&mut self, dependencies: &DependencyList) -> Result<PathBuf, PipelineError> {
        let out_file = self.project_dir.join(&self.settings.out_file);
        if let Some(parent) = out_file.parent() {
            fs::create_dir_all(parent).map_err(|e| PipelineError::write(&out_file, e))?;
        }

        self.state = BuildState::Compiling;
        let command = self.compiler_command(dependencies);
        info!(debug = self.debug, "Compiling {}", self.settings.compile_namespace);
        debug!(command = %command, "Compiler command");

        let status = match self.runner.run(&command) {
            Ok(status) => status,
            Err(e) => {
                self.state = BuildState::CompileFailed { code: 1 };
                return Err(e.into());
            }
        };

        if !status.success() {
            let code = status.exit_code();
            error!(code, "Closure compiler failed");
            self.state = BuildState::CompileFailed { code };
            return Err(PipelineError::CompileFailed { code });
        }

        self.state = BuildState::Compiled;
        info!(out_file = %out_file.display(), "Compilation done");
        Ok(out_file)
    }

    pub fn run(&mut self) -> Result<BuildReport, PipelineError> {
        let dependencies = self.resolve()?;
        let out_file = self.compile(&dependencies)?;
        Ok(BuildReport {
            out_file,
            dependencies,
        })
    }
}
