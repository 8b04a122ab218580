//! Subcommand entry points
//!
//! Every handler returns the process exit code; `main` only parses arguments,
//! initializes logging and exits with the returned code.

use super::commands::{BuildArgs, DeclarationsArgs, SetupArgs};
use crate::build::{debug_requested, is_debug_token, BuildPipeline};
use crate::config::{BuildSettings, ConfigError, Configuration, ToolchainConfig};
use crate::declarations::DeclarationPipeline;
use crate::error::PipelineError;
use crate::fetch::FetchError;
use crate::process::{ProcessError, SystemRunner};
use crate::progress::{ConsoleHandler, LoggingHandler, ProgressHandler};
use crate::setup::SetupPipeline;
use std::io::IsTerminal;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Progress bars on an interactive terminal, log lines otherwise
pub fn progress_handler(quiet: bool) -> Arc<dyn ProgressHandler> {
    if !quiet && std::io::stderr().is_terminal() {
        Arc::new(ConsoleHandler::new())
    } else {
        Arc::new(LoggingHandler)
    }
}

pub fn handle_setup(args: &SetupArgs, project_dir: &Path, quiet: bool) -> i32 {
    info!(project = %project_dir.display(), "Setting up HermesJS dependencies");

    if let Err(e) = ToolchainConfig::from_env() {
        return report_failure(&e.into());
    }

    let pipeline = SetupPipeline::new(project_dir, progress_handler(quiet))
        .with_dependency_file(&args.dependency_file)
        .with_build_file(&args.build_file);

    match pipeline.run() {
        Ok(report) => {
            for (kind, summary) in &report.installed {
                debug!(
                    dependency = %kind,
                    extracted = summary.extracted,
                    skipped = summary.skipped,
                    "Installed"
                );
            }
            info!(build_file = %report.build_file.display(), "Setup finished");
            0
        }
        Err(e) => report_failure(&e),
    }
}

pub fn handle_build(args: &BuildArgs, project_dir: &Path) -> i32 {
    for token in args.tokens.iter().filter(|t| !is_debug_token(t)) {
        warn!(argument = %token, "Ignoring unknown build argument");
    }
    let debug = args.debug || debug_requested(&args.tokens);

    let (settings, toolchain) = match load_build_inputs(project_dir, &args.build_file) {
        Ok(inputs) => inputs,
        Err(e) => return report_failure(&e),
    };

    let mut pipeline =
        BuildPipeline::new(settings, toolchain, project_dir, SystemRunner).with_debug(debug);
    match pipeline.run() {
        Ok(report) => {
            info!(
                out_file = %report.out_file.display(),
                files = report.dependencies.len(),
                "Build finished"
            );
            0
        }
        Err(e) => {
            debug!(state = ?pipeline.state(), "Build stopped");
            report_failure(&e)
        }
    }
}

pub fn handle_declarations(args: &DeclarationsArgs, project_dir: &Path, quiet: bool) -> i32 {
    let (settings, toolchain) = match load_build_inputs(project_dir, &args.build_file) {
        Ok(inputs) => inputs,
        Err(e) => return report_failure(&e),
    };

    let pipeline = DeclarationPipeline::from_settings(
        &settings,
        toolchain,
        project_dir,
        SystemRunner,
        progress_handler(quiet),
    );
    match pipeline.run() {
        Ok((generation, stitch)) => {
            info!(
                files = generation.files,
                batches = generation.batches,
                references = stitch.entries,
                "Declarations finished"
            );
            0
        }
        Err(e) => report_failure(&e),
    }
}

fn load_build_inputs(
    project_dir: &Path,
    build_file: &Path,
) -> Result<(BuildSettings, ToolchainConfig), PipelineError> {
    let config = Configuration::load(project_dir.join(build_file))?;
    let settings = BuildSettings::from_config(&config)?;

    let toolchain = ToolchainConfig::from_env()?;
    debug!(?settings, ?toolchain, "Loaded build configuration");

    Ok((settings, toolchain))
}

/// Logs the failure with a hint where one helps, and returns its exit code
pub fn report_failure(err: &PipelineError) -> i32 {
    error!("{}", err);

    match err {
        PipelineError::Config(ConfigError::NotFound { path }) => {
            eprintln!("\n{} does not exist.", path.display());
            if path.ends_with(crate::config::BUILD_FILE) {
                eprintln!("  - Run 'hermesjs setup' first to download dependencies and create it");
            }
        }
        PipelineError::Config(ConfigError::Invalid(_)) => {
            eprintln!("\nPlease check your HERMESJS_* environment variables and build.ini.");
        }
        PipelineError::Process(ProcessError::Spawn { program, .. }) => {
            eprintln!("\nCould not start '{}'.", program);
            eprintln!("  - Make sure it is installed and on PATH");
            eprintln!("  - Or point HERMESJS_PYTHON, HERMESJS_JAVA or HERMESJS_CLOSURETS at it");
        }
        PipelineError::Fetch(FetchError::ChecksumMismatch { .. }) => {
            eprintln!("\nThe download does not match the sha256 in dependency.ini.");
        }
        _ => {}
    }

    err.exit_code()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_missing_build_file_fails() {
        let dir = TempDir::new().unwrap();
        let args = BuildArgs {
            build_file: PathBuf::from("build.ini"),
            debug: false,
            tokens: vec![],
        };
        assert_eq!(handle_build(&args, dir.path()), 1);
    }

    #[test]
    fn test_incomplete_build_file_fails() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("build.ini"), "[HERMESJS]\nRoot = HermesJS\n").unwrap();
        let args = DeclarationsArgs {
            build_file: PathBuf::from("build.ini"),
        };
        assert_eq!(handle_declarations(&args, dir.path(), true), 1);
    }

    #[test]
    fn test_missing_dependency_file_fails() {
        let dir = TempDir::new().unwrap();
        let args = SetupArgs {
            dependency_file: PathBuf::from("dependency.ini"),
            build_file: PathBuf::from("build.ini"),
        };
        assert_eq!(handle_setup(&args, dir.path(), true), 1);
        assert!(!dir.path().join("build.ini").exists());
    }

    #[test]
    #[serial]
    fn test_setup_rejects_bad_toolchain_env_before_download() {
        let mut server = mockito::Server::new();
        let archive = server
            .mock("GET", mockito::Matcher::Any)
            .expect(0)
            .create();

        let dir = TempDir::new().unwrap();
        let url = format!("{}/archive.zip", server.url());
        fs::write(
            dir.path().join("dependency.ini"),
            format!(
                "[CLOSURE_LIBRARY]\nurl = {url}\nversion = 1\n\n\
                 [CLOSURE_COMPILER]\nurl = {url}\nversion = 1\n\n\
                 [PROTOBUF]\nurl = {url}\nversion = 1\n",
                url = url
            ),
        )
        .unwrap();
        let args = SetupArgs {
            dependency_file: PathBuf::from("dependency.ini"),
            build_file: PathBuf::from("build.ini"),
        };

        env::set_var("HERMESJS_BATCH_SIZE", "lots");
        let code = handle_setup(&args, dir.path(), true);
        env::remove_var("HERMESJS_BATCH_SIZE");

        assert_eq!(code, 1);
        archive.assert();
        assert!(!dir.path().join("build.ini").exists());
    }

    #[test]
    #[serial]
    fn test_declarations_rejects_bad_batch_size() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("lib")).unwrap();
        fs::write(
            dir.path().join("build.ini"),
            "[LIBRARY]\nRoot = HermesJS\nOutFile = out/HermesJS.js\n\n\
             [NAMESPACES]\nCompileNamespace = HermesJS.main\n\n\
             [CLOSURE]\nLibrary = lib\nCompiler = compiler.jar\n",
        )
        .unwrap();
        let args = DeclarationsArgs {
            build_file: PathBuf::from("build.ini"),
        };

        env::set_var("HERMESJS_BATCH_SIZE", "0x10");
        let code = handle_declarations(&args, dir.path(), true);
        env::remove_var("HERMESJS_BATCH_SIZE");

        assert_eq!(code, 1);
        assert!(!dir.path().join("lib/all.d.ts").exists());
    }

    #[test]
    fn test_report_failure_exit_codes() {
        assert_eq!(
            report_failure(&PipelineError::ResolutionFailed { code: 2 }),
            2
        );
        assert_eq!(
            report_failure(&ConfigError::Invalid("bad".to_string()).into()),
            1
        );
    }
}
