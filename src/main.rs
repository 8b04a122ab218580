use hermesjs_tools::cli::commands::{CliArgs, Commands};
use hermesjs_tools::cli::handlers::{handle_build, handle_declarations, handle_setup};
use hermesjs_tools::util::init_logging;
use hermesjs_tools::VERSION;

use anyhow::{bail, Context};
use clap::Parser;
use std::env;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{debug, error};

fn main() {
    let args = CliArgs::parse_normalized();
    init_logging(args.logging_config());

    debug!("hermesjs v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let project_dir = match resolve_project_dir(args.directory.as_deref()) {
        Ok(dir) => dir,
        Err(e) => {
            error!("{:#}", e);
            process::exit(1);
        }
    };
    debug!("Project directory: {}", project_dir.display());

    let exit_code = match &args.command {
        Commands::Setup(setup_args) => handle_setup(setup_args, &project_dir, args.quiet),
        Commands::Build(build_args) => handle_build(build_args, &project_dir),
        Commands::Declarations(declarations_args) => {
            handle_declarations(declarations_args, &project_dir, args.quiet)
        }
    };

    process::exit(exit_code);
}

/// Project directory from `-C`, or the current directory
fn resolve_project_dir(directory: Option<&Path>) -> anyhow::Result<PathBuf> {
    let dir = match directory {
        Some(dir) => dir.to_path_buf(),
        None => env::current_dir().context("Failed to get current directory")?,
    };

    if !dir.is_dir() {
        bail!("Project directory does not exist: {}", dir.display());
    }

    dir.canonicalize()
        .with_context(|| format!("Failed to canonicalize {}", dir.display()))
}
