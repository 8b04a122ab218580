use crate::build::is_debug_token;
use crate::config::{BUILD_FILE, DEPENDENCY_FILE};
use crate::util::logging::{parse_level, LoggingConfig};
use clap::{Args, Parser, Subcommand};
use std::env;
use std::ffi::OsString;
use std::path::PathBuf;
use tracing::Level;

/// Provisioning, bundling and declaration tooling for HermesJS
#[derive(Parser, Debug)]
#[command(
    name = "hermesjs",
    about = "Provisioning, bundling and declaration tooling for HermesJS",
    version,
    author,
    long_about = "hermesjs downloads the closure toolchain, compiles the HermesJS sources into \
                  a single bundle and generates TypeScript declarations for the closure library. \
                  Run the commands from the project directory or point -C at it."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(
        short = 'C',
        long,
        global = true,
        value_name = "DIR",
        help = "Project directory (defaults to the current directory)"
    )]
    pub directory: Option<PathBuf>,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - only errors are logged"
    )]
    pub quiet: bool,
}

impl CliArgs {
    /// Parses the process arguments with dashed `debug` spellings folded into `--debug`
    pub fn parse_normalized() -> Self {
        Self::parse_from(env::args_os().map(normalize_arg))
    }

    pub fn try_parse_normalized<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self::try_parse_from(args.into_iter().map(|a| normalize_arg(a.into())))
    }

    /// Log level from the flags, falling back to `HERMESJS_LOG_LEVEL`
    pub fn log_level(&self) -> Level {
        if let Some(level) = &self.log_level {
            parse_level(level)
        } else if self.verbose {
            Level::DEBUG
        } else if self.quiet {
            Level::ERROR
        } else {
            let level = env::var("HERMESJS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
            parse_level(&level)
        }
    }

    pub fn logging_config(&self) -> LoggingConfig {
        let use_json = env::var("HERMESJS_LOG_JSON")
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(false);

        LoggingConfig {
            level: self.log_level(),
            use_json,
            ..Default::default()
        }
    }
}

/// `-DEBUG`, `---Debug` and friends become `--debug`; everything else is untouched
fn normalize_arg(arg: OsString) -> OsString {
    match arg.to_str() {
        Some(s) if s.starts_with('-') && is_debug_token(s) => OsString::from("--debug"),
        _ => arg,
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Download dependencies and generate build.ini",
        long_about = "Downloads the closure library, closure compiler and protobuf archives listed \
                      in dependency.ini, extracts them into the project directory and writes \
                      build.ini.\n\n\
                      Examples:\n  \
                      hermesjs setup\n  \
                      hermesjs -C ~/src/hermesjs setup"
    )]
    Setup(SetupArgs),

    #[command(
        about = "Compile the HermesJS bundle",
        long_about = "Resolves the dependency order of the compile namespace with closurebuilder.py \
                      and compiles the result with the closure compiler. Passing `debug` (with any \
                      number of leading dashes, in any case) produces pretty printed output.\n\n\
                      Examples:\n  \
                      hermesjs build\n  \
                      hermesjs build debug\n  \
                      hermesjs build --debug"
    )]
    Build(BuildArgs),

    #[command(
        about = "Generate TypeScript declarations for the closure library",
        long_about = "Runs closurets over every .js file of the closure library and writes \
                      aggregate reference files for the generated .d.ts files.\n\n\
                      Examples:\n  \
                      hermesjs declarations"
    )]
    Declarations(DeclarationsArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SetupArgs {
    #[arg(
        long,
        value_name = "FILE",
        default_value = DEPENDENCY_FILE,
        help = "Dependency list, relative to the project directory"
    )]
    pub dependency_file: PathBuf,

    #[arg(
        long,
        value_name = "FILE",
        default_value = BUILD_FILE,
        help = "Build configuration to write, relative to the project directory"
    )]
    pub build_file: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    #[arg(
        long,
        value_name = "FILE",
        default_value = BUILD_FILE,
        help = "Build configuration, relative to the project directory"
    )]
    pub build_file: PathBuf,

    #[arg(long, overrides_with = "debug", help = "Pretty print the compiled output")]
    pub debug: bool,

    #[arg(
        value_name = "ARGS",
        help = "Extra build arguments; `debug` enables pretty printed output"
    )]
    pub tokens: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct DeclarationsArgs {
    #[arg(
        long,
        value_name = "FILE",
        default_value = BUILD_FILE,
        help = "Build configuration, relative to the project directory"
    )]
    pub build_file: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_args_verify() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn test_default_setup_args() {
        let args = CliArgs::parse_from(["hermesjs", "setup"]);
        match args.command {
            Commands::Setup(setup) => {
                assert_eq!(setup.dependency_file, PathBuf::from("dependency.ini"));
                assert_eq!(setup.build_file, PathBuf::from("build.ini"));
            }
            _ => panic!("Expected Setup command"),
        }
        assert!(args.directory.is_none());
    }

    #[test]
    fn test_build_tokens() {
        let args = CliArgs::parse_from(["hermesjs", "build", "debug", "extra"]);
        match args.command {
            Commands::Build(build) => {
                assert!(!build.debug);
                assert_eq!(build.tokens, vec!["debug", "extra"]);
            }
            _ => panic!("Expected Build command"),
        }
    }

    #[test]
    fn test_build_debug_flag() {
        let args = CliArgs::parse_from(["hermesjs", "build", "--debug"]);
        match args.command {
            Commands::Build(build) => {
                assert!(build.debug);
                assert!(build.tokens.is_empty());
            }
            _ => panic!("Expected Build command"),
        }
    }

    #[test]
    fn test_dashed_debug_spellings_set_flag() {
        for token in ["-DEBUG", "---debug", "--Debug"] {
            let args = CliArgs::try_parse_normalized(["hermesjs", "build", token]).unwrap();
            match args.command {
                Commands::Build(build) => {
                    assert!(build.debug, "token {}", token);
                    assert!(build.tokens.is_empty());
                }
                _ => panic!("Expected Build command"),
            }
        }
    }

    #[test]
    fn test_flags_after_build_token_are_honoured() {
        let args = CliArgs::try_parse_normalized([
            "hermesjs",
            "build",
            "debug",
            "--build-file",
            "custom.ini",
            "-C",
            "/tmp/p",
            "-q",
        ])
        .unwrap();
        assert_eq!(args.directory, Some(PathBuf::from("/tmp/p")));
        assert!(args.quiet);
        match args.command {
            Commands::Build(build) => {
                assert_eq!(build.build_file, PathBuf::from("custom.ini"));
                assert_eq!(build.tokens, vec!["debug"]);
            }
            _ => panic!("Expected Build command"),
        }
    }

    #[test]
    fn test_unknown_build_flag_is_error() {
        let result = CliArgs::try_parse_normalized(["hermesjs", "build", "debug", "--extra"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_directory_after_subcommand() {
        let args = CliArgs::parse_from(["hermesjs", "declarations", "-C", "/tmp/project"]);
        assert_eq!(args.directory, Some(PathBuf::from("/tmp/project")));
        assert!(matches!(args.command, Commands::Declarations(_)));
    }

    #[test]
    fn test_verbose_and_quiet_conflict() {
        let result = CliArgs::try_parse_from(["hermesjs", "-v", "-q", "build"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_log_level_flag_wins() {
        let args = CliArgs::parse_from(["hermesjs", "--log-level", "warn", "-v", "setup"]);
        assert_eq!(args.log_level(), Level::WARN);

        let args = CliArgs::parse_from(["hermesjs", "-q", "setup"]);
        assert_eq!(args.log_level(), Level::ERROR);
    }

    #[test]
    fn test_missing_subcommand_is_error() {
        assert!(CliArgs::try_parse_from(["hermesjs"]).is_err());
    }
}
