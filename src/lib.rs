//! hermesjs-tools - provisioning, bundling and declaration tooling for HermesJS
//!
//! HermesJS is built on the Google closure library. This crate drives the
//! external tools that turn the sources into a bundle and into TypeScript
//! declarations:
//!
//! - [`setup`]: downloads the closure library, closure compiler and protobuf
//!   archives listed in `dependency.ini`, extracts them and writes `build.ini`
//! - [`build`]: runs closurebuilder.py to resolve the dependency order of the
//!   compile namespace, then the closure compiler over that list
//! - [`declarations`]: runs closurets over the closure library in batches and
//!   stitches the generated `.d.ts` files into aggregate reference files
//!
//! # Example Usage
//!
//! ```no_run
//! use hermesjs_tools::build::BuildPipeline;
//! use hermesjs_tools::config::{BuildSettings, Configuration, ToolchainConfig};
//! use hermesjs_tools::process::SystemRunner;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Configuration::load("build.ini")?;
//! let settings = BuildSettings::from_config(&config)?;
//!
//! let toolchain = ToolchainConfig::from_env()?;
//!
//! let mut pipeline = BuildPipeline::new(settings, toolchain, ".", SystemRunner);
//! let report = pipeline.run()?;
//! println!("Wrote {}", report.out_file.display());
//! # Ok(())
//! # }
//! ```

pub mod build;
pub mod cli;
pub mod config;
pub mod declarations;
pub mod error;
pub mod fetch;
pub mod process;
pub mod progress;
pub mod setup;
pub mod util;

pub use build::{BuildPipeline, BuildReport, BuildState, DependencyList};
pub use config::{
    BuildSettings, ConfigError, Configuration, DependencyKind, DependencyManifest, ToolchainConfig,
};
pub use declarations::{DeclarationPipeline, ReferenceManifest, SourceTree};
pub use error::PipelineError;
pub use fetch::{ArtifactFetcher, FetchError};
pub use process::{ProcessError, ProcessRunner, SystemRunner, ToolCommand};
pub use setup::{SetupPipeline, SetupReport};
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
