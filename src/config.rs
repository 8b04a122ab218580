//! Configuration management for hermesjs
//!
//! Two kinds of configuration feed the pipelines:
//!
//! - **Key/value files** (`dependency.ini`, `build.ini`) loaded into a read-only
//!   [`Configuration`] and projected into typed views ([`DependencyManifest`],
//!   [`BuildSettings`]).
//! - **Toolchain settings** read from environment variables with defaults
//!   ([`ToolchainConfig`]).
//!
//! # Environment Variables
//!
//! - `HERMESJS_PYTHON`: Interpreter for closurebuilder.py - default: "python"
//! - `HERMESJS_JAVA`: JVM used to run the compiler jar - default: "java"
//! - `HERMESJS_CLOSURETS`: Declaration generator executable - default: "closurets"
//! - `HERMESJS_BATCH_SIZE`: Files per generator invocation - default: "15"
//! - `HERMESJS_LOG_LEVEL`: Logging level - default: "info"
//!
//! # Example
//!
//! ```no_run
//! use hermesjs_tools::config::{BuildSettings, Configuration};
//!
//! let config = Configuration::load("build.ini")?;
//! let settings = BuildSettings::from_config(&config)?;
//! println!("Compiling {}", settings.compile_namespace);
//! # Ok::<(), hermesjs_tools::ConfigError>(())
//! ```

use ini::Ini;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

const DEFAULT_PYTHON: &str = "python";
const DEFAULT_JAVA: &str = "java";
const DEFAULT_CLOSURETS: &str = "closurets";
const DEFAULT_BATCH_SIZE: usize = 15;
const DEFAULT_LOG_LEVEL: &str = "info";

/// Conventional file names, relative to the project directory
pub const DEPENDENCY_FILE: &str = "dependency.ini";
pub const BUILD_FILE: &str = "build.ini";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file does not exist
    #[error("Configuration file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// Configuration file exists but could not be parsed
    #[error("Failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// A required section or key is absent
    #[error("Missing configuration key [{section}] {key}")]
    MissingKey { section: String, key: String },

    /// A value is present but unusable
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Section → key → value mapping loaded from a key/value file
///
/// Read-only after [`Configuration::load`]; lookups never fall back to defaults.
#[derive(Debug, Clone)]
pub struct Configuration {
    source: PathBuf,
    ini: Ini,
}

impl Configuration {
    /// Loads a configuration file
    ///
    /// Escape sequences are not interpreted, so Windows style paths are kept as written.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let ini = Ini::load_from_file_noescape(path).map_err(|e| match e {
            ini::Error::Io(err) if err.kind() == std::io::ErrorKind::NotFound => {
                ConfigError::NotFound {
                    path: path.to_path_buf(),
                }
            }
            other => ConfigError::Parse {
                path: path.to_path_buf(),
                message: other.to_string(),
            },
        })?;

        Ok(Self {
            source: path.to_path_buf(),
            ini,
        })
    }

    /// Parses configuration text that did not come from disk
    pub fn from_str_named(name: impl Into<PathBuf>, text: &str) -> Result<Self, ConfigError> {
        let source = name.into();
        let ini = Ini::load_from_str_noescape(text).map_err(|e| ConfigError::Parse {
            path: source.clone(),
            message: e.to_string(),
        })?;
        Ok(Self { source, ini })
    }

    /// Path the configuration was loaded from
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Returns a required value
    pub fn get(&self, section: &str, key: &str) -> Result<&str, ConfigError> {
        self.lookup(section, key)
            .ok_or_else(|| ConfigError::MissingKey {
                section: section.to_string(),
                key: key.to_string(),
            })
    }

    /// Returns an optional value; empty values count as absent
    pub fn get_opt(&self, section: &str, key: &str) -> Option<&str> {
        self.lookup(section, key).filter(|v| !v.trim().is_empty())
    }

    pub fn has_section(&self, section: &str) -> bool {
        self.ini.section(Some(section)).is_some()
    }

    fn lookup(&self, section: &str, key: &str) -> Option<&str> {
        let props = self.ini.section(Some(section))?;
        props.get(key).or_else(|| {
            props
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v)
        })
    }
}

/// The three third-party toolchains provisioned by `setup`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyKind {
    ClosureLibrary,
    ClosureCompiler,
    Protobuf,
}

impl DependencyKind {
    /// Provisioning order
    pub const ALL: [DependencyKind; 3] = [
        DependencyKind::ClosureLibrary,
        DependencyKind::ClosureCompiler,
        DependencyKind::Protobuf,
    ];

    /// Section name in `dependency.ini`
    pub fn section(&self) -> &'static str {
        match self {
            DependencyKind::ClosureLibrary => "CLOSURE_LIBRARY",
            DependencyKind::ClosureCompiler => "CLOSURE_COMPILER",
            DependencyKind::Protobuf => "PROTOBUF",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            DependencyKind::ClosureLibrary => "CLOSURE LIBRARY",
            DependencyKind::ClosureCompiler => "CLOSURE COMPILER",
            DependencyKind::Protobuf => "PROTOBUF",
        }
    }

    /// Directory the archive is unpacked into, relative to the project
    pub fn install_dir(&self) -> &'static str {
        match self {
            DependencyKind::ClosureLibrary => "closure-library",
            DependencyKind::ClosureCompiler => "closure-compiler",
            DependencyKind::Protobuf => "protobuf",
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A versioned artifact to download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub kind: DependencyKind,
    pub url: String,
    pub version: String,
    /// Expected SHA-256 of the archive, hex encoded
    pub sha256: Option<String>,
}

impl Dependency {
    fn from_config(config: &Configuration, kind: DependencyKind) -> Result<Self, ConfigError> {
        let section = kind.section();
        Ok(Self {
            kind,
            url: config.get(section, "url")?.trim().to_string(),
            version: config.get(section, "version")?.trim().to_string(),
            sha256: config.get_opt(section, "sha256").map(|s| s.trim().to_string()),
        })
    }
}

/// Typed view of `dependency.ini`
#[derive(Debug, Clone)]
pub struct DependencyManifest {
    pub closure_library: Dependency,
    pub closure_compiler: Dependency,
    pub protobuf: Dependency,
}

impl DependencyManifest {
    pub fn from_config(config: &Configuration) -> Result<Self, ConfigError> {
        Ok(Self {
            closure_library: Dependency::from_config(config, DependencyKind::ClosureLibrary)?,
            closure_compiler: Dependency::from_config(config, DependencyKind::ClosureCompiler)?,
            protobuf: Dependency::from_config(config, DependencyKind::Protobuf)?,
        })
    }

    pub fn get(&self, kind: DependencyKind) -> &Dependency {
        match kind {
            DependencyKind::ClosureLibrary => &self.closure_library,
            DependencyKind::ClosureCompiler => &self.closure_compiler,
            DependencyKind::Protobuf => &self.protobuf,
        }
    }

    /// Dependencies in provisioning order
    pub fn iter(&self) -> impl Iterator<Item = &Dependency> {
        DependencyKind::ALL.iter().map(move |kind| self.get(*kind))
    }
}

/// Typed view of `build.ini`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSettings {
    pub library_root: String,
    pub out_file: String,
    pub compile_namespace: String,
    pub closure_library: String,
    pub closure_compiler: String,
    /// Protobuf JS root; `None` when the section, key or value is absent
    pub protobuf_library: Option<String>,
}

impl BuildSettings {
    pub fn from_config(config: &Configuration) -> Result<Self, ConfigError> {
        Ok(Self {
            library_root: config.get("LIBRARY", "Root")?.to_string(),
            out_file: config.get("LIBRARY", "OutFile")?.to_string(),
            compile_namespace: config.get("NAMESPACES", "CompileNamespace")?.to_string(),
            closure_library: config.get("CLOSURE", "Library")?.to_string(),
            closure_compiler: config.get("CLOSURE", "Compiler")?.to_string(),
            protobuf_library: config.get_opt("PROTOBUF", "Library").map(str::to_string),
        })
    }
}

/// External tool and runtime settings
#[derive(Debug, Clone)]
pub struct ToolchainConfig {
    /// Interpreter used to run closurebuilder.py
    pub python: String,

    /// JVM used to run the closure compiler jar
    pub java: String,

    /// Per-file declaration generator
    pub closurets: String,

    /// Maximum number of files handed to one generator invocation
    pub batch_size: usize,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            python: DEFAULT_PYTHON.to_string(),
            java: DEFAULT_JAVA.to_string(),
            closurets: DEFAULT_CLOSURETS.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl ToolchainConfig {
    /// Loads from `HERMESJS_*` environment variables, falling back to defaults
    /// for unset ones, and validates the result
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let var = |name: &str, default: String| env::var(name).unwrap_or(default);

        let batch_size = match env::var("HERMESJS_BATCH_SIZE") {
            Ok(value) => value.trim().parse::<usize>().map_err(|_| {
                ConfigError::Invalid(format!(
                    "HERMESJS_BATCH_SIZE must be a positive integer, got {:?}",
                    value
                ))
            })?,
            Err(_) => defaults.batch_size,
        };

        let config = Self {
            python: var("HERMESJS_PYTHON", defaults.python),
            java: var("HERMESJS_JAVA", defaults.java),
            closurets: var("HERMESJS_CLOSURETS", defaults.closurets),
            batch_size,
            log_level: var("HERMESJS_LOG_LEVEL", defaults.log_level).to_lowercase(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("HERMESJS_PYTHON", &self.python),
            ("HERMESJS_JAVA", &self.java),
            ("HERMESJS_CLOSURETS", &self.closurets),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{} must not be empty", name)));
            }
        }

        if self.batch_size == 0 {
            return Err(ConfigError::Invalid(
                "Batch size must be at least 1".to_string(),
            ));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            _ => Err(ConfigError::Invalid(format!(
                "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                self.log_level
            ))),
        }
    }
}
