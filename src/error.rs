use crate::config::ConfigError;
use crate::fetch::FetchError;
use crate::process::ProcessError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Any failure that aborts a pipeline
///
/// Nothing here is retried. The binary maps each variant to an exit code with
/// [`PipelineError::exit_code`].
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error("Failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("Error during building dependency tree (exit code {code})")]
    ResolutionFailed { code: i32 },

    #[error("Closure compiler failed (exit code {code})")]
    CompileFailed { code: i32 },

    #[error("Declaration generator failed for {failed} of {total} batches")]
    GenerationFailed { failed: usize, total: usize },
}

impl PipelineError {
    pub fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        PipelineError::Write {
            path: path.into(),
            source,
        }
    }

    /// Process exit code for this failure
    ///
    /// Tool failures propagate the tool's own code; everything else is 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::ResolutionFailed { code } | PipelineError::CompileFailed { code } => {
                if *code == 0 {
                    1
                } else {
                    *code
                }
            }
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_propagates_tool_code() {
        assert_eq!(PipelineError::ResolutionFailed { code: 2 }.exit_code(), 2);
        assert_eq!(PipelineError::CompileFailed { code: 7 }.exit_code(), 7);
    }

    #[test]
    fn test_exit_code_defaults_to_one() {
        let err = PipelineError::from(ConfigError::MissingKey {
            section: "LIBRARY".to_string(),
            key: "Root".to_string(),
        });
        assert_eq!(err.exit_code(), 1);

        let err = PipelineError::GenerationFailed {
            failed: 1,
            total: 3,
        };
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_messages() {
        let err = PipelineError::write(
            "build.ini",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.to_string(), "Failed to write build.ini: denied");

        let err = PipelineError::ResolutionFailed { code: 2 };
        assert!(err.to_string().contains("exit code 2"));
    }
}
