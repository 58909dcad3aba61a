use thiserror::Error;

#[derive(Error, Debug)]
pub enum BenchError {
    #[error("Usage: {program} <integer>")]
    UsageError { program: String },

    #[error("'{arg}' is not a valid integer.")]
    InvalidIntegerError { arg: String },

    #[error("Unrecognized mode {value}; expected 0 (probe), 1 (candle) or 2 (burn).")]
    UnknownModeError { value: i64 },

    #[error("Unrecognized variant {value}; expected 0 (nightly) or 1 (stable).")]
    UnknownVariantError { value: i64 },

    #[error("{tool} not found.")]
    ToolNotFoundError { tool: String },

    #[error("{tool} failed: {reason}")]
    ToolFailedError { tool: String, reason: String },

    #[error("{tool} failed: unparseable output ({detail})")]
    UnparseableOutputError { tool: String, detail: String },

    #[error("{framework} not installed.")]
    FrameworkMissingError { framework: String },

    #[error("No GPU available")]
    NoAcceleratorError { framework: String },

    #[error("CIFAR-10 not found at {path}; download {url} and extract it there")]
    DatasetMissingError { path: String, url: String },

    #[error("Profile artifact missing: {path}")]
    ArtifactMissingError { path: String },

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Profiler error: {0}")]
    ProfilerError(#[from] pprof::Error),

    #[error("Training error: {message}")]
    TrainingError { message: String },

    #[error("Download failed: {0}")]
    DownloadError(#[from] reqwest::Error),

    #[error("Installation aborted: {message}")]
    InstallAbortedError { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[cfg(feature = "candle")]
    #[error("Candle error: {0}")]
    CandleError(#[from] candle_core::Error),
}

/// Failure of one external process, kept apart from [`BenchError`] so callers
/// can tell a missing tool from one that ran and failed.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("{program} not found")]
    NotFound { program: String },

    #[error("{program} exited with {}", describe_status(.status))]
    Failed {
        program: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("{program} produced unparseable output: {detail}")]
    Unparseable { program: String, detail: String },

    #[error("{program} could not be started: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl ProcessError {
    pub fn program(&self) -> &str {
        match self {
            ProcessError::NotFound { program }
            | ProcessError::Failed { program, .. }
            | ProcessError::Unparseable { program, .. }
            | ProcessError::Spawn { program, .. } => program,
        }
    }

    pub fn from_spawn(program: &str, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            ProcessError::NotFound {
                program: program.to_string(),
            }
        } else {
            ProcessError::Spawn {
                program: program.to_string(),
                source,
            }
        }
    }
}

impl From<ProcessError> for BenchError {
    fn from(err: ProcessError) -> Self {
        match err {
            ProcessError::NotFound { program } => BenchError::ToolNotFoundError { tool: program },
            ProcessError::Unparseable { program, detail } => BenchError::UnparseableOutputError {
                tool: program,
                detail,
            },
            ProcessError::Failed {
                program,
                status,
                stderr,
            } => {
                let mut reason = format!("exited with {}", describe_status(&status));
                if let Some(line) = stderr.lines().find(|l| !l.trim().is_empty()) {
                    reason.push_str(&format!(" ({})", line.trim()));
                }
                BenchError::ToolFailedError {
                    tool: program,
                    reason,
                }
            }
            ProcessError::Spawn { program, source } => BenchError::ToolFailedError {
                tool: program,
                reason: source.to_string(),
            },
        }
    }
}

fn describe_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("status {}", code),
        None => "a signal".to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Argument,
    Dependency,
    Configuration,
    Runtime,
}

impl BenchError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            BenchError::UsageError { .. }
            | BenchError::InvalidIntegerError { .. }
            | BenchError::UnknownModeError { .. }
            | BenchError::UnknownVariantError { .. } => ErrorCategory::Argument,
            BenchError::ToolNotFoundError { .. }
            | BenchError::ToolFailedError { .. }
            | BenchError::UnparseableOutputError { .. }
            | BenchError::FrameworkMissingError { .. }
            | BenchError::NoAcceleratorError { .. }
            | BenchError::DatasetMissingError { .. }
            | BenchError::ArtifactMissingError { .. } => ErrorCategory::Dependency,
            BenchError::ConfigValidationError { .. } | BenchError::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
            _ => ErrorCategory::Runtime,
        }
    }

    /// Every detected failure terminates the invocation with status 1.
    pub fn exit_code(&self) -> i32 {
        1
    }

    /// Text printed to stdout for the user. Dependency and argument errors
    /// print exactly their display form.
    pub fn user_message(&self) -> String {
        match self.category() {
            ErrorCategory::Argument | ErrorCategory::Dependency => self.to_string(),
            ErrorCategory::Configuration | ErrorCategory::Runtime => format!("❌ {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, BenchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = BenchError::ToolNotFoundError {
            tool: "nvcc".to_string(),
        };
        assert_eq!(err.user_message(), "nvcc not found.");
        assert_eq!(err.category(), ErrorCategory::Dependency);
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_process_error_conversion() {
        let missing = ProcessError::from_spawn(
            "gcc",
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        );
        assert!(matches!(
            BenchError::from(missing),
            BenchError::ToolNotFoundError { tool } if tool == "gcc"
        ));

        let failed = ProcessError::Failed {
            program: "nvidia-smi".to_string(),
            status: Some(9),
            stderr: "\nNVIDIA-SMI has failed\n".to_string(),
        };
        assert_eq!(
            BenchError::from(failed).to_string(),
            "nvidia-smi failed: exited with status 9 (NVIDIA-SMI has failed)"
        );
    }

    #[test]
    fn test_invalid_integer_message() {
        let err = BenchError::InvalidIntegerError {
            arg: "abc".to_string(),
        };
        assert_eq!(err.user_message(), "'abc' is not a valid integer.");
        assert_eq!(err.category(), ErrorCategory::Argument);
    }

    #[test]
    fn test_framework_missing_message() {
        let err = BenchError::FrameworkMissingError {
            framework: "Candle".to_string(),
        };
        assert_eq!(err.to_string(), "Candle not installed.");
    }
}
