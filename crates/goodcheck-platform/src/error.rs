//! Platform-specific errors

use thiserror::Error;

/// Platform-specific errors
#[derive(Error, Debug)]
pub enum PlatformError {
    /// Shaper executable does not exist
    #[error("Shaper executable not found: {0}")]
    ExecutableNotFound(String),

    /// Not allowed to launch the shaper (it usually needs administrator rights)
    #[error("Permission denied launching {0}")]
    PermissionDenied(String),

    /// Shaper executable could not be launched
    #[error("Failed to launch {executable}: {source}")]
    SpawnFailed {
        /// Executable that failed to launch
        executable: String,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Shaper exited right after launch
    #[error("{executable} exited immediately ({status})")]
    EngineExited {
        /// Executable that exited
        executable: String,
        /// Exit status as reported by the OS
        status: String,
    },

    /// Running shaper could not be killed
    #[error("Failed to kill shaper process: {0}")]
    Kill(std::io::Error),

    /// Strategy arguments could not be tokenized
    #[error("Invalid shaper arguments: {0}")]
    Arguments(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Platform result type
pub type Result<T> = std::result::Result<T, PlatformError>;

impl PlatformError {
    /// Classify a launch failure by its I/O error kind
    pub fn spawn(executable: impl Into<String>, source: std::io::Error) -> Self {
        let executable = executable.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::ExecutableNotFound(executable),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(executable),
            _ => Self::SpawnFailed { executable, source },
        }
    }
}

impl From<PlatformError> for goodcheck_core::Error {
    fn from(err: PlatformError) -> Self {
        goodcheck_core::Error::shaper(err.to_string())
    }
}
