//! Error Types
//!
//! Fatal setup errors and recoverable navigation errors for the emulator.

use thiserror::Error;

/// Fatal errors. Any of these ends the process with exit code 1.
#[derive(Error, Debug)]
pub enum HuskError {
    #[error("config error: {message}")]
    Config { message: String },

    #[error("archive error: {message}")]
    Archive { message: String },

    #[error("log error: {message}")]
    Log { message: String },
}

impl HuskError {
    pub fn config(message: impl Into<String>) -> Self {
        HuskError::Config {
            message: message.into(),
        }
    }

    pub fn archive(message: impl Into<String>) -> Self {
        HuskError::Archive {
            message: message.into(),
        }
    }

    pub fn log(message: impl Into<String>) -> Self {
        HuskError::Log {
            message: message.into(),
        }
    }
}

/// Recoverable navigation errors. The session survives these: the failure
/// is printed, logged, and the current path stays where it was.
#[derive(Error, Debug, Clone)]
pub enum ResolveError {
    #[error("cannot ascend above the filesystem root")]
    BoundaryViolation,

    #[error("{path}: directory not found")]
    NotFound { path: String },
}
