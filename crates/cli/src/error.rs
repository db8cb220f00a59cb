//! CLI error types.

use crate::manifest::ManifestError;
use thiserror::Error;

/// CLI errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The call target was not of the form `<Class>.<method>`.
    #[error("invalid call target '{0}': expected <Class>.<method>")]
    Target(String),

    /// A `--arg` value was not valid JSON.
    #[error("invalid argument '{input}': {reason}")]
    Argument { input: String, reason: String },

    /// The log filter could not be parsed.
    #[error("invalid log filter '{filter}': {reason}")]
    LogFilter { filter: String, reason: String },

    /// The manifest could not be loaded or defined.
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// An error occurred in the runtime layer.
    #[error(transparent)]
    Runtime(#[from] runtime::Error),

    /// Failed to render output.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Process exit code: 2 for access violations, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Runtime(e) if e.is_access_violation() => 2,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
