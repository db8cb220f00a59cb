//! Policy error types.

use thiserror::Error;

/// Policy errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A policy tag named no known visibility level.
    #[error("unknown access policy: '{0}' (expected public, protected or private)")]
    UnknownPolicy(String),
}

pub type Result<T> = std::result::Result<T, Error>;
