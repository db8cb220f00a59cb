use policy::AccessPolicy;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A restricted method was called from a class context it does not trust.
    #[error("'{method}' method of {class} is marked as {policy}")]
    AccessViolation {
        method: String,
        policy: AccessPolicy,
        class: String,
        /// Executing class at the time of the call, `None` for top-level code.
        caller: Option<String>,
    },

    /// A method body signalled failure.
    #[error("{class}.{method} raised: {message}")]
    Raised {
        class: String,
        method: String,
        message: String,
    },

    #[error("{class} has no method '{method}'")]
    NoSuchMethod { class: String, method: String },

    #[error("unknown class: {0}")]
    UnknownClass(String),

    #[error("method '{method}' declared twice on {class}")]
    DuplicateMethod { class: String, method: String },

    #[error("{outer} already declares a nested class named '{name}'")]
    DuplicateNested { outer: String, name: String },

    #[error(transparent)]
    Policy(#[from] policy::Error),
}

impl Error {
    pub fn is_access_violation(&self) -> bool {
        matches!(self, Error::AccessViolation { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
