//! Method visibility policies.
//!
//! Core principle: **a restricted method is authorized by the class that is
//! executing when the call is made, never by the caller's claims.**
//!
//! This crate holds the leaf of the system: the [`AccessPolicy`] levels, the
//! lenient tag parsing used when classes are defined, and the rules that turn
//! an owner, a caller and a [`Lineage`] into a [`Decision`].

mod access;
mod error;
mod policy;

pub use access::AccessPolicy;
pub use error::{Error, Result};
pub use policy::{Decision, DenyReason, Lineage};
