//! Call-time method visibility for a runtime class model.
//!
//! Classes are defined at runtime, methods are dispatched by name, and each
//! method carries an [`AccessPolicy`](policy::AccessPolicy). Public methods
//! can be called from anywhere; private and protected ones are checked
//! against the class that is executing when the call is made.
//!
//! # Overview
//!
//! - **ClassRegistry**: defined classes, their bases, nested declarations and
//!   method tables. Answers the subclass and nesting questions the policy
//!   rules ask.
//! - **ContextStack**: which class's method is running, innermost last. Owned
//!   by one thread of control and passed explicitly into every call.
//! - **WrappedMethod**: a declared method bound to its owner and policy. It
//!   authorizes the caller, then runs the body inside a [`Frame`] that pops
//!   the owner again on every exit path.
//! - **Runtime**: defines classes and dispatches calls.
//!
//! # Example
//!
//! ```
//! use runtime::{ClassBuilder, ContextStack, Runtime};
//! use serde_json::{json, Value};
//!
//! let mut runtime = Runtime::new();
//! let account = runtime.define(
//!     ClassBuilder::new("Account")
//!         .private("_balance", |_, _| Ok(json!(100)))
//!         .public("report", |inv, _| inv.call_self("_balance", &[])),
//! )?;
//!
//! let mut ctx = ContextStack::new();
//! let mut acct = runtime.instantiate(account, Value::Null)?;
//!
//! assert_eq!(runtime.invoke(&mut ctx, &mut acct, "report", &[])?, json!(100));
//! assert!(runtime.invoke(&mut ctx, &mut acct, "_balance", &[]).is_err());
//! # Ok::<(), runtime::Error>(())
//! ```

mod class;
mod context;
mod dispatch;
mod error;
mod object;
mod registry;
mod wrap;

pub use class::{ClassBuilder, ClassId, MethodBody, MethodDef};
pub use context::{ContextStack, Frame};
pub use dispatch::{INITIALIZER, Invocation, Runtime};
pub use error::{Error, Result};
pub use object::Object;
pub use registry::{Class, ClassRegistry, MethodSummary};
pub use wrap::{MethodKind, MethodTable, SPECIAL_PREFIX, WrappedMethod, is_special};
