//! Enforcement wrappers.
//!
//! When a class is defined, every declared method is turned into a
//! [`WrappedMethod`]: the original body paired with its policy and owner.
//! Invoking a wrapped method checks the caller against the policy using the
//! innermost class on the [`ContextStack`], then runs the body inside a frame
//! owned by the method's class.
//!
//! A rejected call never reaches the body and never touches the stack.

use crate::class::{MethodBody, MethodDef};
use crate::{ClassId, ClassRegistry, ContextStack, Error, Invocation, Object, Result, Runtime};
use policy::{AccessPolicy, Decision};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Methods named with this prefix follow the special-method convention and
/// are left unguarded.
pub const SPECIAL_PREFIX: &str = "__";

pub fn is_special(name: &str) -> bool {
    name.starts_with(SPECIAL_PREFIX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    /// Checked against its policy and run inside an owner frame.
    Guarded,
    /// Called as is: no check, no frame.
    Special,
}

/// A declared method bound to its owner and policy.
pub struct WrappedMethod {
    name: String,
    policy: AccessPolicy,
    owner: ClassId,
    kind: MethodKind,
    body: MethodBody,
}

impl WrappedMethod {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn policy(&self) -> AccessPolicy {
        self.policy
    }

    pub fn owner(&self) -> ClassId {
        self.owner
    }

    pub fn kind(&self) -> MethodKind {
        self.kind
    }

    /// Check whether the class executing on `ctx` may call this method.
    pub fn authorize(&self, registry: &ClassRegistry, ctx: &ContextStack) -> Result<()> {
        let caller = ctx.current();
        match self.policy.check(self.owner, caller, registry) {
            Decision::Allow => {
                tracing::trace!(
                    method = %self.name,
                    owner = %self.owner,
                    caller = ?caller,
                    policy = %self.policy,
                    "call authorized"
                );
                Ok(())
            }
            Decision::Deny { reason } => {
                let class = registry.name_of(self.owner);
                let caller = caller.map(|c| registry.name_of(c));
                tracing::warn!(
                    method = %self.name,
                    class = %class,
                    caller = caller.as_deref().unwrap_or("<top level>"),
                    policy = %self.policy,
                    %reason,
                    "access violation"
                );
                Err(Error::AccessViolation {
                    method: self.name.clone(),
                    policy: self.policy,
                    class,
                    caller,
                })
            }
        }
    }

    pub(crate) fn invoke(
        &self,
        runtime: &Runtime,
        ctx: &mut ContextStack,
        receiver: &mut Object,
        args: &[Value],
    ) -> Result<Value> {
        match self.kind {
            MethodKind::Special => self.run(runtime, ctx, receiver, args),
            MethodKind::Guarded => {
                self.authorize(runtime.registry(), ctx)?;
                let mut frame = ctx.enter(self.owner);
                self.run(runtime, &mut frame, receiver, args)
            }
        }
    }

    fn run(
        &self,
        runtime: &Runtime,
        ctx: &mut ContextStack,
        receiver: &mut Object,
        args: &[Value],
    ) -> Result<Value> {
        let mut invocation = Invocation::new(runtime, ctx, receiver, self);
        (self.body)(&mut invocation, args)
    }
}

impl fmt::Debug for WrappedMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrappedMethod")
            .field("name", &self.name)
            .field("policy", &self.policy)
            .field("owner", &self.owner)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Fixed table of a class's own wrapped methods, in declaration order.
#[derive(Debug, Default)]
pub struct MethodTable {
    methods: Vec<WrappedMethod>,
    index: HashMap<String, usize>,
}

impl MethodTable {
    pub fn get(&self, name: &str) -> Option<&WrappedMethod> {
        self.index.get(name).map(|&i| &self.methods[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &WrappedMethod> {
        self.methods.iter()
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

/// Wrap every declared method of `owner`.
pub(crate) fn wrap_methods(
    owner: ClassId,
    class_name: &str,
    methods: Vec<MethodDef>,
) -> Result<MethodTable> {
    let mut table = MethodTable::default();

    for method in methods {
        let (name, policy, body) = method.into_parts();
        if table.index.contains_key(&name) {
            return Err(Error::DuplicateMethod {
                class: class_name.to_string(),
                method: name,
            });
        }

        let kind = if is_special(&name) {
            MethodKind::Special
        } else {
            MethodKind::Guarded
        };

        table.index.insert(name.clone(), table.methods.len());
        table.methods.push(WrappedMethod {
            name,
            policy,
            owner,
            kind,
            body,
        });
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(name: &str) -> MethodDef {
        MethodDef::new(name, |_, _| Ok(Value::Null))
    }

    #[test]
    fn test_special_names() {
        assert!(is_special("__init__"));
        assert!(is_special("__secret"));
        assert!(!is_special("_balance"));
        assert!(!is_special("report"));
    }

    #[test]
    fn test_wrap_preserves_declaration_order_and_policy() {
        let owner = ClassId::from_raw(0);
        let table = wrap_methods(
            owner,
            "Account",
            vec![
                noop("__init__"),
                noop("_balance").with_policy(AccessPolicy::Private),
                noop("report"),
            ],
        )
        .unwrap();

        let names: Vec<_> = table.iter().map(|m| m.name()).collect();
        assert_eq!(names, ["__init__", "_balance", "report"]);

        let init = table.get("__init__").unwrap();
        assert_eq!(init.kind(), MethodKind::Special);

        let balance = table.get("_balance").unwrap();
        assert_eq!(balance.policy(), AccessPolicy::Private);
        assert_eq!(balance.kind(), MethodKind::Guarded);
        assert_eq!(balance.owner(), owner);

        assert_eq!(table.get("report").unwrap().policy(), AccessPolicy::Public);
    }

    #[test]
    fn test_duplicate_method_rejected() {
        let err = wrap_methods(
            ClassId::from_raw(0),
            "Account",
            vec![noop("report"), noop("report")],
        )
        .unwrap_err();
        assert!(matches!(err, Error::DuplicateMethod { .. }));
    }
}
