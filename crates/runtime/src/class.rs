//! Class definitions as handed to the runtime.

use crate::{Invocation, Result};
use policy::AccessPolicy;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Identity of a defined class. Also the owner marker pushed on the
/// [`ContextStack`](crate::ContextStack).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(usize);

impl ClassId {
    pub(crate) fn from_raw(raw: usize) -> Self {
        Self(raw)
    }

    pub(crate) fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The original body of a method.
pub type MethodBody = Arc<dyn Fn(&mut Invocation<'_>, &[Value]) -> Result<Value> + Send + Sync>;

/// A method as declared, before wrapping.
#[derive(Clone)]
pub struct MethodDef {
    name: String,
    policy: Option<AccessPolicy>,
    body: MethodBody,
}

impl MethodDef {
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut Invocation<'_>, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            policy: None,
            body: Arc::new(body),
        }
    }

    pub fn with_policy(mut self, policy: AccessPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared policy, public when none was attached.
    pub fn access_policy(&self) -> AccessPolicy {
        self.policy.unwrap_or_default()
    }

    pub(crate) fn into_parts(self) -> (String, AccessPolicy, MethodBody) {
        let policy = self.access_policy();
        (self.name, policy, self.body)
    }
}

impl fmt::Debug for MethodDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDef")
            .field("name", &self.name)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// A class declaration, consumed by [`Runtime::define`](crate::Runtime::define).
#[derive(Debug, Clone)]
pub struct ClassBuilder {
    pub(crate) name: String,
    pub(crate) bases: Vec<ClassId>,
    pub(crate) outer: Option<ClassId>,
    pub(crate) methods: Vec<MethodDef>,
}

impl ClassBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bases: Vec::new(),
            outer: None,
            methods: Vec::new(),
        }
    }

    /// Add a base class. Bases are searched in the order they are added.
    pub fn extends(mut self, base: ClassId) -> Self {
        self.bases.push(base);
        self
    }

    /// Declare this class inside `outer`'s namespace.
    pub fn nested_in(mut self, outer: ClassId) -> Self {
        self.outer = Some(outer);
        self
    }

    /// Add a method with no declared policy.
    pub fn method<F>(mut self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut Invocation<'_>, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.methods.push(MethodDef::new(name, body));
        self
    }

    pub fn public<F>(self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut Invocation<'_>, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.with_policy(name, AccessPolicy::Public, body)
    }

    pub fn protected<F>(self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut Invocation<'_>, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.with_policy(name, AccessPolicy::Protected, body)
    }

    pub fn private<F>(self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut Invocation<'_>, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.with_policy(name, AccessPolicy::Private, body)
    }

    /// Add a method tagged with a policy name. Unknown tags mean public.
    pub fn tagged<F>(self, name: impl Into<String>, tag: &str, body: F) -> Self
    where
        F: Fn(&mut Invocation<'_>, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.with_policy(name, AccessPolicy::from_tag(tag), body)
    }

    pub fn with_policy<F>(mut self, name: impl Into<String>, policy: AccessPolicy, body: F) -> Self
    where
        F: Fn(&mut Invocation<'_>, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.methods
            .push(MethodDef::new(name, body).with_policy(policy));
        self
    }

    /// Add an already built method definition.
    pub fn def(mut self, method: MethodDef) -> Self {
        self.methods.push(method);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
