//! Method dispatch.

use crate::wrap::WrappedMethod;
use crate::{ClassBuilder, ClassId, ClassRegistry, ContextStack, Error, Object, Result};
use serde_json::Value;

/// Name of the special method run by [`Runtime::construct`].
pub const INITIALIZER: &str = "__init__";

/// A set of defined classes and the entry point for calling their methods.
///
/// Definition needs `&mut self`; calls only need `&self`, so a finished
/// runtime can be shared across threads. Each thread brings its own
/// [`ContextStack`].
#[derive(Debug, Default)]
pub struct Runtime {
    registry: ClassRegistry,
}

impl Runtime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a class, wrapping each of its methods once.
    pub fn define(&mut self, class: ClassBuilder) -> Result<ClassId> {
        self.registry.define(class)
    }

    pub fn registry(&self) -> &ClassRegistry {
        &self.registry
    }

    /// Latest class defined under `name`.
    pub fn class(&self, name: &str) -> Result<ClassId> {
        self.registry.lookup(name)
    }

    /// Create an instance without running its initializer.
    pub fn instantiate(&self, class: ClassId, state: Value) -> Result<Object> {
        self.registry.get(class)?;
        Ok(Object::new(class, state))
    }

    /// Create an instance and run `__init__` if the class has one.
    pub fn construct(&self, ctx: &mut ContextStack, class: ClassId, args: &[Value]) -> Result<Object> {
        let mut object = self.instantiate(class, Value::Null)?;
        match self.registry.resolve(class, INITIALIZER) {
            Ok(init) => {
                init.invoke(self, ctx, &mut object, args)?;
            }
            Err(Error::NoSuchMethod { .. }) => {}
            Err(e) => return Err(e),
        }
        Ok(object)
    }

    /// Call `method` on `receiver` from the context on `ctx`.
    pub fn invoke(
        &self,
        ctx: &mut ContextStack,
        receiver: &mut Object,
        method: &str,
        args: &[Value],
    ) -> Result<Value> {
        let wrapped = self.registry.resolve(receiver.class(), method)?;
        wrapped.invoke(self, ctx, receiver, args)
    }
}

/// What a method body sees while it runs.
pub struct Invocation<'a> {
    runtime: &'a Runtime,
    ctx: &'a mut ContextStack,
    receiver: &'a mut Object,
    method: &'a WrappedMethod,
}

impl<'a> Invocation<'a> {
    pub(crate) fn new(
        runtime: &'a Runtime,
        ctx: &'a mut ContextStack,
        receiver: &'a mut Object,
        method: &'a WrappedMethod,
    ) -> Self {
        Self {
            runtime,
            ctx,
            receiver,
            method,
        }
    }

    pub fn runtime(&self) -> &'a Runtime {
        self.runtime
    }

    pub fn this(&self) -> &Object {
        self.receiver
    }

    pub fn this_mut(&mut self) -> &mut Object {
        self.receiver
    }

    pub fn method(&self) -> &str {
        self.method.name()
    }

    /// Class that declared the running method.
    pub fn owner(&self) -> ClassId {
        self.method.owner()
    }

    /// Innermost executing class. For special methods this is the caller's.
    pub fn current(&self) -> Option<ClassId> {
        self.ctx.current()
    }

    pub fn context(&self) -> &ContextStack {
        self.ctx
    }

    /// Call a method on the receiver, as `self.method(args)`.
    pub fn call_self(&mut self, method: &str, args: &[Value]) -> Result<Value> {
        self.runtime.invoke(self.ctx, self.receiver, method, args)
    }

    /// Call a method on another object from inside this method.
    pub fn call(&mut self, target: &mut Object, method: &str, args: &[Value]) -> Result<Value> {
        self.runtime.invoke(self.ctx, target, method, args)
    }

    /// Construct an instance of the latest class named `class`.
    pub fn construct(&mut self, class: &str, args: &[Value]) -> Result<Object> {
        let class = self.runtime.class(class)?;
        self.runtime.construct(self.ctx, class, args)
    }

    /// Error for the body to return when it fails.
    pub fn raise(&self, message: impl Into<String>) -> Error {
        Error::Raised {
            class: self.runtime.registry().name_of(self.method.owner()),
            method: self.method.name().to_string(),
            message: message.into(),
        }
    }
}
