//! Class manifests loaded from TOML.
//!
//! A manifest declares classes, their bases, nesting and methods. Method
//! bodies are short step lists, enough to express calls between classes.

use policy::AccessPolicy;
use runtime::{ClassBuilder, Invocation, MethodDef, Runtime};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Top-level manifest.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Reject unknown policy tags instead of treating them as public.
    #[serde(default)]
    pub strict: bool,

    #[serde(default, rename = "class")]
    pub classes: Vec<ClassSpec>,
}

/// One class declaration.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassSpec {
    pub name: String,

    /// Base classes, searched left to right.
    #[serde(default)]
    pub bases: Vec<String>,

    /// Class whose namespace declares this one.
    pub nested_in: Option<String>,

    #[serde(default)]
    pub methods: BTreeMap<String, MethodSpec>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MethodSpec {
    /// `public`, `protected` or `private`. Unset means public.
    pub policy: Option<String>,

    #[serde(default)]
    pub body: Vec<Step>,
}

/// A body step. The value of the last step is the method's result.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Yield a literal value.
    Return(Value),
    /// Yield a positional argument, `null` when absent.
    Arg(usize),
    /// Call `self.<method>` or `<Class>.<method>` on a fresh instance.
    Call(String),
    /// Fail with a message.
    Raise(String),
}

/// A step with its call target resolved.
#[derive(Debug, Clone)]
enum Action {
    Literal(Value),
    Arg(usize),
    CallSelf(String),
    CallNew { class: String, method: String },
    Raise(String),
}

impl Manifest {
    /// Load a manifest from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse a manifest from a TOML string.
    pub fn parse(toml: &str) -> Result<Self, ManifestError> {
        toml::from_str(toml).map_err(|e| ManifestError::Parse(e.to_string()))
    }

    /// Define every class in dependency order.
    pub fn build(&self) -> Result<Runtime, ManifestError> {
        let mut runtime = Runtime::new();
        let mut ids = HashMap::new();

        for spec in self.definition_order()? {
            let defined = |reference: &String| {
                ids.get(reference.as_str())
                    .copied()
                    .ok_or_else(|| ManifestError::UnknownClass {
                        class: spec.name.clone(),
                        reference: reference.clone(),
                    })
            };

            let mut builder = ClassBuilder::new(&spec.name);
            for base in &spec.bases {
                builder = builder.extends(defined(base)?);
            }
            if let Some(outer) = &spec.nested_in {
                builder = builder.nested_in(defined(outer)?);
            }
            for (name, method) in &spec.methods {
                builder = builder.def(self.method_def(&spec.name, name, method)?);
            }

            let id = runtime.define(builder)?;
            ids.insert(spec.name.as_str(), id);
        }

        Ok(runtime)
    }

    /// Classes ordered so bases and outer classes come first.
    fn definition_order(&self) -> Result<Vec<&ClassSpec>, ManifestError> {
        let mut by_name: HashMap<&str, &ClassSpec> = HashMap::new();
        for spec in &self.classes {
            if by_name.insert(spec.name.as_str(), spec).is_some() {
                return Err(ManifestError::DuplicateClass(spec.name.clone()));
            }
        }

        for spec in &self.classes {
            for dep in spec.bases.iter().chain(spec.nested_in.iter()) {
                if !by_name.contains_key(dep.as_str()) {
                    return Err(ManifestError::UnknownClass {
                        class: spec.name.clone(),
                        reference: dep.clone(),
                    });
                }
            }
        }

        let mut order = Vec::with_capacity(self.classes.len());
        let mut state: HashMap<&str, Visit> = HashMap::new();
        for spec in &self.classes {
            visit(spec, &by_name, &mut state, &mut order)?;
        }
        Ok(order)
    }

    fn method_def(
        &self,
        class: &str,
        name: &str,
        spec: &MethodSpec,
    ) -> Result<MethodDef, ManifestError> {
        let actions = spec
            .body
            .iter()
            .map(|step| compile(class, name, step))
            .collect::<Result<Vec<_>, _>>()?;

        let def = MethodDef::new(name, move |inv, args| run(&actions, inv, args));
        let Some(tag) = spec.policy.as_deref() else {
            return Ok(def);
        };
        let policy = if self.strict {
            tag.parse::<AccessPolicy>()?
        } else {
            AccessPolicy::from_tag(tag)
        };
        Ok(def.with_policy(policy))
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

fn visit<'m>(
    spec: &'m ClassSpec,
    by_name: &HashMap<&str, &'m ClassSpec>,
    state: &mut HashMap<&'m str, Visit>,
    order: &mut Vec<&'m ClassSpec>,
) -> Result<(), ManifestError> {
    match state.get(spec.name.as_str()) {
        Some(Visit::Done) => return Ok(()),
        Some(Visit::InProgress) => return Err(ManifestError::Cycle(spec.name.clone())),
        None => {}
    }

    state.insert(spec.name.as_str(), Visit::InProgress);
    for dep in spec.bases.iter().chain(spec.nested_in.iter()) {
        visit(by_name[dep.as_str()], by_name, state, order)?;
    }
    state.insert(spec.name.as_str(), Visit::Done);
    order.push(spec);
    Ok(())
}

fn compile(class: &str, method: &str, step: &Step) -> Result<Action, ManifestError> {
    Ok(match step {
        Step::Return(value) => Action::Literal(value.clone()),
        Step::Arg(index) => Action::Arg(*index),
        Step::Raise(message) => Action::Raise(message.clone()),
        Step::Call(target) => match target.split_once('.') {
            Some(("self", name)) if !name.is_empty() => Action::CallSelf(name.to_string()),
            Some((receiver, name)) if !receiver.is_empty() && !name.is_empty() => {
                Action::CallNew {
                    class: receiver.to_string(),
                    method: name.to_string(),
                }
            }
            _ => {
                return Err(ManifestError::InvalidCall {
                    class: class.to_string(),
                    method: method.to_string(),
                    target: target.clone(),
                });
            }
        },
    })
}

fn run(actions: &[Action], inv: &mut Invocation<'_>, args: &[Value]) -> runtime::Result<Value> {
    let mut last = Value::Null;
    for action in actions {
        last = match action {
            Action::Literal(value) => value.clone(),
            Action::Arg(index) => args.get(*index).cloned().unwrap_or(Value::Null),
            Action::Raise(message) => return Err(inv.raise(message.clone())),
            Action::CallSelf(method) => inv.call_self(method, &[])?,
            Action::CallNew { class, method } => {
                let mut target = inv.construct(class, &[])?;
                inv.call(&mut target, method, &[])?
            }
        };
    }
    Ok(last)
}

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("failed to read manifest: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse manifest: {0}")]
    Parse(String),

    #[error("class '{0}' is declared more than once")]
    DuplicateClass(String),

    #[error("class '{class}' refers to undeclared class '{reference}'")]
    UnknownClass { class: String, reference: String },

    #[error("class '{0}' depends on itself through its bases or nesting")]
    Cycle(String),

    #[error("{class}.{method}: invalid call target '{target}', expected self.<method> or <Class>.<method>")]
    InvalidCall {
        class: String,
        method: String,
        target: String,
    },

    #[error(transparent)]
    Policy(#[from] policy::Error),

    #[error(transparent)]
    Runtime(#[from] runtime::Error),
}
