//! Registry of defined classes.

use crate::wrap::{MethodKind, MethodTable, WrappedMethod, wrap_methods};
use crate::{ClassBuilder, ClassId, Error, Result};
use policy::{AccessPolicy, Lineage};
use serde::Serialize;
use std::collections::HashMap;

/// One row of a class's method table, for listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodSummary {
    pub class: String,
    pub method: String,
    pub policy: AccessPolicy,
    pub special: bool,
}

/// A defined class with its wrapped method table.
#[derive(Debug)]
pub struct Class {
    id: ClassId,
    name: String,
    bases: Vec<ClassId>,
    outer: Option<ClassId>,
    nested: HashMap<String, ClassId>,
    /// Self first, then ancestors in lookup order.
    mro: Vec<ClassId>,
    methods: MethodTable,
}

impl Class {
    pub fn id(&self) -> ClassId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bases(&self) -> &[ClassId] {
        &self.bases
    }

    pub fn outer(&self) -> Option<ClassId> {
        self.outer
    }

    /// Class declared in this class's namespace under `name`.
    pub fn nested(&self, name: &str) -> Option<ClassId> {
        self.nested.get(name).copied()
    }

    pub fn mro(&self) -> &[ClassId] {
        &self.mro
    }

    pub fn methods(&self) -> &MethodTable {
        &self.methods
    }
}

/// All classes known to a runtime, indexed by [`ClassId`].
#[derive(Debug, Default)]
pub struct ClassRegistry {
    classes: Vec<Class>,
    by_name: HashMap<String, ClassId>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a class and wrap its methods.
    ///
    /// Names need not be unique; [`ClassRegistry::lookup`] returns the most
    /// recent definition.
    pub(crate) fn define(&mut self, builder: ClassBuilder) -> Result<ClassId> {
        let ClassBuilder {
            name,
            bases,
            outer,
            methods,
        } = builder;

        for base in &bases {
            self.get(*base)?;
        }
        if let Some(outer) = outer {
            let outer_class = self.get(outer)?;
            if outer_class.nested.contains_key(&name) {
                return Err(Error::DuplicateNested {
                    outer: outer_class.name.clone(),
                    name,
                });
            }
        }

        let id = ClassId::from_raw(self.classes.len());
        let methods = wrap_methods(id, &name, methods)?;
        let mro = self.linearize(id, &bases);

        if let Some(outer) = outer {
            self.classes[outer.index()].nested.insert(name.clone(), id);
        }
        self.by_name.insert(name.clone(), id);

        tracing::debug!(
            class = %name,
            id = %id,
            methods = methods.len(),
            "defined class"
        );

        self.classes.push(Class {
            id,
            name,
            bases,
            outer,
            nested: HashMap::new(),
            mro,
            methods,
        });
        Ok(id)
    }

    // Depth-first, left to right, first occurrence wins.
    fn linearize(&self, id: ClassId, bases: &[ClassId]) -> Vec<ClassId> {
        let mut mro = vec![id];
        for base in bases {
            for ancestor in &self.classes[base.index()].mro {
                if !mro.contains(ancestor) {
                    mro.push(*ancestor);
                }
            }
        }
        mro
    }

    pub fn get(&self, id: ClassId) -> Result<&Class> {
        self.classes
            .get(id.index())
            .ok_or_else(|| Error::UnknownClass(id.to_string()))
    }

    /// Latest class defined under `name`.
    pub fn lookup(&self, name: &str) -> Result<ClassId> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownClass(name.to_string()))
    }

    /// Display name for a class, falling back to its id.
    pub fn name_of(&self, id: ClassId) -> String {
        match self.classes.get(id.index()) {
            Some(class) => class.name.clone(),
            None => id.to_string(),
        }
    }

    /// Find `method` along the class's MRO.
    pub fn resolve(&self, class: ClassId, method: &str) -> Result<&WrappedMethod> {
        let target = self.get(class)?;
        target
            .mro
            .iter()
            .find_map(|ancestor| self.classes[ancestor.index()].methods.get(method))
            .ok_or_else(|| Error::NoSuchMethod {
                class: target.name.clone(),
                method: method.to_string(),
            })
    }

    /// Every declared method of every class, in definition order.
    pub fn summaries(&self) -> Vec<MethodSummary> {
        self.classes
            .iter()
            .flat_map(|class| {
                class.methods.iter().map(|method| MethodSummary {
                    class: class.name.clone(),
                    method: method.name().to_string(),
                    policy: method.policy(),
                    special: method.kind() == MethodKind::Special,
                })
            })
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Class> {
        self.classes.iter()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl Lineage<ClassId> for ClassRegistry {
    fn is_subclass(&self, child: ClassId, parent: ClassId) -> bool {
        self.get(child)
            .map(|class| class.mro.contains(&parent))
            .unwrap_or(false)
    }

    fn is_nested_in(&self, inner: ClassId, outer: ClassId) -> bool {
        let (Ok(inner), Ok(outer)) = (self.get(inner), self.get(outer)) else {
            return false;
        };
        outer.nested(&inner.name) == Some(inner.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn define(registry: &mut ClassRegistry, builder: ClassBuilder) -> ClassId {
        registry.define(builder).unwrap()
    }

    #[test]
    fn test_subclass_is_reflexive_and_transitive() {
        let mut registry = ClassRegistry::new();
        let animal = define(&mut registry, ClassBuilder::new("Animal"));
        let dog = define(&mut registry, ClassBuilder::new("Dog").extends(animal));
        let puppy = define(&mut registry, ClassBuilder::new("Puppy").extends(dog));
        let rock = define(&mut registry, ClassBuilder::new("Rock"));

        assert!(registry.is_subclass(animal, animal));
        assert!(registry.is_subclass(dog, animal));
        assert!(registry.is_subclass(puppy, animal));
        assert!(!registry.is_subclass(animal, dog));
        assert!(!registry.is_subclass(rock, animal));
    }

    #[test]
    fn test_mro_with_multiple_bases() {
        let mut registry = ClassRegistry::new();
        let base = define(&mut registry, ClassBuilder::new("Base"));
        let left = define(&mut registry, ClassBuilder::new("Left").extends(base));
        let right = define(&mut registry, ClassBuilder::new("Right").extends(base));
        let both = define(
            &mut registry,
            ClassBuilder::new("Both").extends(left).extends(right),
        );

        assert_eq!(registry.get(both).unwrap().mro(), &[both, left, base, right]);
        assert!(registry.is_subclass(both, right));
    }

    #[test]
    fn test_nested_equivalence_is_direct_only() {
        let mut registry = ClassRegistry::new();
        let outer = define(&mut registry, ClassBuilder::new("Outer"));
        let inner = define(&mut registry, ClassBuilder::new("Inner").nested_in(outer));
        let deeper = define(&mut registry, ClassBuilder::new("Deeper").nested_in(inner));
        // Same name as the nested class, but a different class object.
        let impostor = define(&mut registry, ClassBuilder::new("Inner"));

        assert!(registry.is_nested_in(inner, outer));
        assert!(registry.is_nested_in(deeper, inner));
        assert!(!registry.is_nested_in(deeper, outer));
        assert!(!registry.is_nested_in(outer, inner));
        assert!(!registry.is_nested_in(impostor, outer));
    }

    #[test]
    fn test_duplicate_nested_name_rejected() {
        let mut registry = ClassRegistry::new();
        let outer = define(&mut registry, ClassBuilder::new("Outer"));
        define(&mut registry, ClassBuilder::new("Helper").nested_in(outer));

        let err = registry
            .define(ClassBuilder::new("Helper").nested_in(outer))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateNested { .. }));
    }

    #[test]
    fn test_lookup_returns_latest_definition() {
        let mut registry = ClassRegistry::new();
        let first = define(&mut registry, ClassBuilder::new("Widget"));
        let second = define(&mut registry, ClassBuilder::new("Widget"));

        assert_ne!(first, second);
        assert_eq!(registry.lookup("Widget").unwrap(), second);
        assert!(matches!(
            registry.lookup("Gadget"),
            Err(Error::UnknownClass(_))
        ));
    }

    #[test]
    fn test_resolve_reports_declaring_owner() {
        let mut registry = ClassRegistry::new();
        let animal = define(
            &mut registry,
            ClassBuilder::new("Animal").protected("sound", |_, _| Ok(Value::Null)),
        );
        let dog = define(
            &mut registry,
            ClassBuilder::new("Dog")
                .extends(animal)
                .public("bark", |_, _| Ok(Value::Null)),
        );

        assert_eq!(registry.resolve(dog, "sound").unwrap().owner(), animal);
        assert_eq!(registry.resolve(dog, "bark").unwrap().owner(), dog);
        assert!(matches!(
            registry.resolve(animal, "bark"),
            Err(Error::NoSuchMethod { .. })
        ));
    }

    #[test]
    fn test_summaries_list_declared_methods() {
        let mut registry = ClassRegistry::new();
        define(
            &mut registry,
            ClassBuilder::new("Account")
                .method("__init__", |_, _| Ok(Value::Null))
                .private("_balance", |_, _| Ok(Value::Null)),
        );

        let rows = registry.summaries();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].special);
        assert_eq!(rows[1].method, "_balance");
        assert_eq!(rows[1].policy, AccessPolicy::Private);
        assert!(!rows[1].special);
    }

    #[test]
    fn test_unknown_base_rejected() {
        let mut other = ClassRegistry::new();
        define(&mut other, ClassBuilder::new("A"));
        let foreign = define(&mut other, ClassBuilder::new("B"));

        let mut registry = ClassRegistry::new();
        let err = registry
            .define(ClassBuilder::new("C").extends(foreign))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownClass(_)));
    }
}
