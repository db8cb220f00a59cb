use crate::ClassId;
use serde_json::{Map, Value};

/// An instance of a defined class.
///
/// State is an open JSON document; fields carry no visibility of their own.
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    class: ClassId,
    state: Value,
}

impl Object {
    pub(crate) fn new(class: ClassId, state: Value) -> Self {
        Self { class, state }
    }

    pub fn class(&self) -> ClassId {
        self.class
    }

    pub fn state(&self) -> &Value {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut Value {
        &mut self.state
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.state.get(key)
    }

    /// Set a field, turning non-object state into an empty object first.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        if !self.state.is_object() {
            self.state = Value::Object(Map::new());
        }
        if let Value::Object(fields) = &mut self.state {
            fields.insert(key.into(), value);
        }
    }
}
