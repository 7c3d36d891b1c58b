//! Variable Storage
//!
//! Name-keyed variable storage used by the machine for `PushVariable` and
//! `StoreVariable`. Names are case-sensitive; the last write wins.

use indexmap::IndexMap;

use crate::value::Value;

/// Storage capability the runtime reads and writes script variables through.
/// Implementations may be in-memory, persisted, or remote, but a miss must
/// always read back as [`Value::NULL`].
pub trait VariableStorage: Send {
    fn set_value(&mut self, name: &str, value: Value);

    fn get_value(&self, name: &str) -> Value;

    fn clear(&mut self);

    fn set_number(&mut self, name: &str, number: f64) {
        self.set_value(name, Value::from(number));
    }

    fn set_string(&mut self, name: &str, text: &str) {
        self.set_value(name, Value::from(text));
    }

    fn set_bool(&mut self, name: &str, flag: bool) {
        self.set_value(name, Value::from(flag));
    }
}

/// Default in-memory storage. No eviction, no size bound.
#[derive(Debug, Default, Clone)]
pub struct MemoryVariableStorage {
    values: IndexMap<String, Value>,
}

impl MemoryVariableStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Variables in first-write order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl VariableStorage for MemoryVariableStorage {
    fn set_value(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    fn get_value(&self, name: &str) -> Value {
        self.values.get(name).cloned().unwrap_or(Value::NULL)
    }

    fn clear(&mut self) {
        self.values.clear();
    }
}
