// Named-value environment expressions are evaluated against.

use indexmap::IndexMap;

use crate::expr::Value;

/// Ordered mapping from variable name to value.
///
/// One scope is built per repetition row (base variables overlaid with
/// the row) and mutated in place as groups are resolved. Scopes are
/// cloned, never shared, across rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableScope {
    values: IndexMap<String, Value>,
}

impl VariableScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Present and not null.
    pub fn get_non_null(&self, name: &str) -> Option<&Value> {
        self.values.get(name).filter(|v| !v.is_null())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Insert or overwrite a variable, keeping its original position.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    /// A copy of this scope with `overlay` written over it.
    pub fn overlaid<I, K>(&self, overlay: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut merged = self.clone();
        for (name, value) in overlay {
            merged.set(name, value);
        }
        merged
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for VariableScope {
    fn from_iter<T: IntoIterator<Item = (K, Value)>>(iter: T) -> Self {
        Self::new().overlaid(iter)
    }
}
