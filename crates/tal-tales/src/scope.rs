//! Named bindings visible to expression evaluation.

use std::collections::HashMap;

use crate::Value;

/// A mapping of names to [`Value`]s.
///
/// Traversals carry two scopes: a local scope that is cloned on entry to
/// every element (so bindings never leak to siblings or ancestors), and a
/// single global scope shared by the whole traversal. The scope type itself
/// is agnostic to that lifecycle.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scope {
    bindings: HashMap<String, Value>,
}

impl Scope {
    /// Create an empty scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a scope from the entries of a JSON object.
    ///
    /// Non-object values produce an empty scope.
    #[must_use]
    pub fn from_json(data: &serde_json::Value) -> Self {
        let serde_json::Value::Object(entries) = data else {
            return Self::new();
        };
        Self {
            bindings: entries
                .iter()
                .map(|(key, item)| (key.clone(), Value::from(item)))
                .collect(),
        }
    }

    /// Look up a binding.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    /// Bind `name` to `value`, replacing any previous binding.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.bindings.insert(name.into(), value.into());
    }

    /// Whether the scope has no bindings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl FromIterator<(String, Value)> for Scope {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            bindings: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_set_and_get() {
        let mut scope = Scope::new();
        scope.set("answer", 42);
        assert_eq!(scope.get("answer"), Some(&Value::Int(42)));
        assert_eq!(scope.get("question"), None);
    }

    #[test]
    fn test_from_json_object() {
        let scope = Scope::from_json(&json!({"a": 1, "b": [true]}));
        assert_eq!(scope.get("a"), Some(&Value::Int(1)));
        assert_eq!(scope.get("b"), Some(&Value::Sequence(vec![true.into()])));
    }

    #[test]
    fn test_from_json_non_object() {
        assert!(Scope::from_json(&json!([1, 2, 3])).is_empty());
    }

    #[test]
    fn test_clone_is_independent() {
        let mut parent = Scope::new();
        parent.set("shared", "original");

        let mut child = parent.clone();
        child.set("shared", "shadowed");
        child.set("extra", 1);

        assert_eq!(parent.get("shared"), Some(&"original".into()));
        assert_eq!(parent.get("extra"), None);
    }
}
