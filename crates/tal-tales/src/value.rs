//! Context value model.
//!
//! Path resolution steps through values by shape: named zero-argument
//! operations on opaque objects, keys on mappings, integer indexes on
//! sequences. Scalars end the walk.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// An opaque object exposing named zero-argument operations to path
/// resolution.
///
/// When a path atom lands on a [`Value::Object`], the atom is passed to
/// [`invoke`](NamedOps::invoke); a `Some` result continues the walk with the
/// returned value, `None` makes the walk undefined.
pub trait NamedOps: fmt::Debug {
    /// Invoke the zero-argument operation `name`, if this object exposes it.
    fn invoke(&self, name: &str) -> Option<Value>;
}

/// A value held in a context scope.
#[derive(Clone, Debug)]
pub enum Value {
    /// Explicit null. Resolves like a missing key during path walks.
    Null,
    /// Boolean scalar.
    Bool(bool),
    /// Integer scalar.
    Int(i64),
    /// Floating-point scalar.
    Float(f64),
    /// Text scalar.
    String(String),
    /// Ordered sequence, indexable by plain-integer path atoms.
    Sequence(Vec<Value>),
    /// Keyed mapping, indexable by arbitrary path atoms.
    Mapping(BTreeMap<String, Value>),
    /// Opaque object exposing named zero-argument operations.
    Object(Rc<dyn NamedOps>),
}

impl Value {
    /// Truthiness as used by `not:` and by condition-style directives.
    ///
    /// Null, `false`, numeric zero and empty strings/sequences/mappings are
    /// falsy; objects and everything else are truthy.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Int(n) => *n != 0,
            Self::Float(x) => *x != 0.0,
            Self::String(s) => !s.is_empty(),
            Self::Sequence(items) => !items.is_empty(),
            Self::Mapping(entries) => !entries.is_empty(),
            Self::Object(_) => true,
        }
    }

    /// Wrap an object implementing [`NamedOps`].
    #[must_use]
    pub fn object<T: NamedOps + 'static>(object: T) -> Self {
        Self::Object(Rc::new(object))
    }
}

/// Textual rendering used by string interpolation and content substitution.
///
/// Null renders empty; sequences and mappings render their items separated
/// by `, `.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => f.write_str(s),
            Self::Sequence(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            Self::Mapping(entries) => {
                for (i, (key, item)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {item}")?;
                }
                Ok(())
            }
            Self::Object(_) => f.write_str("<object>"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Sequence(a), Self::Sequence(b)) => a == b,
            (Self::Mapping(a), Self::Mapping(b)) => a == b,
            // Objects compare by identity
            (Self::Object(a), Self::Object(b)) => {
                Rc::as_ptr(a).cast::<()>() == Rc::as_ptr(b).cast::<()>()
            }
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Self::Sequence(value)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map_or_else(|| Self::Float(n.as_f64().unwrap_or(0.0)), Self::Int),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::Sequence(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(entries) => Self::Mapping(
                entries
                    .into_iter()
                    .map(|(key, item)| (key, Self::from(item)))
                    .collect(),
            ),
        }
    }
}

impl From<&serde_json::Value> for Value {
    fn from(value: &serde_json::Value) -> Self {
        Self::from(value.clone())
    }
}
