//! TALES expression evaluator.
//!
//! TALES is the small expression language used inside TAL directive
//! attributes. An expression is `type:body` where `type` selects an evaluator
//! (defaulting to `path` when omitted):
//!
//! - `path:` — `|`-separated alternatives of `/`-separated lookups against
//!   the supplied context scopes
//! - `string:` — literal text with `${...}` and `$name` interpolation
//! - `not:` — logical negation of another expression
//!
//! Additional types can be registered on an [`Evaluator`]. Unresolvable
//! paths degrade to `None` ("undefined"); the only hard failure is an
//! unregistered expression type.
//!
//! # Example
//!
//! ```
//! use tal_tales::{Evaluator, Scope, Value};
//!
//! let mut scope = Scope::new();
//! scope.set("greeting", "hello");
//! scope.set("names", Value::Sequence(vec!["world".into(), "moon".into()]));
//!
//! let tales = Evaluator::new();
//! let contexts = [&scope];
//! assert_eq!(tales.value("greeting", &contexts).unwrap(), Some("hello".into()));
//! assert_eq!(tales.value("names/1", &contexts).unwrap(), Some("moon".into()));
//! assert_eq!(
//!     tales.value("string: $greeting ${names/0}", &contexts).unwrap(),
//!     Some("hello world".into()),
//! );
//! ```

mod evaluator;
mod scope;
mod types;
mod value;

pub use evaluator::Evaluator;
pub use scope::Scope;
pub use types::{ExpressionType, NotType, PathType, StringType};
pub use value::{NamedOps, Value};

/// Error raised by expression evaluation.
///
/// Unresolvable paths are not errors; they evaluate to `None`.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum TalesError {
    /// The expression's type prefix has no registered handler.
    #[error("unknown expression type: {0}")]
    UnknownExpressionType(String),
}

/// Split a `;`-separated list into trimmed, non-empty segments.
///
/// A literal semicolon is written `;;` and is restored inside the resulting
/// segments. Empty segments are dropped.
///
/// # Example
///
/// ```
/// use tal_tales::split;
///
/// assert_eq!(split("foo; bar; baz;; narf"), vec!["foo", "bar", "baz; narf"]);
/// ```
#[must_use]
pub fn split(input: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == ';' {
            if chars.peek() == Some(&';') {
                // Escaped semicolon
                chars.next();
                current.push(';');
            } else {
                push_segment(&mut segments, &mut current);
            }
        } else {
            current.push(ch);
        }
    }
    push_segment(&mut segments, &mut current);

    segments
}

fn push_segment(segments: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        segments.push(trimmed.to_owned());
    }
    current.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_split_plain_segments() {
        assert_eq!(split("foo; bar; baz"), vec!["foo", "bar", "baz"]);
    }

    #[test]
    fn test_split_escaped_semicolon() {
        assert_eq!(split("foo; bar; baz;; narf"), vec!["foo", "bar", "baz; narf"]);
    }

    #[test]
    fn test_split_drops_empty_segments() {
        assert_eq!(split("; foo ;;"), vec!["foo ;"]);
        assert_eq!(split(";;;"), vec![";"]);
        assert_eq!(split("  ;  ; "), Vec::<String>::new());
    }

    #[test]
    fn test_split_round_trip() {
        let segments = ["alpha", "beta gamma", "delta"];
        let joined = segments.join("; ");
        assert_eq!(split(&joined), segments);
    }

    #[test]
    fn test_split_empty_input() {
        assert_eq!(split(""), Vec::<String>::new());
    }
}
