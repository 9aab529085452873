//! Expression parsing and dispatch.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::types::{ExpressionType, NotType, PathType, StringType};
use crate::{Scope, TalesError, Value};

/// Pattern for the `type:body` expression form. The type prefix is optional
/// and whitespace around the colon is ignored.
static EXPRESSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^\s*(?:(\w+)\s*:\s*)?(.*)$").expect("invalid expression regex"));

/// Pattern for explicit `${...}` interpolation spans.
static BRACED_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]*)\}").expect("invalid braced interpolation regex"));

/// Pattern for bare `$name` interpolation spans.
static BARE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$(\w*)").expect("invalid bare interpolation regex"));

/// TALES expression evaluator with a registry of expression types.
///
/// Evaluation is pure: the evaluator owns no state beyond the registry, and
/// contexts are searched in the order given (first match wins).
///
/// # Example
///
/// ```
/// use tal_tales::{Evaluator, Scope};
///
/// let mut scope = Scope::new();
/// scope.set("answer", 42);
///
/// let tales = Evaluator::new();
/// assert_eq!(tales.value("answer", &[&scope]).unwrap(), Some(42.into()));
/// assert_eq!(tales.value("missing", &[&scope]).unwrap(), None);
/// ```
pub struct Evaluator {
    types: HashMap<String, Box<dyn ExpressionType>>,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    /// Create an evaluator with the built-in `path`, `string` and `not`
    /// expression types registered.
    #[must_use]
    pub fn new() -> Self {
        let mut tales = Self {
            types: HashMap::new(),
        };
        tales.register(PathType);
        tales.register(StringType);
        tales.register(NotType);
        tales
    }

    /// Register an expression type, replacing any previous handler with the
    /// same name.
    pub fn register<T: ExpressionType + 'static>(&mut self, expression_type: T) {
        self.types
            .insert(expression_type.name().to_owned(), Box::new(expression_type));
    }

    /// Evaluate a full `type:body` expression.
    ///
    /// The type defaults to `path` when omitted. An empty context list is
    /// treated as one empty context. `Ok(None)` means the expression is
    /// undefined.
    ///
    /// # Errors
    ///
    /// [`TalesError::UnknownExpressionType`] if the type prefix has no
    /// registered handler. This is the evaluator's only hard failure.
    pub fn value(
        &self,
        expression: &str,
        contexts: &[&Scope],
    ) -> Result<Option<Value>, TalesError> {
        if contexts.is_empty() {
            let empty = Scope::new();
            return self.value(expression, &[&empty]);
        }

        let captures = EXPRESSION_PATTERN
            .captures(expression)
            .expect("expression pattern matches any input");
        let type_name = captures.get(1).map_or("path", |m| m.as_str());
        let body = captures.get(2).map_or("", |m| m.as_str());

        let handler = self
            .types
            .get(type_name)
            .ok_or_else(|| TalesError::UnknownExpressionType(type_name.to_owned()))?;
        handler.evaluate(self, body, contexts)
    }

    /// Resolve a path expression body against the given contexts.
    ///
    /// The path is split on `|` into alternatives. Contexts are searched
    /// outer-to-inner in the order given; within one context the alternatives
    /// are tried in order, and the first defined value wins. `None` when
    /// every combination is undefined.
    #[must_use]
    pub fn process_path(&self, path: &str, contexts: &[&Scope]) -> Option<Value> {
        for scope in contexts {
            for alternative in path.split('|') {
                let alternative = alternative.trim();
                let alternative = alternative.strip_prefix('/').unwrap_or(alternative);
                if let Some(value) = resolve_alternative(alternative, scope) {
                    return Some(value);
                }
            }
        }
        None
    }

    /// Interpolate `${...}` and `$name` spans in a string body.
    ///
    /// Substitution runs in two sequential passes: first every `${...}`
    /// span, then every bare `$name` span. The passes are not re-entrant
    /// safe: text spliced in by the first pass is visible to the second and
    /// is re-interpreted if it contains `$`. Undefined expressions splice
    /// the empty string.
    ///
    /// # Errors
    ///
    /// Propagates [`TalesError::UnknownExpressionType`] from an interpolated
    /// expression.
    pub fn process_string(
        &self,
        template: &str,
        contexts: &[&Scope],
    ) -> Result<String, TalesError> {
        let first_pass = self.substitute(&BRACED_PATTERN, template, contexts)?;
        self.substitute(&BARE_PATTERN, &first_pass, contexts)
    }

    /// Evaluate an expression and return its logical negation.
    ///
    /// Undefined evaluates as falsy, so `not:` over an undefined expression
    /// is true.
    ///
    /// # Errors
    ///
    /// Propagates [`TalesError::UnknownExpressionType`] from the inner
    /// expression.
    pub fn process_not(&self, expression: &str, contexts: &[&Scope]) -> Result<Value, TalesError> {
        let value = self.value(expression, contexts)?;
        Ok(Value::Bool(!value.as_ref().is_some_and(Value::is_truthy)))
    }

    fn substitute(
        &self,
        pattern: &Regex,
        input: &str,
        contexts: &[&Scope],
    ) -> Result<String, TalesError> {
        let mut output = String::with_capacity(input.len());
        let mut cursor = 0;

        for captures in pattern.captures_iter(input) {
            let span = captures.get(0).expect("whole-match capture is always present");
            output.push_str(&input[cursor..span.start()]);

            let expression = captures.get(1).map_or("", |m| m.as_str());
            if let Some(value) = self.value(expression, contexts)? {
                output.push_str(&value.to_string());
            }
            cursor = span.end();
        }
        output.push_str(&input[cursor..]);

        Ok(output)
    }
}

/// Walk one `/`-separated alternative, starting from a context scope.
fn resolve_alternative(alternative: &str, scope: &Scope) -> Option<Value> {
    let mut atoms = alternative.split('/');
    let first = atoms.next()?;
    let mut current = defined(scope.get(first).cloned())?;
    for atom in atoms {
        current = step(&current, atom)?;
    }
    Some(current)
}

/// Resolve one path atom against the current value.
///
/// Dispatch order: named operation on an object, then mapping key, then
/// sequence index (plain integer atoms only). Scalars end the walk.
fn step(current: &Value, atom: &str) -> Option<Value> {
    let next = match current {
        Value::Object(object) => object.invoke(atom),
        Value::Mapping(entries) => entries.get(atom).cloned(),
        Value::Sequence(items) => sequence_index(atom).and_then(|index| items.get(index).cloned()),
        _ => None,
    };
    defined(next)
}

/// Collapse explicit null into undefined: a key that is present but null
/// resolves exactly like a missing key.
fn defined(value: Option<Value>) -> Option<Value> {
    match value {
        None | Some(Value::Null) => None,
        other => other,
    }
}

/// Parse an atom as a sequence index. Only plain unsigned integer literals
/// qualify; anything else makes the step undefined.
fn sequence_index(atom: &str) -> Option<usize> {
    if atom.is_empty() || !atom.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    atom.parse().ok()
}
