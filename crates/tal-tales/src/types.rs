//! Expression type registry contract and built-in types.

use crate::{Evaluator, Scope, TalesError, Value};

/// Handler for one expression type prefix.
///
/// Implementations receive the expression body (the part after `type:`) and
/// the context scopes in search order. They may call back into the
/// [`Evaluator`] to evaluate nested expressions.
///
/// # Example
///
/// ```
/// use tal_tales::{Evaluator, ExpressionType, Scope, TalesError, Value};
///
/// /// `len:expr` — length of a sequence or string, undefined otherwise.
/// struct LenType;
///
/// impl ExpressionType for LenType {
///     fn name(&self) -> &str { "len" }
///
///     fn evaluate(
///         &self,
///         tales: &Evaluator,
///         body: &str,
///         contexts: &[&Scope],
///     ) -> Result<Option<Value>, TalesError> {
///         Ok(tales.value(body, contexts)?.and_then(|value| match value {
///             Value::Sequence(items) => i64::try_from(items.len()).ok().map(Value::Int),
///             Value::String(s) => i64::try_from(s.len()).ok().map(Value::Int),
///             _ => None,
///         }))
///     }
/// }
///
/// let mut scope = Scope::new();
/// scope.set("word", "brains");
///
/// let mut tales = Evaluator::new();
/// tales.register(LenType);
/// assert_eq!(tales.value("len:word", &[&scope]).unwrap(), Some(6.into()));
/// ```
pub trait ExpressionType: Send {
    /// Type prefix this handler is registered under (e.g. `path`).
    fn name(&self) -> &str;

    /// Evaluate an expression body. `Ok(None)` means undefined.
    ///
    /// # Errors
    ///
    /// [`TalesError::UnknownExpressionType`] from nested evaluation; handlers
    /// introduce no other failure modes.
    fn evaluate(
        &self,
        tales: &Evaluator,
        body: &str,
        contexts: &[&Scope],
    ) -> Result<Option<Value>, TalesError>;
}

/// The default `path:` expression type.
pub struct PathType;

impl ExpressionType for PathType {
    fn name(&self) -> &str {
        "path"
    }

    fn evaluate(
        &self,
        tales: &Evaluator,
        body: &str,
        contexts: &[&Scope],
    ) -> Result<Option<Value>, TalesError> {
        Ok(tales.process_path(body, contexts))
    }
}

/// The `string:` interpolation expression type.
pub struct StringType;

impl ExpressionType for StringType {
    fn name(&self) -> &str {
        "string"
    }

    fn evaluate(
        &self,
        tales: &Evaluator,
        body: &str,
        contexts: &[&Scope],
    ) -> Result<Option<Value>, TalesError> {
        Ok(Some(Value::String(tales.process_string(body, contexts)?)))
    }
}

/// The `not:` negation expression type.
pub struct NotType;

impl ExpressionType for NotType {
    fn name(&self) -> &str {
        "not"
    }

    fn evaluate(
        &self,
        tales: &Evaluator,
        body: &str,
        contexts: &[&Scope],
    ) -> Result<Option<Value>, TalesError> {
        Ok(Some(tales.process_not(body, contexts)?))
    }
}
