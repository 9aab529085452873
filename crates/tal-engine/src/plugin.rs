//! Language plugin contract.
//!
//! A plugin supplies one namespace's set of directive attributes. The walker
//! matches a node's attributes against each registered plugin's namespace
//! and hands matching directives to the plugin, in the plugin's declared
//! order. Plugin registration order is the outer precedence; the declared
//! directive order is the inner one — together they fully determine the
//! order of operations on a node.

use tal_tales::Scope;

use crate::dom::{Element, Node};
use crate::walker::Engine;
use crate::EngineError;

/// What the walker should do with a node after a directive ran.
///
/// Structural edits are performed by the walker at the node's parent; the
/// handler only reports the intent.
#[derive(Clone, Debug, PartialEq)]
pub enum DirectiveOutcome {
    /// No structural change. The walker continues with the node's remaining
    /// directives and then recurses into its children.
    Keep,
    /// Detach the node. No further directives run and nothing is recursed.
    Remove,
    /// Replace the node with a sequence of nodes, spliced into its position.
    /// No further directives run and the replacements are not recursed.
    Replace(Vec<Node>),
}

/// A template language: one namespace, an ordered set of directives, and a
/// handler.
///
/// Handlers may mutate the element (attributes, children), the local scope
/// (visible to the node's subtree) and the global scope (visible to the
/// rest of the traversal). Scope mutation is the only sanctioned way a
/// directive introduces bindings for other nodes.
///
/// # Thread Safety
///
/// Plugins implement `Send` only (not `Sync`) since each template owns its
/// plugin instances. For parallel rendering, create separate templates.
///
/// # Example
///
/// ```
/// use tal_engine::dom::Element;
/// use tal_engine::{DirectiveOutcome, Engine, EngineError, LanguagePlugin};
/// use tal_tales::Scope;
///
/// /// `x:drop="..."` — unconditionally removes the element.
/// struct DropPlugin;
///
/// impl LanguagePlugin for DropPlugin {
///     fn namespace(&self) -> &str { "urn:example:drop" }
///
///     fn directives(&self) -> &[&str] { &["drop"] }
///
///     fn handle(
///         &self,
///         _directive: &str,
///         _engine: &Engine,
///         _element: &mut Element,
///         _value: &str,
///         _local: &mut Scope,
///         _global: &mut Scope,
///     ) -> Result<DirectiveOutcome, EngineError> {
///         Ok(DirectiveOutcome::Remove)
///     }
/// }
/// ```
pub trait LanguagePlugin: Send {
    /// The XML namespace URI whose attributes this plugin governs.
    fn namespace(&self) -> &str;

    /// Directive names in processing order.
    fn directives(&self) -> &[&str];

    /// Process one directive on `element`.
    ///
    /// The directive attribute has already been removed from the element
    /// when the handler runs, so handler-driven reprocessing of the node
    /// never sees it again.
    ///
    /// # Errors
    ///
    /// Expression evaluation failures abort the traversal and propagate to
    /// the `process` caller.
    fn handle(
        &self,
        directive: &str,
        engine: &Engine,
        element: &mut Element,
        value: &str,
        local: &mut Scope,
        global: &mut Scope,
    ) -> Result<DirectiveOutcome, EngineError>;
}
