//! Depth-first node walker.
//!
//! Drives the registered [`LanguagePlugin`]s over a document, managing
//! directive dispatch order, structural edits and scope propagation.

use tal_tales::{Evaluator, Scope};

use crate::dom::{Document, Element, Node};
use crate::plugin::{DirectiveOutcome, LanguagePlugin};
use crate::EngineError;

/// Walks a document tree, dispatching namespace-qualified directive
/// attributes to plugins.
///
/// The walk is single-threaded, synchronous and depth-first; one `process`
/// call runs to completion before returning, and the tree is exclusively
/// owned by that invocation.
pub struct Engine {
    tales: Evaluator,
    plugins: Vec<Box<dyn LanguagePlugin>>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Create an engine with no plugins and the default expression types.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tales: Evaluator::new(),
            plugins: Vec::new(),
        }
    }

    /// Register a plugin. Registration order determines precedence across
    /// plugins.
    #[must_use]
    pub fn with_plugin(mut self, plugin: impl LanguagePlugin + 'static) -> Self {
        self.plugins.push(Box::new(plugin));
        self
    }

    /// Replace the ordered plugin list.
    pub fn set_plugins(&mut self, plugins: Vec<Box<dyn LanguagePlugin>>) {
        self.plugins = plugins;
    }

    /// The expression evaluator handlers should use for directive values.
    #[must_use]
    pub fn tales(&self) -> &Evaluator {
        &self.tales
    }

    /// Mutable access to the evaluator, for registering expression types.
    pub fn tales_mut(&mut self) -> &mut Evaluator {
        &mut self.tales
    }

    /// Process a whole document in place.
    ///
    /// `local` seeds the root local scope (cloned per element on descent);
    /// `global` is the single shared scope for the entire invocation.
    ///
    /// # Errors
    ///
    /// Propagates expression evaluation failures from directive handlers.
    pub fn process(
        &self,
        document: &mut Document,
        local: &Scope,
        global: &mut Scope,
    ) -> Result<(), EngineError> {
        self.process_children(&mut document.root, local, global)
    }

    /// Process a single node, returning how its parent should treat it.
    ///
    /// This is the per-node algorithm: non-elements are skipped; otherwise
    /// each plugin with namespace-matching attributes runs its declared
    /// directives in order (the attribute is removed before its handler is
    /// invoked); a `Remove` or `Replace` outcome stops all further
    /// processing of the node; if the node survives, its children are
    /// processed with a fresh copy of the local scope.
    ///
    /// Plugin handlers that expand subtrees themselves (repetition,
    /// tag omission) call back into this method.
    ///
    /// # Errors
    ///
    /// Propagates expression evaluation failures from directive handlers.
    pub fn process_node(
        &self,
        node: &mut Node,
        local: &Scope,
        global: &mut Scope,
    ) -> Result<DirectiveOutcome, EngineError> {
        let Node::Element(element) = node else {
            return Ok(DirectiveOutcome::Keep);
        };

        // Local bindings never leak upward or across siblings.
        let mut local = local.clone();

        // Snapshot namespace-matching attributes per plugin before any
        // handler runs; the unhandled-attribute warning reports against
        // this snapshot.
        let snapshots: Vec<Vec<String>> = self
            .plugins
            .iter()
            .map(|plugin| element.attribute_locals_in(plugin.namespace()))
            .collect();

        for (plugin, snapshot) in self.plugins.iter().zip(snapshots) {
            if snapshot.is_empty() {
                continue;
            }

            for directive in plugin.directives() {
                let Some(value) = element.remove_attribute(Some(plugin.namespace()), directive)
                else {
                    continue;
                };
                match plugin.handle(directive, self, element, &value, &mut local, global)? {
                    DirectiveOutcome::Keep => {}
                    outcome => return Ok(outcome),
                }
            }

            let declared = plugin.directives();
            let unhandled: Vec<String> = snapshot
                .into_iter()
                .filter(|name| !declared.contains(&name.as_str()))
                .collect();
            if !unhandled.is_empty() {
                tracing::warn!(
                    element = %element.name,
                    namespace = %plugin.namespace(),
                    line = element.line,
                    attributes = ?unhandled,
                    "unhandled template attributes"
                );
            }
        }

        self.process_children(element, &local, global)?;
        Ok(DirectiveOutcome::Keep)
    }

    /// Process an element's children, splicing removals and replacements
    /// into the child list. Replacement nodes are not revisited.
    fn process_children(
        &self,
        parent: &mut Element,
        local: &Scope,
        global: &mut Scope,
    ) -> Result<(), EngineError> {
        let mut index = 0;
        while index < parent.children.len() {
            match self.process_node(&mut parent.children[index], local, global)? {
                DirectiveOutcome::Keep => index += 1,
                DirectiveOutcome::Remove => {
                    parent.remove_child(index);
                }
                DirectiveOutcome::Replace(replacements) => {
                    let advance = replacements.len();
                    parent.replace_child(index, replacements);
                    index += advance;
                }
            }
        }
        Ok(())
    }
}
