//! Template façade.
//!
//! Composes a parsed document with an ordered plugin list and the walker.
//! `process` is the single entry point external collaborators (providers,
//! output renderers) see: the tree is mutated in place and handed back via
//! [`Template::to_xml`] or [`Template::document`].

use tal_tales::{Evaluator, Scope};

use crate::dom::Document;
use crate::plugin::LanguagePlugin;
use crate::walker::Engine;
use crate::EngineError;

/// A parsed template plus the plugins that will process it.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use tal_engine::{TalPlugin, Template};
///
/// let source = concat!(
///     r#"<p xmlns:tal="http://xml.zope.org/namespaces/tal" "#,
///     r#"tal:content="string:hello $name">stub</p>"#,
/// );
/// let mut template = Template::parse(source).unwrap().with_plugin(TalPlugin::new());
/// template.process(&json!({"name": "world"})).unwrap();
///
/// assert_eq!(
///     template.to_xml(),
///     r#"<p xmlns:tal="http://xml.zope.org/namespaces/tal">hello world</p>"#,
/// );
/// ```
pub struct Template {
    document: Document,
    engine: Engine,
}

impl Template {
    /// Parse a template source. No plugins are attached yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the source is not well-formed XML.
    pub fn parse(source: &str) -> Result<Self, EngineError> {
        Ok(Self {
            document: Document::parse(source)?,
            engine: Engine::new(),
        })
    }

    /// Attach a plugin. Attachment order determines directive precedence
    /// across plugins.
    #[must_use]
    pub fn with_plugin(mut self, plugin: impl LanguagePlugin + 'static) -> Self {
        self.engine = self.engine.with_plugin(plugin);
        self
    }

    /// Replace the ordered plugin list.
    pub fn set_plugins(&mut self, plugins: Vec<Box<dyn LanguagePlugin>>) {
        self.engine.set_plugins(plugins);
    }

    /// Mutable access to the expression evaluator, for registering custom
    /// expression types.
    pub fn tales_mut(&mut self) -> &mut Evaluator {
        self.engine.tales_mut()
    }

    /// Process the template against `data`, mutating the tree in place.
    ///
    /// The global scope is created fresh from `data` for this invocation and
    /// discarded when it returns; the root local scope starts empty.
    ///
    /// # Errors
    ///
    /// Propagates expression evaluation failures from directives.
    pub fn process(&mut self, data: &serde_json::Value) -> Result<(), EngineError> {
        let local = Scope::new();
        let mut global = Scope::from_json(data);
        self.engine.process(&mut self.document, &local, &mut global)
    }

    /// The processed (or not yet processed) document.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Serialize the document to XML.
    #[must_use]
    pub fn to_xml(&self) -> String {
        self.document.to_xml()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TalPlugin;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_process_without_plugins_is_identity() {
        let source = r#"<p class="x">body</p>"#;
        let mut template = Template::parse(source).unwrap();
        template.process(&json!({"unused": 1})).unwrap();
        assert_eq!(template.to_xml(), source);
    }

    #[test]
    fn test_process_with_non_object_data() {
        let source = r#"<p xmlns:tal="http://xml.zope.org/namespaces/tal" tal:content="x">y</p>"#;
        let mut template = Template::parse(source).unwrap().with_plugin(TalPlugin::new());
        template.process(&json!(42)).unwrap();
        assert_eq!(
            template.to_xml(),
            r#"<p xmlns:tal="http://xml.zope.org/namespaces/tal" />"#
        );
    }

    #[test]
    fn test_custom_expression_type_through_template() {
        use tal_tales::{ExpressionType, Scope, TalesError, Value};

        struct ShoutType;
        impl ExpressionType for ShoutType {
            fn name(&self) -> &str {
                "shout"
            }

            fn evaluate(
                &self,
                tales: &Evaluator,
                body: &str,
                contexts: &[&Scope],
            ) -> Result<Option<Value>, TalesError> {
                Ok(tales
                    .value(body, contexts)?
                    .map(|value| value.to_string().to_uppercase().into()))
            }
        }

        let source = concat!(
            r#"<p xmlns:tal="http://xml.zope.org/namespaces/tal" "#,
            r#"tal:content="shout:word">x</p>"#,
        );
        let mut template = Template::parse(source).unwrap().with_plugin(TalPlugin::new());
        template.tales_mut().register(ShoutType);
        template.process(&json!({"word": "quiet"})).unwrap();

        assert_eq!(
            template.to_xml(),
            r#"<p xmlns:tal="http://xml.zope.org/namespaces/tal">QUIET</p>"#
        );
    }
}
