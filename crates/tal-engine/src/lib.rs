//! Namespace-attribute template engine.
//!
//! Renders XML documents whose elements carry namespace-qualified directive
//! attributes (TAL-style) by mutating the parsed tree in place. The engine
//! is split along two seams:
//!
//! - [`dom`] — the mutable XML document model (parse, edit, serialize)
//! - [`Engine`] — the node walker that drives [`LanguagePlugin`]s over the
//!   tree, managing directive order, structural edits and scope propagation
//!
//! Directive values are TALES expressions, evaluated by
//! [`tal_tales::Evaluator`]. The bundled [`TalPlugin`] implements the
//! standard TAL directive set; further languages attach as additional
//! plugins.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use tal_engine::{TalPlugin, Template};
//!
//! let source = concat!(
//!     r#"<items xmlns:tal="http://xml.zope.org/namespaces/tal">"#,
//!     r#"<item tal:repeat="it list" tal:content="it/label" />"#,
//!     "</items>",
//! );
//!
//! let mut template = Template::parse(source).unwrap().with_plugin(TalPlugin::new());
//! template.process(&json!({"list": [{"label": "a"}, {"label": "b"}]})).unwrap();
//!
//! assert_eq!(
//!     template.to_xml(),
//!     concat!(
//!         r#"<items xmlns:tal="http://xml.zope.org/namespaces/tal">"#,
//!         "<item>a</item><item>b</item>",
//!         "</items>",
//!     ),
//! );
//! ```

pub mod dom;
mod error;
mod plugin;
mod tal;
mod template;
mod walker;

pub use error::EngineError;
pub use plugin::{DirectiveOutcome, LanguagePlugin};
pub use tal::{TalPlugin, TAL_NAMESPACE};
pub use template::Template;
pub use walker::Engine;
