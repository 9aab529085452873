//! Bundled TAL plugin.
//!
//! Implements the standard TAL directive set on top of the walker contract:
//! `define`, `condition`, `repeat`, `content`, `replace`, `attributes` and
//! `omit-tag`, processed in that order.

use std::collections::BTreeMap;

use tal_tales::{split, Scope, Value};

use crate::dom::{Element, Node};
use crate::plugin::{DirectiveOutcome, LanguagePlugin};
use crate::walker::Engine;
use crate::EngineError;

/// The conventional TAL namespace URI.
pub const TAL_NAMESPACE: &str = "http://xml.zope.org/namespaces/tal";

/// Directives in processing order.
const DIRECTIVES: &[&str] = &[
    "define",
    "condition",
    "repeat",
    "content",
    "replace",
    "attributes",
    "omit-tag",
];

/// The bundled TAL language plugin.
///
/// Directive values are TALES expressions evaluated against the local scope
/// first, then the global scope.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use tal_engine::{TalPlugin, Template};
///
/// let source = concat!(
///     r#"<ul xmlns:tal="http://xml.zope.org/namespaces/tal">"#,
///     r#"<li tal:repeat="name names" tal:content="name">stub</li>"#,
///     "</ul>",
/// );
/// let mut template = Template::parse(source).unwrap().with_plugin(TalPlugin::new());
/// template.process(&json!({"names": ["alice", "bob"]})).unwrap();
///
/// assert_eq!(
///     template.to_xml(),
///     concat!(
///         r#"<ul xmlns:tal="http://xml.zope.org/namespaces/tal">"#,
///         "<li>alice</li><li>bob</li>",
///         "</ul>",
///     ),
/// );
/// ```
pub struct TalPlugin {
    namespace: String,
}

impl Default for TalPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl TalPlugin {
    /// Create the plugin under the conventional TAL namespace.
    #[must_use]
    pub fn new() -> Self {
        Self::with_namespace(TAL_NAMESPACE)
    }

    /// Create the plugin under a custom namespace URI.
    #[must_use]
    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    /// `define="[local|global] name expr; ..."` — bind evaluated values in
    /// the chosen scope. Undefined expressions bind nothing.
    fn define(
        &self,
        engine: &Engine,
        value: &str,
        local: &mut Scope,
        global: &mut Scope,
    ) -> Result<DirectiveOutcome, EngineError> {
        for segment in split(value) {
            let (is_global, binding) = match segment.split_once(char::is_whitespace) {
                Some(("global", rest)) => (true, rest.trim_start()),
                Some(("local", rest)) => (false, rest.trim_start()),
                _ => (false, segment.as_str()),
            };
            let Some((name, expression)) = binding.split_once(char::is_whitespace) else {
                tracing::warn!(segment = %segment, "malformed define binding");
                continue;
            };

            let evaluated = evaluate(engine, expression.trim(), local, global)?;
            let Some(evaluated) = evaluated else { continue };
            if is_global {
                global.set(name, evaluated);
            } else {
                local.set(name, evaluated);
            }
        }
        Ok(DirectiveOutcome::Keep)
    }

    /// `condition="expr"` — remove the element unless the expression is
    /// defined and truthy.
    fn condition(
        &self,
        engine: &Engine,
        value: &str,
        local: &mut Scope,
        global: &mut Scope,
    ) -> Result<DirectiveOutcome, EngineError> {
        let evaluated = evaluate(engine, value, local, global)?;
        if evaluated.is_some_and(|v| v.is_truthy()) {
            Ok(DirectiveOutcome::Keep)
        } else {
            Ok(DirectiveOutcome::Remove)
        }
    }

    /// `repeat="name expr"` — expand the element once per sequence item,
    /// binding `name` (and `repeat/name` counters) in each clone's scope.
    /// Undefined or non-sequence expressions expand to nothing.
    fn repeat(
        &self,
        engine: &Engine,
        element: &Element,
        value: &str,
        local: &Scope,
        global: &mut Scope,
    ) -> Result<DirectiveOutcome, EngineError> {
        let Some((name, expression)) = value.trim().split_once(char::is_whitespace) else {
            tracing::warn!(value = %value, "malformed repeat directive");
            return Ok(DirectiveOutcome::Remove);
        };

        let evaluated = {
            let contexts = [local, &*global];
            engine.tales().value(expression.trim(), &contexts)?
        };
        let Some(Value::Sequence(items)) = evaluated else {
            return Ok(DirectiveOutcome::Remove);
        };

        let length = items.len();
        let mut expanded = Vec::new();
        for (index, item) in items.into_iter().enumerate() {
            let mut scope = local.clone();
            scope.set(name, item);
            bind_repeat_counters(&mut scope, name, index, length);

            // The repeat attribute is already gone, so the clone's other
            // directives process normally.
            let mut clone = Node::Element(element.clone());
            match engine.process_node(&mut clone, &scope, global)? {
                DirectiveOutcome::Keep => expanded.push(clone),
                DirectiveOutcome::Remove => {}
                DirectiveOutcome::Replace(nodes) => expanded.extend(nodes),
            }
        }
        Ok(DirectiveOutcome::Replace(expanded))
    }

    /// `content="expr"` — replace the element's children with the value's
    /// text. Undefined clears the content.
    fn content(
        &self,
        engine: &Engine,
        element: &mut Element,
        value: &str,
        local: &mut Scope,
        global: &mut Scope,
    ) -> Result<DirectiveOutcome, EngineError> {
        let evaluated = evaluate(engine, value, local, global)?;
        let text = evaluated.map(|v| v.to_string()).unwrap_or_default();
        element.children = if text.is_empty() {
            Vec::new()
        } else {
            vec![Node::Text(text)]
        };
        Ok(DirectiveOutcome::Keep)
    }

    /// `replace="expr"` — replace the whole element with the value's text.
    /// Undefined removes the element.
    fn replace(
        &self,
        engine: &Engine,
        value: &str,
        local: &mut Scope,
        global: &mut Scope,
    ) -> Result<DirectiveOutcome, EngineError> {
        match evaluate(engine, value, local, global)? {
            Some(evaluated) => Ok(DirectiveOutcome::Replace(vec![Node::Text(
                evaluated.to_string(),
            )])),
            None => Ok(DirectiveOutcome::Remove),
        }
    }

    /// `attributes="name expr; ..."` — set each attribute to its evaluated
    /// value; undefined removes the attribute.
    fn attributes(
        &self,
        engine: &Engine,
        element: &mut Element,
        value: &str,
        local: &mut Scope,
        global: &mut Scope,
    ) -> Result<DirectiveOutcome, EngineError> {
        for segment in split(value) {
            let Some((name, expression)) = segment.split_once(char::is_whitespace) else {
                tracing::warn!(segment = %segment, "malformed attributes binding");
                continue;
            };
            match evaluate(engine, expression.trim(), local, global)? {
                Some(evaluated) => element.set_attribute(name, evaluated.to_string()),
                None => {
                    element.remove_attribute_named(name);
                }
            }
        }
        Ok(DirectiveOutcome::Keep)
    }

    /// `omit-tag=""` or `omit-tag="expr"` — replace the element with its
    /// processed children when the expression is empty or truthy.
    fn omit_tag(
        &self,
        engine: &Engine,
        element: &mut Element,
        value: &str,
        local: &mut Scope,
        global: &mut Scope,
    ) -> Result<DirectiveOutcome, EngineError> {
        let omit = if value.trim().is_empty() {
            true
        } else {
            evaluate(engine, value, local, global)?.is_some_and(|v| v.is_truthy())
        };
        if !omit {
            return Ok(DirectiveOutcome::Keep);
        }

        let mut expanded = Vec::new();
        for mut child in std::mem::take(&mut element.children) {
            match engine.process_node(&mut child, local, global)? {
                DirectiveOutcome::Keep => expanded.push(child),
                DirectiveOutcome::Remove => {}
                DirectiveOutcome::Replace(nodes) => expanded.extend(nodes),
            }
        }
        Ok(DirectiveOutcome::Replace(expanded))
    }
}

impl LanguagePlugin for TalPlugin {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn directives(&self) -> &[&str] {
        DIRECTIVES
    }

    fn handle(
        &self,
        directive: &str,
        engine: &Engine,
        element: &mut Element,
        value: &str,
        local: &mut Scope,
        global: &mut Scope,
    ) -> Result<DirectiveOutcome, EngineError> {
        match directive {
            "define" => self.define(engine, value, local, global),
            "condition" => self.condition(engine, value, local, global),
            "repeat" => self.repeat(engine, element, value, local, global),
            "content" => self.content(engine, element, value, local, global),
            "replace" => self.replace(engine, value, local, global),
            "attributes" => self.attributes(engine, element, value, local, global),
            "omit-tag" => self.omit_tag(engine, element, value, local, global),
            _ => Ok(DirectiveOutcome::Keep),
        }
    }
}

/// Evaluate a directive value against the local scope first, then the
/// global scope.
fn evaluate(
    engine: &Engine,
    expression: &str,
    local: &mut Scope,
    global: &mut Scope,
) -> Result<Option<Value>, EngineError> {
    let contexts = [&*local, &*global];
    Ok(engine.tales().value(expression, &contexts)?)
}

/// Bind the `repeat/<name>` counter mapping for one iteration.
fn bind_repeat_counters(scope: &mut Scope, name: &str, index: usize, length: usize) {
    let index_i64 = i64::try_from(index).unwrap_or_default();
    let length_i64 = i64::try_from(length).unwrap_or_default();

    let mut counters = BTreeMap::new();
    counters.insert("index".to_owned(), Value::Int(index_i64));
    counters.insert("number".to_owned(), Value::Int(index_i64 + 1));
    counters.insert("even".to_owned(), Value::Bool(index % 2 == 0));
    counters.insert("odd".to_owned(), Value::Bool(index % 2 == 1));
    counters.insert("start".to_owned(), Value::Bool(index == 0));
    counters.insert("end".to_owned(), Value::Bool(index + 1 == length));
    counters.insert("length".to_owned(), Value::Int(length_i64));

    let mut outer = match scope.get("repeat") {
        Some(Value::Mapping(existing)) => existing.clone(),
        _ => BTreeMap::new(),
    };
    outer.insert(name.to_owned(), Value::Mapping(counters));
    scope.set("repeat", Value::Mapping(outer));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Template;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const PREFIX: &str = r#"<div xmlns:tal="http://xml.zope.org/namespaces/tal">"#;

    fn render(body: &str, data: serde_json::Value) -> String {
        let source = format!("{PREFIX}{body}</div>");
        let mut template = Template::parse(&source)
            .unwrap()
            .with_plugin(TalPlugin::new());
        template.process(&data).unwrap();
        template.to_xml()
    }

    fn body(rendered: &str) -> &str {
        // A container emptied of all children serializes self-closed.
        if rendered == r#"<div xmlns:tal="http://xml.zope.org/namespaces/tal" />"# {
            return "";
        }
        rendered
            .strip_prefix(PREFIX)
            .and_then(|rest| rest.strip_suffix("</div>"))
            .unwrap_or(rendered)
    }

    #[test]
    fn test_content_substitution() {
        let rendered = render(
            r#"<h1 tal:content="title">placeholder</h1>"#,
            json!({"title": "News"}),
        );
        assert_eq!(body(&rendered), "<h1>News</h1>");
    }

    #[test]
    fn test_content_escapes_markup() {
        let rendered = render(
            r#"<p tal:content="snippet">x</p>"#,
            json!({"snippet": "<b>&</b>"}),
        );
        assert_eq!(body(&rendered), "<p>&lt;b&gt;&amp;&lt;/b&gt;</p>");
    }

    #[test]
    fn test_content_undefined_clears() {
        let rendered = render(r#"<p tal:content="missing">stale</p>"#, json!({}));
        assert_eq!(body(&rendered), "<p />");
    }

    #[test]
    fn test_replace_substitutes_node() {
        let rendered = render(
            r#"<span tal:replace="name">x</span>!"#,
            json!({"name": "world"}),
        );
        assert_eq!(body(&rendered), "world!");
    }

    #[test]
    fn test_replace_undefined_removes_node() {
        let rendered = render(r#"a<span tal:replace="missing">x</span>b"#, json!({}));
        assert_eq!(body(&rendered), "ab");
    }

    #[test]
    fn test_condition_keeps_truthy() {
        let rendered = render(
            r#"<p tal:condition="show">visible</p>"#,
            json!({"show": true}),
        );
        assert_eq!(body(&rendered), "<p>visible</p>");
    }

    #[test]
    fn test_condition_removes_falsy_and_undefined() {
        let rendered = render(
            concat!(
                r#"<p tal:condition="off">hidden</p>"#,
                r#"<p tal:condition="missing">hidden</p>"#,
            ),
            json!({"off": 0}),
        );
        assert_eq!(body(&rendered), "");
    }

    #[test]
    fn test_condition_with_not() {
        let rendered = render(
            r#"<p tal:condition="not:off">shown</p>"#,
            json!({"off": 0}),
        );
        assert_eq!(body(&rendered), "<p>shown</p>");
    }

    #[test]
    fn test_repeat_expands_sequence() {
        let rendered = render(
            r#"<i tal:repeat="n nums" tal:content="n">x</i>"#,
            json!({"nums": [1, 2, 3]}),
        );
        assert_eq!(body(&rendered), "<i>1</i><i>2</i><i>3</i>");
    }

    #[test]
    fn test_repeat_counters() {
        let rendered = render(
            r#"<i tal:repeat="n nums" tal:content="repeat/n/number">x</i>"#,
            json!({"nums": ["a", "b"]}),
        );
        assert_eq!(body(&rendered), "<i>1</i><i>2</i>");
    }

    #[test]
    fn test_repeat_over_empty_sequence() {
        let rendered = render(
            r#"<i tal:repeat="n nums" tal:content="n">x</i>"#,
            json!({"nums": []}),
        );
        assert_eq!(body(&rendered), "");
    }

    #[test]
    fn test_repeat_over_undefined_removes_node() {
        let rendered = render(r#"<i tal:repeat="n missing">x</i>"#, json!({}));
        assert_eq!(body(&rendered), "");
    }

    #[test]
    fn test_repeat_binding_is_local_to_each_iteration() {
        let rendered = render(
            concat!(
                r#"<i tal:repeat="n nums" tal:content="n">x</i>"#,
                r#"<p tal:content="n | fallback">x</p>"#,
            ),
            json!({"nums": [1], "fallback": "clean"}),
        );
        assert_eq!(body(&rendered), "<i>1</i><p>clean</p>");
    }

    #[test]
    fn test_define_local_scoping() {
        // The binding is visible inside the section's subtree but not on
        // the following sibling, whose content degrades to undefined.
        let rendered = render(
            concat!(
                r#"<section tal:define="who user/name">"#,
                r#"<p tal:content="who">x</p>"#,
                "</section>",
                r#"<p tal:content="who">x</p>"#,
            ),
            json!({"user": {"name": "ada"}}),
        );
        assert_eq!(body(&rendered), "<section><p>ada</p></section><p />");
    }

    #[test]
    fn test_define_global_persists() {
        let rendered = render(
            concat!(
                r#"<section tal:define="global who user/name" />"#,
                r#"<p tal:content="who">x</p>"#,
            ),
            json!({"user": {"name": "ada"}}),
        );
        assert_eq!(body(&rendered), "<section /><p>ada</p>");
    }

    #[test]
    fn test_define_multiple_bindings() {
        let rendered = render(
            r#"<p tal:define="a one; b two" tal:content="string:$a-$b">x</p>"#,
            json!({"one": 1, "two": 2}),
        );
        assert_eq!(body(&rendered), "<p>1-2</p>");
    }

    #[test]
    fn test_attributes_set_and_remove() {
        let rendered = render(
            r#"<a href="stale" tal:attributes="href link; title missing">x</a>"#,
            json!({"link": "/here"}),
        );
        assert_eq!(body(&rendered), r#"<a href="/here">x</a>"#);
    }

    #[test]
    fn test_omit_tag_unconditional() {
        let rendered = render(
            r#"<span tal:omit-tag=""><b>kept</b></span>"#,
            json!({}),
        );
        assert_eq!(body(&rendered), "<b>kept</b>");
    }

    #[test]
    fn test_omit_tag_conditional() {
        let rendered = render(
            concat!(
                r#"<span tal:omit-tag="plain" tal:content="word">x</span>"#,
            ),
            json!({"plain": false, "word": "w"}),
        );
        assert_eq!(body(&rendered), "<span>w</span>");
    }

    #[test]
    fn test_omit_tag_processes_children() {
        let rendered = render(
            r#"<span tal:omit-tag=""><p tal:content="word">x</p></span>"#,
            json!({"word": "w"}),
        );
        assert_eq!(body(&rendered), "<p>w</p>");
    }

    #[test]
    fn test_define_then_content_on_same_element() {
        // define runs before content in the declared directive order.
        let rendered = render(
            r#"<p tal:define="who user" tal:content="who">x</p>"#,
            json!({"user": "ada"}),
        );
        assert_eq!(body(&rendered), "<p>ada</p>");
    }

    #[test]
    fn test_nested_repeat_counters_do_not_collide() {
        let rendered = render(
            concat!(
                r#"<o tal:repeat="x outer">"#,
                r#"<i tal:repeat="y inner" tal:content="string:${repeat/x/index}${repeat/y/index}">x</i>"#,
                "</o>",
            ),
            json!({"outer": ["a", "b"], "inner": ["c"]}),
        );
        assert_eq!(body(&rendered), "<o><i>00</i></o><o><i>10</i></o>");
    }

    #[test]
    fn test_unknown_expression_type_aborts_processing() {
        let source = format!(
            "{PREFIX}{}</div>",
            r#"<p tal:content="python:1 + 1">x</p>"#
        );
        let mut template = Template::parse(&source)
            .unwrap()
            .with_plugin(TalPlugin::new());
        let err = template.process(&json!({})).unwrap_err();
        assert!(matches!(err, EngineError::Expression(_)));
    }
}
