//! Namespace-aware template parsing with quick-xml.

use quick_xml::NsReader;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;

use super::node::{Attribute, Document, Element, Node};
use crate::EngineError;

impl Document {
    /// Parse a template source into a document.
    ///
    /// The source may be a complete XML document or a fragment with several
    /// top-level nodes. Namespace prefixes on attributes are resolved to
    /// URIs; undeclared prefixes resolve to no namespace. Comments,
    /// processing instructions and doctype declarations are dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the source is not well formed.
    pub fn parse(source: &str) -> Result<Self, EngineError> {
        let mut reader = NsReader::from_str(source);
        // The synthetic wrapper sits at the bottom of the stack; top-level
        // nodes become its children.
        let mut stack = vec![Element::new("")];

        loop {
            match reader.read_resolved_event()? {
                (_, Event::Start(start)) => {
                    let element = read_element(&reader, &start, source);
                    stack.push(element);
                }
                (_, Event::Empty(start)) => {
                    let element = read_element(&reader, &start, source);
                    append_child(&mut stack, Node::Element(element));
                }
                (_, Event::End(_)) => {
                    if stack.len() < 2 {
                        return Err(EngineError::UnbalancedTags);
                    }
                    let element = stack.pop().expect("stack holds the open element");
                    append_child(&mut stack, Node::Element(element));
                }
                (_, Event::Text(text)) => {
                    append_text(&mut stack, &String::from_utf8_lossy(&text));
                }
                (_, Event::CData(data)) => {
                    append_text(&mut stack, &String::from_utf8_lossy(&data));
                }
                (_, Event::GeneralRef(entity)) => {
                    let entity = String::from_utf8_lossy(&entity).into_owned();
                    append_text(&mut stack, &decode_entity(&entity));
                }
                (_, Event::Eof) => break,
                (_, Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_)) => {}
            }
        }

        if stack.len() != 1 {
            return Err(EngineError::UnbalancedTags);
        }
        let root = stack.pop().expect("stack holds the wrapper");
        Ok(Self { root })
    }
}

/// Build an element from a start tag, resolving attribute namespaces.
fn read_element(reader: &NsReader<&[u8]>, start: &BytesStart<'_>, source: &str) -> Element {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attributes = Vec::new();

    for attr in start.attributes().flatten() {
        let attr_name = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_or_else(
            |_| String::from_utf8_lossy(&attr.value).into_owned(),
            std::borrow::Cow::into_owned,
        );

        let (resolve, local) = reader.resolve_attribute(attr.key);
        let namespace = match resolve {
            ResolveResult::Bound(ns) => Some(String::from_utf8_lossy(ns.as_ref()).into_owned()),
            ResolveResult::Unbound | ResolveResult::Unknown(_) => None,
        };
        let local = String::from_utf8_lossy(local.as_ref()).into_owned();

        attributes.push(Attribute {
            namespace,
            name: attr_name,
            local,
            value,
        });
    }

    Element {
        name,
        attributes,
        children: Vec::new(),
        line: line_at(source, reader.buffer_position()),
    }
}

/// Append a node to the element currently open on the stack.
fn append_child(stack: &mut [Element], node: Node) {
    let parent = stack.last_mut().expect("wrapper never leaves the stack");
    parent.children.push(node);
}

/// Append character data, merging with a trailing text node.
fn append_text(stack: &mut [Element], text: &str) {
    let parent = stack.last_mut().expect("wrapper never leaves the stack");
    if let Some(Node::Text(existing)) = parent.children.last_mut() {
        existing.push_str(text);
    } else {
        parent.children.push(Node::Text(text.to_owned()));
    }
}

/// 1-indexed line for a byte offset into the source.
fn line_at(source: &str, position: u64) -> usize {
    let end = usize::try_from(position).map_or(source.len(), |p| p.min(source.len()));
    source[..end].bytes().filter(|&b| b == b'\n').count() + 1
}

/// Decode XML entity references to their character values.
fn decode_entity(entity: &str) -> String {
    match entity {
        "lt" => "<".to_owned(),
        "gt" => ">".to_owned(),
        "amp" => "&".to_owned(),
        "apos" => "'".to_owned(),
        "quot" => "\"".to_owned(),
        // Numeric character references
        s if s.starts_with('#') => {
            let code = if s.starts_with("#x") || s.starts_with("#X") {
                u32::from_str_radix(&s[2..], 16).ok()
            } else {
                s[1..].parse::<u32>().ok()
            };
            code.and_then(char::from_u32)
                .map_or_else(|| format!("&{entity};"), |c| c.to_string())
        }
        // Unknown entity - preserve as-is
        _ => format!("&{entity};"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_simple_element() {
        let document = Document::parse("<p>Hello</p>").unwrap();

        assert_eq!(document.nodes().len(), 1);
        let p = document.nodes()[0].as_element().unwrap();
        assert_eq!(p.name, "p");
        assert_eq!(p.children, vec![Node::text("Hello")]);
    }

    #[test]
    fn test_parse_nested_elements() {
        let document = Document::parse("<p><strong>Bold</strong> text</p>").unwrap();

        let p = document.nodes()[0].as_element().unwrap();
        assert_eq!(p.children.len(), 2);
        let strong = p.children[0].as_element().unwrap();
        assert_eq!(strong.name, "strong");
        assert_eq!(p.children[1], Node::text(" text"));
    }

    #[test]
    fn test_parse_self_closing_element() {
        let document = Document::parse("<p>a<br/>b</p>").unwrap();

        let p = document.nodes()[0].as_element().unwrap();
        assert_eq!(p.children.len(), 3);
        assert_eq!(p.children[1].as_element().unwrap().name, "br");
    }

    #[test]
    fn test_parse_resolves_attribute_namespaces() {
        let source = r#"<div xmlns:x="urn:example" x:content="title" id="main"/>"#;
        let document = Document::parse(source).unwrap();

        let div = document.nodes()[0].as_element().unwrap();
        assert_eq!(div.attribute(Some("urn:example"), "content"), Some("title"));
        assert_eq!(div.attribute(None, "id"), Some("main"));
    }

    #[test]
    fn test_parse_undeclared_prefix_has_no_namespace() {
        let document = Document::parse(r#"<div y:thing="1"/>"#).unwrap();

        let div = document.nodes()[0].as_element().unwrap();
        assert_eq!(div.attribute(Some("urn:missing"), "thing"), None);
        assert_eq!(div.attributes[0].namespace, None);
        assert_eq!(div.attributes[0].local, "thing");
    }

    #[test]
    fn test_parse_entities_and_character_references() {
        let document = Document::parse("<p>a &lt; b &amp; c &#65;</p>").unwrap();

        let p = document.nodes()[0].as_element().unwrap();
        assert_eq!(p.text_content(), "a < b & c A");
    }

    #[test]
    fn test_parse_fragment_with_multiple_roots() {
        let document = Document::parse("<a/><b/>").unwrap();
        assert_eq!(document.nodes().len(), 2);
    }

    #[test]
    fn test_parse_records_source_lines() {
        let document = Document::parse("<a>\n  <b/>\n</a>").unwrap();

        let a = document.nodes()[0].as_element().unwrap();
        let b = a.children[1].as_element().unwrap();
        assert_eq!(a.line, 1);
        assert_eq!(b.line, 2);
    }

    #[test]
    fn test_parse_malformed_source_is_an_error() {
        assert!(Document::parse("<a><b></a>").is_err());
    }
}
