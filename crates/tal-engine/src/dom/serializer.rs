//! Serialize a document back to XML text.

use std::fmt::Write;

use super::node::{Document, Element, Node};

impl Document {
    /// Serialize the document to XML.
    ///
    /// The synthetic root wrapper is skipped; only the document's own nodes
    /// are written. Elements without children serialize self-closed.
    #[must_use]
    pub fn to_xml(&self) -> String {
        let mut out = String::with_capacity(1024);
        for node in &self.root.children {
            serialize_node(node, &mut out);
        }
        out
    }
}

/// Serialize a single node recursively.
fn serialize_node(node: &Node, out: &mut String) {
    match node {
        Node::Text(text) => out.push_str(&escape_text(text)),
        Node::Element(element) => serialize_element(element, out),
    }
}

fn serialize_element(element: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&element.name);

    for attr in &element.attributes {
        write!(out, r#" {}="{}""#, attr.name, escape_attr(&attr.value)).unwrap();
    }

    if element.children.is_empty() {
        out.push_str(" />");
    } else {
        out.push('>');
        for child in &element.children {
            serialize_node(child, out);
        }
        write!(out, "</{}>", element.name).unwrap();
    }
}

/// Escape text for XML content.
fn escape_text(text: &str) -> String {
    escape_xml(text, false)
}

/// Escape text for XML attribute values.
fn escape_attr(text: &str) -> String {
    escape_xml(text, true)
}

/// Escape XML special characters.
fn escape_xml(text: &str, escape_quotes: bool) -> String {
    let mut result = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' if escape_quotes => result.push_str("&quot;"),
            '\'' if escape_quotes => result.push_str("&apos;"),
            _ => result.push(ch),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_serialize_simple_element() {
        let document =
            Document::from_nodes(vec![Node::Element(Element::new("p").with_text("Hello"))]);
        assert_eq!(document.to_xml(), "<p>Hello</p>");
    }

    #[test]
    fn test_serialize_self_closing() {
        let p = Element::new("p")
            .with_text("Before")
            .with_child(Node::Element(Element::new("br")))
            .with_text("After");
        let document = Document::from_nodes(vec![Node::Element(p)]);

        assert_eq!(document.to_xml(), "<p>Before<br />After</p>");
    }

    #[test]
    fn test_serialize_escapes_special_chars() {
        let p = Element::new("p")
            .with_attribute("title", r#"a "b" & c"#)
            .with_text("1 < 2 & 3 > 2");
        let document = Document::from_nodes(vec![Node::Element(p)]);

        assert_eq!(
            document.to_xml(),
            r#"<p title="a &quot;b&quot; &amp; c">1 &lt; 2 &amp; 3 &gt; 2</p>"#
        );
    }

    #[test]
    fn test_round_trip_preserves_structure() {
        let source = r#"<ul id="x"><li>one</li><li>two &amp; three</li></ul>"#;
        let document = Document::parse(source).unwrap();
        assert_eq!(document.to_xml(), source);
    }
}
