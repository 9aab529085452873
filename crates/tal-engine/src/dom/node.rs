//! Owned XML tree.
//!
//! The tree is ElementTree-shaped: an element owns its attributes and an
//! ordered list of child nodes; text is carried as child nodes of its own.
//! A parsed [`Document`] keeps its content under a synthetic root element so
//! that structural edits at the top level work exactly like edits anywhere
//! else; the serializer skips the wrapper.

/// One node in the tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    /// An element with attributes and children.
    Element(Element),
    /// A run of character data.
    Text(String),
}

impl Node {
    /// Create a text node.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text(content.into())
    }

    /// Whether this node is an element.
    #[must_use]
    pub fn is_element(&self) -> bool {
        matches!(self, Self::Element(_))
    }

    /// Borrow the element, if this node is one.
    #[must_use]
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(element) => Some(element),
            Self::Text(_) => None,
        }
    }

    /// Mutably borrow the element, if this node is one.
    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Self::Element(element) => Some(element),
            Self::Text(_) => None,
        }
    }
}

/// A namespace-qualified attribute.
///
/// `name` is the attribute as written in the source (prefix included, used
/// for serialization); `local` and `namespace` carry the resolved
/// namespace-qualified identity used for directive matching.
#[derive(Clone, Debug, PartialEq)]
pub struct Attribute {
    /// Resolved namespace URI, `None` for unprefixed attributes.
    pub namespace: Option<String>,
    /// Attribute name as written, e.g. `tal:content`.
    pub name: String,
    /// Local part of the name, e.g. `content`.
    pub local: String,
    /// Attribute value.
    pub value: String,
}

/// An element node.
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    /// Tag name as written in the source (prefix included).
    pub name: String,
    /// Attributes in source order.
    pub attributes: Vec<Attribute>,
    /// Child nodes in document order.
    pub children: Vec<Node>,
    /// 1-indexed source line, 0 for synthetic elements.
    pub line: usize,
}

impl Element {
    /// Create an element with no attributes or children.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            line: 0,
        }
    }

    /// Add an unprefixed attribute (builder form).
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.attributes.push(Attribute {
            namespace: None,
            local: name.clone(),
            name,
            value: value.into(),
        });
        self
    }

    /// Add a namespace-qualified attribute (builder form). `name` is the
    /// prefixed form used for serialization.
    #[must_use]
    pub fn with_ns_attribute(
        mut self,
        namespace: impl Into<String>,
        name: impl Into<String>,
        local: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.attributes.push(Attribute {
            namespace: Some(namespace.into()),
            name: name.into(),
            local: local.into(),
            value: value.into(),
        });
        self
    }

    /// Append a child node (builder form).
    #[must_use]
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Append a text child (builder form).
    #[must_use]
    pub fn with_text(self, content: impl Into<String>) -> Self {
        self.with_child(Node::text(content))
    }

    /// Look up an attribute value by namespace URI and local name.
    #[must_use]
    pub fn attribute(&self, namespace: Option<&str>, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.namespace.as_deref() == namespace && attr.local == local)
            .map(|attr| attr.value.as_str())
    }

    /// Remove an attribute by namespace URI and local name, returning its
    /// value.
    pub fn remove_attribute(&mut self, namespace: Option<&str>, local: &str) -> Option<String> {
        let index = self
            .attributes
            .iter()
            .position(|attr| attr.namespace.as_deref() == namespace && attr.local == local)?;
        Some(self.attributes.remove(index).value)
    }

    /// Set an attribute by its as-written name, replacing an existing value
    /// or appending a new unprefixed attribute.
    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(attr) = self.attributes.iter_mut().find(|attr| attr.name == name) {
            attr.value = value;
        } else {
            self.attributes.push(Attribute {
                namespace: None,
                name: name.to_owned(),
                local: name.to_owned(),
                value,
            });
        }
    }

    /// Remove an attribute by its as-written name, returning its value.
    pub fn remove_attribute_named(&mut self, name: &str) -> Option<String> {
        let index = self.attributes.iter().position(|attr| attr.name == name)?;
        Some(self.attributes.remove(index).value)
    }

    /// Local names of all attributes resolved into `namespace`, in source
    /// order.
    #[must_use]
    pub fn attribute_locals_in(&self, namespace: &str) -> Vec<String> {
        self.attributes
            .iter()
            .filter(|attr| attr.namespace.as_deref() == Some(namespace))
            .map(|attr| attr.local.clone())
            .collect()
    }

    /// Detach the child at `index`.
    pub fn remove_child(&mut self, index: usize) -> Node {
        self.children.remove(index)
    }

    /// Replace the child at `index` with a sequence of nodes. The first
    /// replacement takes the child's position; the rest follow it.
    pub fn replace_child(&mut self, index: usize, replacements: Vec<Node>) {
        self.children.splice(index..=index, replacements);
    }

    /// Concatenated character data of all descendant text nodes.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }
}

fn collect_text(children: &[Node], out: &mut String) {
    for child in children {
        match child {
            Node::Text(text) => out.push_str(text),
            Node::Element(element) => collect_text(&element.children, out),
        }
    }
}

/// A parsed template document.
///
/// Content lives under a synthetic root element, so a document may hold
/// zero, one or several top-level nodes after processing.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub(crate) root: Element,
}

impl Document {
    /// The top-level nodes of the document.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.root.children
    }

    /// Mutable access to the top-level nodes.
    pub fn nodes_mut(&mut self) -> &mut Vec<Node> {
        &mut self.root.children
    }

    /// Build a document from a list of top-level nodes.
    #[must_use]
    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        let mut root = Element::new("");
        root.children = nodes;
        Self { root }
    }
}
