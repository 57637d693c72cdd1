//! In-memory element tree and the parse adapter that builds it.

use indexmap::IndexMap;

use crate::error::XmlError;
use crate::namespace::local_name;

/// A node of a parsed document.
///
/// Tags of namespaced elements use the expanded `{uri}local` form until
/// [`normalize_namespaces`](crate::normalize_namespaces) rewrites them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// Element tag, either `{uri}local` or a bare local name.
    pub tag: String,
    /// Leading text content. `None` when the element has no text before its
    /// first child.
    pub text: Option<String>,
    /// Child elements in document order.
    pub children: Vec<Element>,
    /// Attributes in document order.
    pub attributes: IndexMap<String, String>,
}

impl Element {
    /// Creates an element with the given tag and nothing else.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Sets the element's text.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Appends a child.
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Appends several children.
    pub fn with_children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children.extend(children);
        self
    }

    /// Sets an attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Returns `true` if the element has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Returns the child at `index`.
    pub fn child(&self, index: usize) -> Option<&Element> {
        self.children.get(index)
    }

    /// Returns the value of attribute `name`.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Iterates over this element and all its descendants in document order.
    pub fn iter(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// Iterates over this element and its descendants whose tag equals `tag`.
    pub fn find_all<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.iter().filter(move |e| e.tag == tag)
    }

    /// Concatenated text of this element and all its descendants.
    pub fn text_content(&self) -> String {
        self.iter().filter_map(|e| e.text.as_deref()).collect()
    }
}

/// Pre-order iterator over an element and its descendants.
pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        self.stack.extend(next.children.iter().rev());
        Some(next)
    }
}

/// Parses document text into an [`Element`] tree rooted at the document element.
///
/// Namespaced names are rendered as `{uri}local`. Comments and processing
/// instructions are dropped.
pub fn parse_document(xml: &str) -> Result<Element, XmlError> {
    let doc = roxmltree::Document::parse(xml).map_err(|e| XmlError::Parse {
        reason: e.to_string(),
    })?;
    let root = convert(doc.root_element());
    tracing::trace!(
        target = "esma.xml",
        root = local_name(&root.tag),
        children = root.children.len(),
        "parsed document"
    );
    Ok(root)
}

fn convert(node: roxmltree::Node<'_, '_>) -> Element {
    let tag = expanded_name(node.tag_name().namespace(), node.tag_name().name());
    let attributes = node
        .attributes()
        .map(|a| (expanded_name(a.namespace(), a.name()), a.value().to_string()))
        .collect();
    let children = node
        .children()
        .filter(|n| n.is_element())
        .map(convert)
        .collect();
    Element {
        tag,
        text: node.text().map(str::to_string),
        children,
        attributes,
    }
}

fn expanded_name(namespace: Option<&str>, name: &str) -> String {
    match namespace {
        Some(ns) => format!("{{{ns}}}{name}"),
        None => name.to_string(),
    }
}
