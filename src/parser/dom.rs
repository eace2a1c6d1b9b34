//! Read-only document tree used by the content extractor
//!
//! The tree is built once from `scraper`'s html5ever output and never mutated
//! afterwards. Every walk in this module is iterative, and so are dropping
//! and comparing elements, so deeply nested markup from scraped pages cannot
//! exhaust the stack.

use scraper::node::Node;
use scraper::Html;
use std::collections::BTreeMap;
use std::fmt;

/// Attribute map of an element, keyed by lowercase attribute name
pub type Attributes = BTreeMap<String, String>;

/// Elements serialized without a closing tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// A node of the parsed document
#[derive(Debug, PartialEq, Eq)]
pub enum DocumentNode {
    Element(Element),
    Text(String),
}

/// An element node: tag name, attributes and ordered children
pub struct Element {
    tag_name: String,
    attributes: Attributes,
    children: Vec<DocumentNode>,
}

impl Element {
    /// Create an empty element. The tag name is stored lowercase.
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into().to_ascii_lowercase(),
            attributes: Attributes::new(),
            children: Vec::new(),
        }
    }

    /// Builder: add an attribute
    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    /// Builder: append a child node
    #[must_use]
    pub fn with_child(mut self, child: impl Into<DocumentNode>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Builder: append a text child
    #[must_use]
    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_child(DocumentNode::Text(text.into()))
    }

    fn from_scraper(element: &scraper::node::Element) -> Self {
        let mut result = Self::new(element.name());
        for (name, value) in element.attrs() {
            result
                .attributes
                .insert(name.to_ascii_lowercase(), value.to_string());
        }
        result
    }

    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }

    /// Case-insensitive tag comparison
    pub fn is(&self, tag: &str) -> bool {
        self.tag_name.eq_ignore_ascii_case(tag)
    }

    /// Look up an attribute by (case-insensitive) name
    pub fn attr(&self, name: &str) -> Option<&str> {
        match self.attributes.get(name) {
            Some(value) => Some(value.as_str()),
            None => self
                .attributes
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.as_str()),
        }
    }

    /// Attribute value, treating empty and whitespace-only values as absent
    pub fn non_empty_attr(&self, name: &str) -> Option<&str> {
        self.attr(name).filter(|value| !value.trim().is_empty())
    }

    /// Whether the `class` attribute contains `needle` as a substring
    pub fn class_contains(&self, needle: &str) -> bool {
        self.attr("class")
            .is_some_and(|class| class.contains(needle))
    }

    pub fn children(&self) -> &[DocumentNode] {
        &self.children
    }

    /// Direct element children, in document order
    pub fn element_children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(DocumentNode::as_element)
    }

    /// Pre-order walk over all descendants (excluding `self`)
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants::of(&self.children)
    }

    /// First element named `tag` in pre-order, starting with `self`
    pub fn find_first(&self, tag: &str) -> Option<&Element> {
        if self.is(tag) {
            return Some(self);
        }
        self.descendants()
            .filter_map(DocumentNode::as_element)
            .find(|element| element.is(tag))
    }

    /// Every element named `tag` in pre-order, starting with `self`
    pub fn find_all(&self, tag: &str) -> Vec<&Element> {
        let mut found: Vec<&Element> = Vec::new();
        if self.is(tag) {
            found.push(self);
        }
        found.extend(
            self.descendants()
                .filter_map(DocumentNode::as_element)
                .filter(|element| element.is(tag)),
        );
        found
    }

    /// First element (pre-order, starting with `self`) accepted by `predicate`
    pub fn locate<P>(&self, mut predicate: P) -> Option<&Element>
    where
        P: FnMut(&Element) -> bool,
    {
        if predicate(self) {
            return Some(self);
        }
        self.descendants()
            .filter_map(DocumentNode::as_element)
            .find(|element| predicate(element))
    }

    /// Concatenation of all descendant text, untrimmed
    pub fn text(&self) -> String {
        self.descendants()
            .filter_map(DocumentNode::as_text)
            .collect()
    }

    /// Markup of the children of this element
    pub fn inner_markup(&self) -> String {
        let mut out = String::new();
        write_markup(&self.children, &mut out);
        out
    }
}

impl Drop for Element {
    /// Frees the subtree through an explicit stack instead of recursive drop glue
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(node) = pending.pop() {
            if let DocumentNode::Element(mut element) = node {
                pending.append(&mut element.children);
            }
        }
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(self, other)];

        while let Some((left, right)) = pending.pop() {
            if left.tag_name != right.tag_name
                || left.attributes != right.attributes
                || left.children.len() != right.children.len()
            {
                return false;
            }

            for pair in left.children.iter().zip(&right.children) {
                match pair {
                    (DocumentNode::Text(a), DocumentNode::Text(b)) if a == b => {}
                    (DocumentNode::Element(a), DocumentNode::Element(b)) => pending.push((a, b)),
                    _ => return false,
                }
            }
        }

        true
    }
}

impl Eq for Element {}

/// Shallow: children are summarized by count
impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("tag_name", &self.tag_name)
            .field("attributes", &self.attributes)
            .field("children", &self.children.len())
            .finish()
    }
}

impl From<Element> for DocumentNode {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

impl DocumentNode {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(element) => Some(element),
            Self::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Element(_) => None,
        }
    }

    /// Children of an element; text nodes have none
    pub fn children(&self) -> &[DocumentNode] {
        match self {
            Self::Element(element) => element.children(),
            Self::Text(_) => &[],
        }
    }

    /// Pre-order walk over this node and all its descendants
    pub fn walk(&self) -> Descendants<'_> {
        Descendants::of(std::slice::from_ref(self))
    }

    /// First element (pre-order, starting with `self`) accepted by `predicate`
    pub fn locate<P>(&self, mut predicate: P) -> Option<&Element>
    where
        P: FnMut(&Element) -> bool,
    {
        self.walk()
            .filter_map(DocumentNode::as_element)
            .find(|element| predicate(element))
    }
}

/// Pre-order iterator over a forest of nodes
///
/// Each node is yielded exactly once, parents before children, siblings in
/// document order.
pub struct Descendants<'a> {
    stack: Vec<&'a DocumentNode>,
}

impl<'a> Descendants<'a> {
    fn of(nodes: &'a [DocumentNode]) -> Self {
        Self {
            stack: nodes.iter().rev().collect(),
        }
    }
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a DocumentNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().iter().rev());
        Some(node)
    }
}

enum MarkupStep<'a> {
    Open(&'a DocumentNode),
    Close(&'a str),
}

/// Serialize nodes back to markup. Text is escaped so a literal `<` in the
/// article never reads as a tag downstream.
fn write_markup(nodes: &[DocumentNode], out: &mut String) {
    let mut steps: Vec<MarkupStep<'_>> = nodes.iter().rev().map(MarkupStep::Open).collect();

    while let Some(step) = steps.pop() {
        match step {
            MarkupStep::Open(DocumentNode::Text(text)) => {
                out.push_str(&html_escape::encode_text(text));
            }
            MarkupStep::Open(DocumentNode::Element(element)) => {
                out.push('<');
                out.push_str(&element.tag_name);
                for (name, value) in &element.attributes {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&html_escape::encode_double_quoted_attribute(value));
                    out.push('"');
                }
                out.push('>');

                if VOID_ELEMENTS.contains(&element.tag_name.as_str()) {
                    continue;
                }
                steps.push(MarkupStep::Close(&element.tag_name));
                steps.extend(element.children.iter().rev().map(MarkupStep::Open));
            }
            MarkupStep::Close(tag) => {
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }
}

struct PendingElement<I> {
    element: Element,
    remaining: I,
}

/// Parse raw markup into a [`DocumentNode`] tree rooted at `<html>`
///
/// html5ever is error tolerant: any input, including an empty string or
/// non-HTML garbage, yields a tree. Comments, doctypes and processing
/// instructions are dropped.
pub fn parse_document(html: &str) -> DocumentNode {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let mut stack = vec![PendingElement {
        element: Element::from_scraper(root.value()),
        remaining: root.children(),
    }];

    loop {
        let next = match stack.last_mut() {
            Some(top) => top.remaining.next(),
            None => break,
        };

        match next {
            Some(child) => match child.value() {
                Node::Text(text) => {
                    if let Some(top) = stack.last_mut() {
                        top.element
                            .children
                            .push(DocumentNode::Text(text.to_string()));
                    }
                }
                Node::Element(element) => stack.push(PendingElement {
                    element: Element::from_scraper(element),
                    remaining: child.children(),
                }),
                _ => {}
            },
            None => {
                let Some(finished) = stack.pop() else {
                    break;
                };
                match stack.last_mut() {
                    Some(parent) => parent
                        .element
                        .children
                        .push(DocumentNode::Element(finished.element)),
                    None => return DocumentNode::Element(finished.element),
                }
            }
        }
    }

    DocumentNode::Element(Element::new("html"))
}
