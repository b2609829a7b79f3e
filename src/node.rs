//! Structural tree shared by every pipeline stage.

use maud::Render;
use std::collections::BTreeMap;

use crate::style::StyleRegistry;

/// Maximum element nesting kept by any stage.
///
/// Subtrees below this depth are flattened into a single text leaf so that
/// recursive walks stay bounded on adversarially deep input.
pub const MAX_NESTING_DEPTH: usize = 128;

/// Elements that never have children or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Returns true if `tag` is an HTML void element.
pub fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(tag))
}

/// A node of a rendered document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Markup element with tag, attributes and ordered children.
    Element(Element),
    /// Terminal inline text (never raw Markdown).
    Text(String),
}

/// Markup element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: String,
    attributes: BTreeMap<String, String>,
    children: Vec<Node>,
}

impl Element {
    /// Creates an element with no attributes or children.
    ///
    /// Tag names are stored lowercase.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Builder style attribute setter.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Builder style child setter.
    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    /// Builder style single child append.
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes
            .insert(name.into().to_ascii_lowercase(), value.into());
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }
}

impl Node {
    /// Creates a text leaf.
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }

    /// Concatenated text of this node and its descendants.
    ///
    /// Walks with an explicit stack, so arbitrarily deep trees are safe.
    /// Subtrees rooted at an element for which `skip` returns true
    /// contribute nothing.
    pub fn text_content_filtered(&self, skip: impl Fn(&str) -> bool) -> String {
        let mut out = String::new();
        let mut stack = vec![self];

        while let Some(node) = stack.pop() {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Element(element) => {
                    if skip(&element.tag) {
                        continue;
                    }
                    stack.extend(element.children.iter().rev());
                }
            }
        }

        out
    }

    /// Concatenated text of this node and all descendants.
    pub fn text_content(&self) -> String {
        self.text_content_filtered(|_| false)
    }

    /// Serializes this node as HTML.
    ///
    /// When a style registry is given, registered rules are applied to each
    /// element as it is written. Text and attribute values are escaped.
    pub fn write_html(&self, out: &mut String, styles: Option<&StyleRegistry>) {
        match self {
            Node::Text(text) => text.as_str().render_to(out),
            Node::Element(element) => element.write_html(out, styles),
        }
    }
}

impl Drop for Element {
    /// Releases descendants with an explicit stack so that dropping a
    /// deeply nested tree cannot overflow.
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.children);
        while let Some(node) = stack.pop() {
            if let Node::Element(mut element) = node {
                stack.append(&mut element.children);
            }
        }
    }
}

impl Element {
    fn write_html(&self, out: &mut String, styles: Option<&StyleRegistry>) {
        let rule = styles.and_then(|registry| registry.lookup(&self.tag));

        if let Some(wrapper) = rule.and_then(|r| r.wrapper()) {
            out.push('<');
            out.push_str(wrapper.tag);
            write_class(out, wrapper.classes.join(" ").as_str());
            out.push('>');
        }

        out.push('<');
        out.push_str(&self.tag);

        let mut class = self.attr("class").unwrap_or_default().to_string();
        if let Some(rule) = rule {
            for name in rule.classes() {
                if !class.is_empty() {
                    class.push(' ');
                }
                class.push_str(name);
            }
        }

        for (name, value) in &self.attributes {
            if name == "class" {
                continue;
            }
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            value.as_str().render_to(out);
            out.push('"');
        }
        if !class.is_empty() {
            write_class(out, &class);
        }
        out.push('>');

        if !is_void(&self.tag) {
            for child in &self.children {
                child.write_html(out, styles);
            }
            out.push_str("</");
            out.push_str(&self.tag);
            out.push('>');
        }

        if let Some(wrapper) = rule.and_then(|r| r.wrapper()) {
            out.push_str("</");
            out.push_str(wrapper.tag);
            out.push('>');
        }
    }
}

fn write_class(out: &mut String, class: &str) {
    out.push_str(" class=\"");
    class.render_to(out);
    out.push('"');
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

/// Serializes a node sequence without styling.
pub fn to_html(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        node.write_html(&mut out, None);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_html_escapes_text_and_attributes() {
        // Arrange
        let node: Node = Element::new("a")
            .with_attr("href", "https://example.com/?a=1&b=\"2\"")
            .with_child(Node::text("<b>not bold</b>"))
            .into();

        // Act
        let html = to_html(&[node]);

        // Assert
        assert_eq!(
            html,
            "<a href=\"https://example.com/?a=1&amp;b=&quot;2&quot;\">&lt;b&gt;not bold&lt;/b&gt;</a>"
        );
    }

    #[test]
    fn test_write_html_void_elements() {
        // Arrange
        let nodes = vec![
            Element::new("br").into(),
            Element::new("img").with_attr("src", "a.png").into(),
        ];

        // Act
        let html = to_html(&nodes);

        // Assert
        assert_eq!(html, "<br><img src=\"a.png\">");
    }

    #[test]
    fn test_tag_names_lowercased() {
        let element = Element::new("DIV").with_attr("ALIGN", "center");
        assert_eq!(element.tag(), "div");
        assert_eq!(element.attr("align"), Some("center"));
    }

    #[test]
    fn test_text_content_skips_filtered_subtrees() {
        // Arrange
        let node: Node = Element::new("div")
            .with_children(vec![
                Node::text("keep "),
                Element::new("script")
                    .with_child(Node::text("alert(1)"))
                    .into(),
                Element::new("em").with_child(Node::text("this")).into(),
            ])
            .into();

        // Act
        let text = node.text_content_filtered(|tag| tag == "script");

        // Assert
        assert_eq!(text, "keep this");
        assert_eq!(node.text_content(), "keep alert(1)this");
    }

    #[test]
    fn test_text_content_deep_tree() {
        // Arrange: deeper than any recursion limit would tolerate
        let mut node = Node::text("bottom");
        for _ in 0..10_000 {
            node = Element::new("span").with_child(node).into();
        }

        // Act
        let text = node.text_content();

        // Assert
        assert_eq!(text, "bottom");
    }

    #[test]
    fn test_drop_deep_tree() {
        let mut node = Node::text("bottom");
        for _ in 0..200_000 {
            node = Element::new("span").with_child(node).into();
        }
        drop(node);
    }

    #[test]
    fn test_is_void() {
        assert!(is_void("br"));
        assert!(is_void("IMG"));
        assert!(!is_void("div"));
    }
}
