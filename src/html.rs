//! HTML fragment parsing into structural nodes.

use scraper::{ElementRef, Html};
use tracing::debug;

use crate::node::{Element, MAX_NESTING_DEPTH, Node};
use crate::sanitize::is_dangerous;

/// Parses an HTML fragment into nodes.
///
/// Parsing follows the HTML5 fragment algorithm in a body context, so the
/// result never fails: stray closing tags are ignored and unclosed elements
/// are closed at the end of the input. Comments, doctypes and processing
/// instructions are discarded.
///
/// # Arguments
///
/// * `fragment`: HTML source
/// * `depth`: Nesting depth at which the returned nodes will be placed
pub fn parse_fragment(fragment: &str, depth: usize) -> Vec<Node> {
    let document = Html::parse_fragment(fragment);
    let mut nodes = Vec::new();
    convert_children(document.root_element(), depth, &mut nodes);
    nodes
}

fn convert_children(parent: ElementRef<'_>, depth: usize, out: &mut Vec<Node>) {
    for child in parent.children() {
        match child.value() {
            scraper::Node::Text(text) => push_text(out, &**text),
            scraper::Node::Element(_) => {
                if let Some(element) = ElementRef::wrap(child) {
                    out.push(convert_element(element, depth));
                }
            }
            _ => {}
        }
    }
}

fn convert_element(element: ElementRef<'_>, depth: usize) -> Node {
    let value = element.value();

    if depth >= MAX_NESTING_DEPTH {
        debug!(tag = value.name(), depth, "flattened HTML beyond nesting limit");
        return Node::Text(flatten_text(element));
    }

    let mut node = Element::new(value.name());
    for (name, attr_value) in value.attrs() {
        node.set_attr(name, attr_value);
    }

    let mut children = Vec::new();
    convert_children(element, depth + 1, &mut children);
    node.with_children(children).into()
}

/// Text content of `element`, excluding text inside dangerous elements.
fn flatten_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    let mut stack = vec![*element];

    while let Some(node) = stack.pop() {
        match node.value() {
            scraper::Node::Text(text) => out.push_str(&**text),
            scraper::Node::Element(el) if is_dangerous(el.name()) => {}
            _ => stack.extend(node.children().rev()),
        }
    }

    out
}

/// Appends text, merging with a preceding text node.
fn push_text(out: &mut Vec<Node>, text: &str) {
    if let Some(Node::Text(last)) = out.last_mut() {
        last.push_str(text);
    } else {
        out.push(Node::text(text));
    }
}
