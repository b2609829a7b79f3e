//! Markdown to structural tree conversion.

use comrak::nodes::{AstNode, ListType, NodeHtmlBlock, NodeValue, TableAlignment};
use comrak::{Arena, Options};
use tracing::debug;

use crate::html;
use crate::node::{Element, MAX_NESTING_DEPTH, Node};
use crate::sanitize::is_dangerous;

/// Converts Markdown text into structural nodes with GitHub Flavored
/// Markdown extensions.
///
/// Parsing never fails: sequences the grammar cannot interpret are kept as
/// literal text. Embedded raw HTML is parsed into elements instead of being
/// escaped, so the caller must sanitize the result.
pub struct MarkdownTransformer<'a> {
    options: Options<'a>,
}

impl<'a> MarkdownTransformer<'a> {
    /// Creates transformer with GitHub Flavored Markdown options.
    ///
    /// Enables tables, strikethrough, autolinks (URLs, `www.` and bare
    /// e-mail addresses) and task lists.
    pub fn new() -> Self {
        let mut options = Options::default();

        options.extension.strikethrough = true;
        options.extension.table = true;
        options.extension.autolink = true;
        options.extension.tasklist = true;

        Self { options }
    }

    /// Transforms a Markdown run into nodes.
    ///
    /// # Arguments
    ///
    /// * `markdown`: Markdown source, possibly containing raw HTML
    ///
    /// # Returns
    ///
    /// Top-level block nodes in source order
    pub fn transform(&self, markdown: &str) -> Vec<Node> {
        let arena = Arena::new();
        let root = comrak::parse_document(&arena, markdown, &self.options);
        convert_children(root, 0, false)
    }
}

impl<'a> Default for MarkdownTransformer<'a> {
    fn default() -> Self {
        Self::new()
    }
}

/// Converts the children of `parent` placed at `depth`.
///
/// When any child is raw HTML, all children are serialized back to HTML and
/// parsed as one fragment. Opening and closing tags that comrak reports as
/// separate events (`<b>`, text, `</b>`) then nest their Markdown siblings the
/// way a browser would.
fn convert_children<'a>(parent: &'a AstNode<'a>, depth: usize, tight: bool) -> Vec<Node> {
    let children: Vec<&'a AstNode<'a>> = parent.children().collect();

    if !children.iter().any(|child| raw_html(child).is_some()) {
        return children
            .into_iter()
            .flat_map(|child| convert(child, depth, tight))
            .collect();
    }

    let mut source = String::new();
    for child in children {
        match raw_html(child) {
            Some(raw) => source.push_str(&raw),
            None => {
                for node in convert(child, depth, tight) {
                    node.write_html(&mut source, None);
                }
            }
        }
    }
    html::parse_fragment(&source, depth)
}

fn raw_html<'a>(node: &'a AstNode<'a>) -> Option<String> {
    match &node.data.borrow().value {
        NodeValue::HtmlBlock(block) => Some(block.literal.clone()),
        NodeValue::HtmlInline(raw) => Some(raw.clone()),
        _ => None,
    }
}

/// Converts one comrak node. Container children land at `depth + 1`.
///
/// `tight` is set for the children of a tight list item, whose paragraphs
/// render without a `<p>` wrapper.
fn convert<'a>(node: &'a AstNode<'a>, depth: usize, tight: bool) -> Vec<Node> {
    if depth >= MAX_NESTING_DEPTH {
        debug!(depth, "flattened Markdown beyond nesting limit");
        let text = flatten_text(node);
        return if text.is_empty() {
            Vec::new()
        } else {
            vec![Node::Text(text)]
        };
    }

    let value = node.data.borrow().value.clone();
    let element = |tag: &str| -> Vec<Node> {
        vec![
            Element::new(tag)
                .with_children(convert_children(node, depth + 1, false))
                .into(),
        ]
    };

    match value {
        NodeValue::Document => convert_children(node, depth, false),
        NodeValue::Paragraph if tight => convert_children(node, depth, false),
        NodeValue::Paragraph => element("p"),
        NodeValue::Heading(heading) => element(&format!("h{}", heading.level.clamp(1, 6))),
        NodeValue::BlockQuote => element("blockquote"),
        NodeValue::ThematicBreak => vec![Element::new("hr").into()],
        NodeValue::List(list) => {
            let mut element = match list.list_type {
                ListType::Bullet => Element::new("ul"),
                ListType::Ordered => Element::new("ol"),
            };
            if list.list_type == ListType::Ordered && list.start != 1 {
                element.set_attr("start", list.start.to_string());
            }
            vec![
                element
                    .with_children(convert_children(node, depth + 1, list.tight))
                    .into(),
            ]
        }
        NodeValue::Item(_) => vec![
            Element::new("li")
                .with_children(convert_children(node, depth + 1, tight))
                .into(),
        ],
        NodeValue::TaskItem(symbol) => {
            let mut checkbox = Element::new("input")
                .with_attr("type", "checkbox")
                .with_attr("disabled", "");
            if symbol.is_some() {
                checkbox.set_attr("checked", "");
            }

            let mut children = vec![checkbox.into(), Node::text(" ")];
            children.extend(convert_children(node, depth + 1, tight));
            vec![Element::new("li").with_children(children).into()]
        }
        NodeValue::CodeBlock(block) => {
            let mut code = Element::new("code");
            if let Some(language) = block.info.split_whitespace().next() {
                code.set_attr("class", format!("language-{}", language));
            }
            vec![
                Element::new("pre")
                    .with_child(code.with_child(Node::Text(block.literal)).into())
                    .into(),
            ]
        }
        NodeValue::Table(table) => vec![convert_table(node, &table.alignments, depth)],
        NodeValue::Text(text) => vec![Node::Text(text)],
        NodeValue::SoftBreak => vec![Node::text("\n")],
        NodeValue::LineBreak => vec![Element::new("br").into()],
        NodeValue::Code(code) => vec![
            Element::new("code")
                .with_child(Node::Text(code.literal))
                .into(),
        ],
        NodeValue::Emph => element("em"),
        NodeValue::Strong => element("strong"),
        NodeValue::Strikethrough => element("del"),
        NodeValue::Link(link) => {
            let mut anchor = Element::new("a").with_attr("href", link.url);
            if !link.title.is_empty() {
                anchor.set_attr("title", link.title);
            }
            vec![
                anchor
                    .with_children(convert_children(node, depth + 1, false))
                    .into(),
            ]
        }
        NodeValue::Image(link) => {
            let mut image = Element::new("img")
                .with_attr("src", link.url)
                .with_attr("alt", flatten_text(node));
            if !link.title.is_empty() {
                image.set_attr("title", link.title);
            }
            vec![image.into()]
        }
        NodeValue::HtmlBlock(block) => html::parse_fragment(&block.literal, depth),
        NodeValue::HtmlInline(raw) => html::parse_fragment(&raw, depth),
        NodeValue::FrontMatter(_) => Vec::new(),
        _ => convert_children(node, depth, false),
    }
}

/// Builds `table > thead/tbody > tr > th/td` from a comrak table.
fn convert_table<'a>(
    node: &'a AstNode<'a>,
    alignments: &[TableAlignment],
    depth: usize,
) -> Node {
    let mut head = Vec::new();
    let mut body = Vec::new();

    for row in node.children() {
        let header = matches!(row.data.borrow().value, NodeValue::TableRow(true));
        let cell_tag = if header { "th" } else { "td" };

        let cells = row
            .children()
            .enumerate()
            .map(|(column, cell)| {
                let mut element = Element::new(cell_tag);
                if let Some(align) = alignments.get(column).and_then(|a| alignment_name(*a)) {
                    element.set_attr("align", align);
                }
                element
                    .with_children(convert_children(cell, depth + 4, false))
                    .into()
            })
            .collect();

        let row = Element::new("tr").with_children(cells).into();
        if header {
            head.push(row);
        } else {
            body.push(row);
        }
    }

    let mut sections = Vec::new();
    if !head.is_empty() {
        sections.push(Element::new("thead").with_children(head).into());
    }
    if !body.is_empty() {
        sections.push(Element::new("tbody").with_children(body).into());
    }
    Element::new("table").with_children(sections).into()
}

fn alignment_name(alignment: TableAlignment) -> Option<&'static str> {
    match alignment {
        TableAlignment::Left => Some("left"),
        TableAlignment::Center => Some("center"),
        TableAlignment::Right => Some("right"),
        TableAlignment::None => None,
    }
}

/// Plain text of a subtree, collected without recursion.
///
/// Raw HTML is dropped, and text between an inline opening and closing tag
/// of a dangerous element is skipped.
fn flatten_text<'a>(node: &'a AstNode<'a>) -> String {
    let mut out = String::new();
    let mut suppressed = 0usize;

    for descendant in node.descendants() {
        match &descendant.data.borrow().value {
            NodeValue::HtmlInline(raw)
            | NodeValue::HtmlBlock(NodeHtmlBlock { literal: raw, .. }) => {
                match dangerous_tag_edge(raw) {
                    Some(true) => suppressed += 1,
                    Some(false) => suppressed = suppressed.saturating_sub(1),
                    None => {}
                }
            }
            _ if suppressed > 0 => {}
            NodeValue::Text(text) => out.push_str(text),
            NodeValue::Code(code) => out.push_str(&code.literal),
            NodeValue::CodeBlock(block) => out.push_str(&block.literal),
            NodeValue::SoftBreak | NodeValue::LineBreak => out.push(' '),
            _ => {}
        }
    }

    out
}

/// Classifies raw HTML as the opening (true) or closing (false) tag of a
/// dangerous element.
fn dangerous_tag_edge(raw: &str) -> Option<bool> {
    let rest = raw.trim_start().strip_prefix('<')?;
    let (closing, rest) = match rest.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, rest),
    };

    let name: String = rest
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect();
    if !is_dangerous(&name) {
        return None;
    }

    let close_tag = format!("</{}", name.to_ascii_lowercase());
    if !closing && raw.to_ascii_lowercase().contains(&close_tag) {
        return None;
    }

    Some(!closing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text(s: &str) -> Node {
        Node::text(s)
    }

    fn find<'n>(nodes: &'n [Node], tag: &str) -> Option<&'n Element> {
        let mut stack: Vec<&Node> = nodes.iter().rev().collect();
        while let Some(node) = stack.pop() {
            if let Node::Element(element) = node {
                if element.tag() == tag {
                    return Some(element);
                }
                stack.extend(element.children().iter().rev());
            }
        }
        None
    }

    #[test]
    fn test_transform_paragraph_with_bold() {
        // Arrange
        let transformer = MarkdownTransformer::new();

        // Act
        let nodes = transformer.transform("**bold** text");

        // Assert
        assert_eq!(
            nodes,
            vec![
                Element::new("p")
                    .with_children(vec![
                        Element::new("strong").with_child(text("bold")).into(),
                        text(" text"),
                    ])
                    .into()
            ]
        );
    }

    #[test]
    fn test_transform_headings() {
        // Act
        let nodes = MarkdownTransformer::new().transform("# Title\n\n## Subtitle\n\n###### Small");

        // Assert
        let tags: Vec<_> = nodes
            .iter()
            .filter_map(|n| n.as_element().map(|e| e.tag().to_string()))
            .collect();
        assert_eq!(tags, vec!["h1", "h2", "h6"]);
    }

    #[test]
    fn test_transform_tight_list_has_no_paragraphs() {
        // Act
        let nodes = MarkdownTransformer::new().transform("- one\n- two\n");

        // Assert
        assert_eq!(
            nodes,
            vec![
                Element::new("ul")
                    .with_children(vec![
                        Element::new("li").with_child(text("one")).into(),
                        Element::new("li").with_child(text("two")).into(),
                    ])
                    .into()
            ]
        );
    }

    #[test]
    fn test_transform_loose_list_keeps_paragraphs() {
        let nodes = MarkdownTransformer::new().transform("- one\n\n- two\n");
        let item = find(&nodes, "li").expect("Should contain list item");
        assert_eq!(item.children()[0].as_element().map(|e| e.tag()), Some("p"));
    }

    #[test]
    fn test_transform_ordered_list_start() {
        let nodes = MarkdownTransformer::new().transform("3. three\n4. four\n");
        let list = find(&nodes, "ol").expect("Should contain ordered list");
        assert_eq!(list.attr("start"), Some("3"));
    }

    #[test]
    fn test_transform_gfm_table() {
        // Arrange
        let markdown = "| Left | Right |\n|:-----|------:|\n| a    | b     |\n";

        // Act
        let nodes = MarkdownTransformer::new().transform(markdown);

        // Assert
        let table = find(&nodes, "table").expect("Should contain table");
        assert_eq!(table.children().len(), 2, "thead and tbody");
        let th = find(&nodes, "th").expect("Should contain header cell");
        assert_eq!(th.attr("align"), Some("left"));
        let tbody = find(&nodes, "tbody").expect("Should contain body");
        let row = tbody.children()[0].as_element().expect("Should contain row");
        let cells: Vec<_> = row.children().iter().filter_map(Node::as_element).collect();
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[1].tag(), "td");
        assert_eq!(cells[1].attr("align"), Some("right"));
        assert_eq!(Node::from(cells[1].clone()).text_content(), "b");
    }

    #[test]
    fn test_transform_strikethrough() {
        let nodes = MarkdownTransformer::new().transform("This is ~~gone~~ text.");
        let del = find(&nodes, "del").expect("Should contain del");
        assert_eq!(del.children(), &[text("gone")]);
    }

    #[test]
    fn test_transform_autolinks() {
        // Act
        let nodes = MarkdownTransformer::new()
            .transform("Visit https://example.com or mail someone@example.com.");

        // Assert
        let links: Vec<_> = {
            let mut found = Vec::new();
            let mut stack: Vec<&Node> = nodes.iter().collect();
            while let Some(node) = stack.pop() {
                if let Node::Element(e) = node {
                    if e.tag() == "a" {
                        found.push(e.attr("href").unwrap_or_default().to_string());
                    }
                    stack.extend(e.children());
                }
            }
            found
        };
        assert!(links.contains(&"https://example.com".to_string()), "{:?}", links);
        assert!(
            links.contains(&"mailto:someone@example.com".to_string()),
            "{:?}",
            links
        );
    }

    #[test]
    fn test_transform_tasklist() {
        // Act
        let nodes = MarkdownTransformer::new().transform("- [ ] todo\n- [x] done\n");

        // Assert
        let list = find(&nodes, "ul").expect("Should contain list");
        let items: Vec<_> = list.children().iter().filter_map(Node::as_element).collect();
        assert_eq!(items.len(), 2);

        let unchecked = items[0].children()[0].as_element().expect("checkbox");
        assert_eq!(unchecked.tag(), "input");
        assert_eq!(unchecked.attr("type"), Some("checkbox"));
        assert_eq!(unchecked.attr("checked"), None);

        let checked = items[1].children()[0].as_element().expect("checkbox");
        assert_eq!(checked.attr("checked"), Some(""));
        assert!(Node::from(items[1].clone()).text_content().contains("done"));
    }

    #[test]
    fn test_transform_code_block() {
        // Act
        let nodes = MarkdownTransformer::new().transform("```rust\nfn main() {}\n```\n");

        // Assert
        assert_eq!(
            nodes,
            vec![
                Element::new("pre")
                    .with_child(
                        Element::new("code")
                            .with_attr("class", "language-rust")
                            .with_child(text("fn main() {}\n"))
                            .into()
                    )
                    .into()
            ]
        );
    }

    #[test]
    fn test_transform_inline_html_nests() {
        // Act
        let nodes = MarkdownTransformer::new().transform("Hello <b>big *world*</b><br>again");

        // Assert
        let bold = find(&nodes, "b").expect("Inline HTML should become an element");
        assert_eq!(bold.children()[0], text("big "));
        assert_eq!(bold.children()[1].as_element().map(|e| e.tag()), Some("em"));
        assert!(find(&nodes, "br").is_some(), "Inline br should be kept");
        assert_eq!(nodes[0].as_element().map(|e| e.tag()), Some("p"));
    }

    #[test]
    fn test_transform_html_block_wraps_markdown() {
        // Arrange: unterminated div followed by Markdown
        let markdown = "<div>\n\n**inside**\n";

        // Act
        let nodes = MarkdownTransformer::new().transform(markdown);

        // Assert
        let div = find(&nodes, "div").expect("Should contain div");
        assert!(
            find(div.children(), "strong").is_some(),
            "Markdown after an open div should nest inside it: {:?}",
            nodes
        );
    }

    #[test]
    fn test_transform_keeps_script_for_sanitizer() {
        let nodes = MarkdownTransformer::new().transform("<script>alert(1)</script>\n\nText");
        assert!(find(&nodes, "script").is_some());
    }

    #[test]
    fn test_transform_unterminated_tag_literal_text() {
        // Act
        let nodes = MarkdownTransformer::new().transform("<div>broken");

        // Assert
        let all_text: String = nodes.iter().map(Node::text_content).collect();
        assert!(all_text.contains("broken"), "{:?}", nodes);
    }

    #[test]
    fn test_transform_image_alt() {
        let nodes = MarkdownTransformer::new().transform("![The *logo*](logo.png \"Logo\")");
        let image = find(&nodes, "img").expect("Should contain image");
        assert_eq!(image.attr("src"), Some("logo.png"));
        assert_eq!(image.attr("alt"), Some("The logo"));
        assert_eq!(image.attr("title"), Some("Logo"));
    }

    #[test]
    fn test_transform_empty() {
        assert!(MarkdownTransformer::new().transform("").is_empty());
    }

    #[test]
    fn test_transform_deep_blockquotes_bounded() {
        // Arrange
        let markdown = format!("{} deep", ">".repeat(MAX_NESTING_DEPTH * 2));

        // Act
        let nodes = MarkdownTransformer::new().transform(&markdown);

        // Assert
        let mut levels = 0;
        let mut current = &nodes[0];
        while let Node::Element(element) = current {
            levels += 1;
            current = &element.children()[0];
        }
        assert!(levels <= MAX_NESTING_DEPTH, "levels = {}", levels);
        assert_eq!(current, &text("deep"));
    }

    #[test]
    fn test_dangerous_tag_edge() {
        assert_eq!(dangerous_tag_edge("<script>"), Some(true));
        assert_eq!(dangerous_tag_edge("</SCRIPT>"), Some(false));
        assert_eq!(dangerous_tag_edge("<script>x</script>"), None);
        assert_eq!(dangerous_tag_edge("<b>"), None);
    }
}
