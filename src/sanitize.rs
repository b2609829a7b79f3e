//! Allow-list sanitization of structural trees.
//!
//! Every tree that reaches the document, whether parsed from raw HTML or
//! produced from Markdown, passes through [`Sanitizer::sanitize`]. Disallowed
//! elements are unwrapped to their sanitized children, dangerous elements are
//! dropped together with their subtree, and attributes outside the per-tag
//! allow-list are removed. Nothing is reported back to the caller.

use tracing::{debug, trace};

use crate::node::{Element, MAX_NESTING_DEPTH, Node};

/// Elements removed together with everything inside them.
const DANGEROUS_TAGS: &[&str] = &[
    "script", "style", "iframe", "frame", "frameset", "object", "embed", "applet", "noscript",
    "template", "textarea", "title", "base", "link", "meta", "svg", "math",
];

/// Returns true if `tag` is dropped along with its whole subtree.
pub fn is_dangerous(tag: &str) -> bool {
    DANGEROUS_TAGS.iter().any(|t| t.eq_ignore_ascii_case(tag))
}

/// Value constraint for an allowed attribute.
#[derive(Debug, Clone, Copy)]
pub enum AttrRule {
    /// Any value.
    Any,
    /// URL whose scheme, if present, is one of the listed schemes.
    Url(&'static [&'static str]),
    /// Every whitespace separated token starts with the prefix.
    Prefix(&'static str),
}

impl AttrRule {
    fn accepts(&self, value: &str) -> bool {
        match self {
            AttrRule::Any => true,
            AttrRule::Url(schemes) => is_safe_url(value, schemes),
            AttrRule::Prefix(prefix) => value
                .split_ascii_whitespace()
                .all(|token| token.len() > prefix.len() && token.starts_with(prefix)),
        }
    }
}

/// Per tag allow-list entry.
#[derive(Debug)]
pub struct TagRule {
    name: &'static str,
    attributes: &'static [(&'static str, AttrRule)],
    /// Attribute that must be present with this value (ASCII case-insensitive)
    /// for the element to be kept.
    requires: Option<(&'static str, &'static str)>,
}

impl TagRule {
    const fn plain(name: &'static str) -> Self {
        Self {
            name,
            attributes: &[],
            requires: None,
        }
    }

    const fn with(name: &'static str, attributes: &'static [(&'static str, AttrRule)]) -> Self {
        Self {
            name,
            attributes,
            requires: None,
        }
    }
}

const LINK_SCHEMES: &[&str] = &["http", "https", "mailto"];
const MEDIA_SCHEMES: &[&str] = &["http", "https"];
const CELL_ATTRS: &[(&str, AttrRule)] = &[("colspan", AttrRule::Any), ("rowspan", AttrRule::Any)];

/// Permitted tags and attributes.
#[derive(Debug)]
pub struct AllowList {
    tags: &'static [TagRule],
    global: &'static [&'static str],
}

static README: AllowList = AllowList {
    tags: &[
        TagRule::with(
            "a",
            &[("href", AttrRule::Url(LINK_SCHEMES)), ("name", AttrRule::Any)],
        ),
        TagRule::plain("b"),
        TagRule::with("blockquote", &[("cite", AttrRule::Url(LINK_SCHEMES))]),
        TagRule::plain("br"),
        TagRule::with("code", &[("class", AttrRule::Prefix("language-"))]),
        TagRule::plain("dd"),
        TagRule::plain("del"),
        TagRule::with("details", &[("open", AttrRule::Any)]),
        TagRule::plain("div"),
        TagRule::plain("dl"),
        TagRule::plain("dt"),
        TagRule::plain("em"),
        TagRule::plain("h1"),
        TagRule::plain("h2"),
        TagRule::plain("h3"),
        TagRule::plain("h4"),
        TagRule::plain("h5"),
        TagRule::plain("h6"),
        TagRule::plain("hr"),
        TagRule::plain("i"),
        TagRule::with(
            "img",
            &[("src", AttrRule::Url(MEDIA_SCHEMES)), ("alt", AttrRule::Any)],
        ),
        TagRule {
            name: "input",
            attributes: &[
                ("type", AttrRule::Any),
                ("checked", AttrRule::Any),
                ("disabled", AttrRule::Any),
            ],
            requires: Some(("type", "checkbox")),
        },
        TagRule::plain("ins"),
        TagRule::plain("kbd"),
        TagRule::plain("li"),
        TagRule::with("ol", &[("start", AttrRule::Any)]),
        TagRule::plain("p"),
        TagRule::plain("picture"),
        TagRule::plain("pre"),
        TagRule::plain("q"),
        TagRule::plain("rp"),
        TagRule::plain("rt"),
        TagRule::plain("ruby"),
        TagRule::plain("s"),
        TagRule::plain("samp"),
        TagRule::plain("section"),
        TagRule::with("source", &[("media", AttrRule::Any)]),
        TagRule::plain("span"),
        TagRule::plain("strike"),
        TagRule::plain("strong"),
        TagRule::plain("sub"),
        TagRule::plain("summary"),
        TagRule::plain("sup"),
        TagRule::plain("table"),
        TagRule::plain("tbody"),
        TagRule::with("td", CELL_ATTRS),
        TagRule::plain("tfoot"),
        TagRule::with(
            "th",
            &[
                ("colspan", AttrRule::Any),
                ("rowspan", AttrRule::Any),
                ("scope", AttrRule::Any),
            ],
        ),
        TagRule::plain("thead"),
        TagRule::plain("tr"),
        TagRule::plain("tt"),
        TagRule::plain("ul"),
        TagRule::plain("var"),
    ],
    global: &[
        "align",
        "aria-hidden",
        "aria-label",
        "dir",
        "height",
        "lang",
        "title",
        "width",
    ],
};

impl AllowList {
    /// GitHub style README allow-list.
    pub fn readme() -> &'static AllowList {
        &README
    }

    fn rule(&self, tag: &str) -> Option<&TagRule> {
        self.tags.iter().find(|rule| rule.name == tag)
    }

    /// Returns true if `tag` is permitted.
    pub fn allows_tag(&self, tag: &str) -> bool {
        self.rule(tag).is_some()
    }

    /// Returns true if attribute `name` with `value` is permitted on `tag`.
    pub fn allows_attr(&self, tag: &str, name: &str, value: &str) -> bool {
        let Some(rule) = self.rule(tag) else {
            return false;
        };

        if let Some((_, attr_rule)) = rule.attributes.iter().find(|(attr, _)| *attr == name) {
            return attr_rule.accepts(value);
        }

        self.global.contains(&name)
    }
}

/// Checks a URL attribute value against a scheme allow-list.
///
/// Scheme-less values (relative paths, fragments, queries, protocol relative
/// URLs) are accepted. Leading whitespace and control characters are ignored
/// and ASCII tab and newline are removed before the scheme is read, matching
/// how browsers parse URLs.
pub fn is_safe_url(value: &str, schemes: &[&str]) -> bool {
    let normalized: String = value
        .trim_start_matches(|c: char| c.is_ascii_whitespace() || c.is_control())
        .chars()
        .filter(|c| !matches!(c, '\t' | '\n' | '\r'))
        .collect();

    let Some(colon) = normalized.find(':') else {
        return true;
    };

    let candidate = &normalized[..colon];
    if candidate.contains(['/', '?', '#']) {
        return true;
    }

    let is_scheme = candidate
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic())
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if !is_scheme {
        // Something like "a b:c"; browsers treat it as relative
        return !candidate.is_empty();
    }

    schemes.iter().any(|s| s.eq_ignore_ascii_case(candidate))
}

/// Restricts trees to an [`AllowList`].
#[derive(Debug, Clone, Copy)]
pub struct Sanitizer<'a> {
    allow_list: &'a AllowList,
}

impl<'a> Sanitizer<'a> {
    pub fn new(allow_list: &'a AllowList) -> Self {
        Self { allow_list }
    }

    /// Returns the sanitized equivalent of `nodes`.
    ///
    /// The input is not modified. Sanitizing the output again yields the same
    /// output.
    pub fn sanitize(&self, nodes: &[Node]) -> Vec<Node> {
        let mut out = Vec::with_capacity(nodes.len());
        self.sanitize_into(nodes, 0, &mut out);
        out
    }

    fn sanitize_into(&self, nodes: &[Node], depth: usize, out: &mut Vec<Node>) {
        for node in nodes {
            match node {
                Node::Text(text) => out.push(Node::Text(text.clone())),
                Node::Element(element) => self.sanitize_element(element, node, depth, out),
            }
        }
    }

    fn sanitize_element(&self, element: &Element, node: &Node, depth: usize, out: &mut Vec<Node>) {
        let tag = element.tag();

        if is_dangerous(tag) {
            debug!(tag, "dropped dangerous element");
            return;
        }

        if depth >= MAX_NESTING_DEPTH {
            debug!(tag, depth, "flattened subtree beyond nesting limit");
            let text = node.text_content_filtered(|t| is_dangerous(t));
            if !text.is_empty() {
                out.push(Node::Text(text));
            }
            return;
        }

        let Some(rule) = self.allow_list.rule(tag) else {
            trace!(tag, "unwrapped disallowed element");
            self.sanitize_into(element.children(), depth + 1, out);
            return;
        };

        if let Some((name, expected)) = rule.requires {
            let satisfied = element
                .attr(name)
                .is_some_and(|v| v.trim().eq_ignore_ascii_case(expected));
            if !satisfied {
                trace!(tag, "unwrapped element missing required attribute");
                self.sanitize_into(element.children(), depth + 1, out);
                return;
            }
        }

        let mut clean = Element::new(tag);
        for (name, value) in element.attributes() {
            if self.allow_list.allows_attr(tag, name, value) {
                clean.set_attr(name.as_str(), value.as_str());
            } else {
                trace!(tag, attribute = name.as_str(), "stripped attribute");
            }
        }

        let mut children = Vec::with_capacity(element.children().len());
        self.sanitize_into(element.children(), depth + 1, &mut children);
        out.push(clean.with_children(children).into());
    }
}

impl Default for Sanitizer<'static> {
    fn default() -> Self {
        Self::new(AllowList::readme())
    }
}
