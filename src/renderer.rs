//! README rendering pipeline.

use tracing::debug;

use crate::document::{self, Document};
use crate::input::{self, InputError};
use crate::markdown::MarkdownTransformer;
use crate::node::Node;
use crate::sanitize::{AllowList, Sanitizer};
use crate::split::{self, Segment};
use crate::style::StyleRegistry;

/// Renders untrusted README text mixing raw HTML and Markdown.
///
/// The input is split into top-level HTML and Markdown segments, Markdown is
/// transformed into structural trees, every tree is sanitized against the
/// allow-list, and the results are assembled in input order. Sanitization is
/// the last step before assembly for both producers.
///
/// Rendering is total and keeps no state between calls.
pub struct ReadmeRenderer<'a> {
    transformer: MarkdownTransformer<'a>,
    sanitizer: Sanitizer<'static>,
    styles: &'static StyleRegistry,
}

impl<'a> ReadmeRenderer<'a> {
    /// Creates renderer with the README allow-list and standard styles.
    pub fn new() -> Self {
        Self::with_tables(AllowList::readme(), StyleRegistry::standard())
    }

    /// Creates renderer with explicit configuration tables.
    pub fn with_tables(allow_list: &'static AllowList, styles: &'static StyleRegistry) -> Self {
        Self {
            transformer: MarkdownTransformer::new(),
            sanitizer: Sanitizer::new(allow_list),
            styles,
        }
    }

    /// Renders README content.
    ///
    /// Absent input renders an empty document.
    pub fn render(&self, content: Option<&str>) -> Document {
        let Some(content) = content else {
            return Document::empty(self.styles);
        };

        let segments = split::split(content);
        debug!(segments = segments.len(), bytes = content.len(), "split input");

        let outputs = segments
            .into_iter()
            .map(|segment| self.render_segment(segment))
            .collect();

        document::assemble(outputs, self.styles)
    }

    /// Renders raw bytes from a content provider.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::NotText`] if the bytes are not UTF-8 text.
    pub fn render_bytes(&self, bytes: &[u8]) -> Result<Document, InputError> {
        let text = input::decode_text(bytes)?;
        Ok(self.render(Some(text)))
    }

    fn render_segment(&self, segment: Segment) -> Vec<Node> {
        let nodes = match segment {
            Segment::Html(nodes) => nodes,
            Segment::Markdown(text) => self.transformer.transform(&text),
        };
        self.sanitizer.sanitize(&nodes)
    }
}

impl<'a> Default for ReadmeRenderer<'a> {
    fn default() -> Self {
        Self::new()
    }
}
