//! Assembly of rendered blocks into the final document.

use maud::Render;

use crate::node::Node;
use crate::style::StyleRegistry;

/// Rendered output of one top-level input segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    key: usize,
    nodes: Vec<Node>,
}

impl Block {
    /// Position of the originating segment in the input.
    ///
    /// Stable across renders of the same input, so consumers can key list
    /// updates on it.
    pub fn key(&self) -> usize {
        self.key
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// HTML for this block alone, with styles applied.
    pub fn to_html(&self, styles: &StyleRegistry) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            node.write_html(&mut out, Some(styles));
        }
        out
    }
}

/// Ordered, sanitized document ready for display.
#[derive(Debug, Clone)]
pub struct Document {
    blocks: Vec<Block>,
    styles: &'static StyleRegistry,
}

impl Document {
    /// Document with no blocks.
    pub fn empty(styles: &'static StyleRegistry) -> Self {
        Self {
            blocks: Vec::new(),
            styles,
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Concatenates per-segment outputs in input order.
///
/// Each output is keyed by its position. Outputs left empty by sanitization
/// keep their block so later keys do not shift.
pub fn assemble(outputs: Vec<Vec<Node>>, styles: &'static StyleRegistry) -> Document {
    let blocks = outputs
        .into_iter()
        .enumerate()
        .map(|(key, nodes)| Block { key, nodes })
        .collect();

    Document { blocks, styles }
}

impl Render for Document {
    fn render_to(&self, buffer: &mut String) {
        for block in &self.blocks {
            for node in &block.nodes {
                node.write_html(buffer, Some(self.styles));
            }
        }
    }
}
