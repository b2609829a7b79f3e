//! Safe rendering of untrusted README content.
//!
//! README text freely mixes raw HTML and Markdown. Rendering splits it into
//! top-level HTML and Markdown segments, converts Markdown with GitHub
//! Flavored Markdown extensions, sanitizes every resulting tree against a
//! static allow-list, applies per-element style rules and assembles the
//! output in source order.
//!
//! ```
//! use maud::Render;
//! use readmekit::ReadmeRenderer;
//!
//! let document = ReadmeRenderer::new().render(Some("<div>intro</div>\n\n**bold** text"));
//! assert_eq!(document.len(), 2);
//! assert!(!document.render().into_string().contains("<script"));
//! ```

mod assets;
pub mod components;
mod config;
mod document;
mod html;
mod input;
mod markdown;
mod node;
mod renderer;
mod sanitize;
mod split;
mod style;

pub use config::Config;
pub use document::{Block, Document, assemble};
pub use html::parse_fragment;
pub use input::{InputError, decode_base64, decode_text};
pub use markdown::MarkdownTransformer;
pub use node::{Element, MAX_NESTING_DEPTH, Node, to_html};
pub use renderer::ReadmeRenderer;
pub use sanitize::{AllowList, Sanitizer, is_dangerous, is_safe_url};
pub use split::{Segment, split};
pub use style::{StyleRegistry, StyleRule, Wrapper};
