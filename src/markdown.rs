//! Markdown transformation with GitHub Flavored Markdown support.
//!
//! This module converts Markdown runs into structural trees using comrak with
//! GFM extensions (tables, strikethrough, autolinks, task lists). Raw HTML in
//! the Markdown is kept as structure and left for the sanitizer.

mod transform;

pub use transform::MarkdownTransformer;
