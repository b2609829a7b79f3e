//! Page layout wrapper component

use maud::{DOCTYPE, Markup, PreEscaped, Render, html};

use crate::assets;

/// Wraps rendered README content in a bordered panel
///
/// # Arguments
///
/// * `title`: Panel header text
/// * `content`: Rendered document
///
/// # Returns
///
/// Panel markup with header and content area
pub fn readme_panel(title: &str, content: &impl Render) -> Markup {
    html! {
        section class="readme-section" {
            div class="readme-card" {
                div class="readme-header" {
                    span class="readme-title" { (title) }
                }
                div class="readme-content" {
                    (content)
                }
            }
        }
    }
}

/// Wraps page content with standard HTML structure
///
/// Provides DOCTYPE, charset, viewport and the bundled stylesheet inline,
/// so the output is a single self contained file.
///
/// # Arguments
///
/// * `title`: Page title text
/// * `body`: Page-specific body markup
///
/// # Returns
///
/// Complete HTML document with wrapped content
pub fn page_wrapper(title: &str, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (PreEscaped(assets::stylesheet())) }
            }
            body {
                div class="container" {
                    (body)
                }
            }
        }
    }
}
