//! CSS asset bundling

const BASE: &str = include_str!("../assets/base.css");
const README: &str = include_str!("../assets/readme.css");

/// Returns the stylesheet for standalone pages.
///
/// Covers the panel chrome and every class the style registry emits.
pub fn stylesheet() -> String {
    [BASE, README].join("\n")
}
