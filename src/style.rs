//! Presentation overrides keyed by element kind.
//!
//! Overrides are data: adding one means adding a row to the table, never a
//! new branch in the renderer. Rules only affect presentation of elements
//! that survived sanitization.

/// Element wrapped around a styled element when it is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wrapper {
    pub tag: &'static str,
    pub classes: &'static [&'static str],
}

/// Rendering rule for one element kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleRule {
    classes: &'static [&'static str],
    wrapper: Option<Wrapper>,
}

impl StyleRule {
    pub const fn classes(&self) -> &'static [&'static str] {
        self.classes
    }

    pub const fn wrapper(&self) -> Option<Wrapper> {
        self.wrapper
    }
}

/// Level 1 headings: left aligned, larger.
const HEADING_PRIMARY: StyleRule = StyleRule {
    classes: &["my-4", "text-2xl", "font-bold", "text-left"],
    wrapper: None,
};

/// Levels 2 to 6: centered, smaller.
const HEADING_SECONDARY: StyleRule = StyleRule {
    classes: &["my-4", "text-xl", "font-bold", "text-center"],
    wrapper: None,
};

const PARAGRAPH: StyleRule = StyleRule {
    classes: &["my-2", "flex", "flex-row", "gap-2"],
    wrapper: None,
};

const UNORDERED_LIST: StyleRule = StyleRule {
    classes: &["my-2"],
    wrapper: None,
};

const LIST_ITEM: StyleRule = StyleRule {
    classes: &["my-1"],
    wrapper: None,
};

const TABLE: StyleRule = StyleRule {
    classes: &[],
    wrapper: Some(Wrapper {
        tag: "div",
        classes: &["overflow-x-auto"],
    }),
};

/// Lookup table from element kind to rendering rule.
#[derive(Debug)]
pub struct StyleRegistry {
    rules: &'static [(&'static str, StyleRule)],
}

static STANDARD: StyleRegistry = StyleRegistry {
    rules: &[
        ("p", PARAGRAPH),
        ("ul", UNORDERED_LIST),
        ("li", LIST_ITEM),
        ("h1", HEADING_PRIMARY),
        ("h2", HEADING_SECONDARY),
        ("h3", HEADING_SECONDARY),
        ("h4", HEADING_SECONDARY),
        ("h5", HEADING_SECONDARY),
        ("h6", HEADING_SECONDARY),
        ("table", TABLE),
    ],
};

impl StyleRegistry {
    /// Process wide registry used by the default renderer.
    pub fn standard() -> &'static StyleRegistry {
        &STANDARD
    }

    /// Returns the rule for `tag`, or None for unregistered kinds.
    pub fn lookup(&self, tag: &str) -> Option<&StyleRule> {
        self.rules
            .iter()
            .find(|(kind, _)| kind.eq_ignore_ascii_case(tag))
            .map(|(_, rule)| rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_tiers() {
        // Arrange
        let registry = StyleRegistry::standard();

        // Act
        let h1 = registry.lookup("h1").expect("h1 registered");
        let h2 = registry.lookup("h2").expect("h2 registered");
        let h5 = registry.lookup("h5").expect("h5 registered");

        // Assert
        assert_ne!(h1, h2, "Level 1 must use its own tier");
        assert_eq!(h2, h5, "Levels 2 to 6 share a tier");
        assert!(h1.classes().contains(&"text-left"));
        assert!(h2.classes().contains(&"text-center"));
    }

    #[test]
    fn test_spacing_rules() {
        let registry = StyleRegistry::standard();
        assert_eq!(registry.lookup("ul").map(|r| r.classes()), Some(&["my-2"][..]));
        assert_eq!(registry.lookup("li").map(|r| r.classes()), Some(&["my-1"][..]));
        assert!(
            registry
                .lookup("p")
                .is_some_and(|r| r.classes().contains(&"my-2"))
        );
    }

    #[test]
    fn test_unregistered_kind_has_no_rule() {
        let registry = StyleRegistry::standard();
        assert!(registry.lookup("div").is_none());
        assert!(registry.lookup("blockquote").is_none());
    }

    #[test]
    fn test_table_wrapper() {
        let rule = StyleRegistry::standard()
            .lookup("table")
            .expect("table registered");
        let wrapper = rule.wrapper().expect("table has wrapper");
        assert_eq!(wrapper.tag, "div");
        assert!(rule.classes().is_empty());
    }
}
