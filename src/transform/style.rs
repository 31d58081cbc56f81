//! Style tokens and their prompt tables.

/// Style offered by default.
pub const DEFAULT_STYLE: &str = "artistic";

/// Styles offered for selection, as `(token, display name)` pairs.
pub const STYLES: &[(&str, &str)] = &[
    ("artistic", "Artistic Portrait"),
    ("digital-art", "Digital Art"),
    ("oil-painting", "Oil Painting"),
    ("watercolor", "Watercolor"),
    ("sketch", "Pencil Sketch"),
    ("pop-art", "Pop Art"),
    ("abstract", "Abstract Style"),
];

/// Returns the display name of a style token, if it is in [`STYLES`].
pub fn style_name(token: &str) -> Option<&'static str> {
    STYLES
        .iter()
        .find(|(id, _)| *id == token)
        .map(|(_, name)| *name)
}

/// Static mapping from style token to a natural-language instruction.
///
/// Lookups never fail: a token without an entry resolves to the table's
/// default entry.
#[derive(Debug, Clone, Copy)]
pub struct StylePromptTable {
    entries: &'static [(&'static str, &'static str)],
    default_style: &'static str,
}

impl StylePromptTable {
    /// Creates a table. `default_style` must name one of `entries`.
    pub const fn new(
        entries: &'static [(&'static str, &'static str)],
        default_style: &'static str,
    ) -> Self {
        Self {
            entries,
            default_style,
        }
    }

    /// Returns the prompt for `style`, or the default prompt on a miss.
    pub fn prompt_for(&self, style: &str) -> &'static str {
        self.get(style)
            .or_else(|| self.get(self.default_style))
            .unwrap_or("")
    }

    /// Returns the prompt for `style` only if the table has an entry for it.
    pub fn get(&self, style: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(token, _)| *token == style)
            .map(|(_, prompt)| *prompt)
    }

    /// Returns the token whose prompt is used on a miss.
    pub fn default_style(&self) -> &'static str {
        self.default_style
    }

    /// Iterates over the tokens the table knows.
    pub fn tokens(&self) -> impl Iterator<Item = &'static str> {
        self.entries.iter().map(|(token, _)| *token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: StylePromptTable =
        StylePromptTable::new(&[("a", "prompt a"), ("b", "prompt b")], "b");

    #[test]
    fn test_prompt_for_known_style() {
        assert_eq!(TABLE.prompt_for("a"), "prompt a");
    }

    #[test]
    fn test_prompt_for_unknown_style_uses_default() {
        assert_eq!(TABLE.prompt_for("nope"), "prompt b");
        assert_eq!(TABLE.prompt_for(""), "prompt b");
        assert!(TABLE.get("nope").is_none());
    }

    #[test]
    fn test_style_name() {
        assert_eq!(style_name("sketch"), Some("Pencil Sketch"));
        assert_eq!(style_name("unknown"), None);
        assert!(STYLES.iter().any(|(id, _)| *id == DEFAULT_STYLE));
    }
}
