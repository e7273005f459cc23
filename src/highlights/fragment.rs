pub const HIGHLIGHT_FRAGMENT_PREFIX: &str = "highlight-";

/// Splits `body#fragment` into its parts. The fragment never belongs in a
/// fetch URL, whatever it carries.
pub fn split_fragment(input: &str) -> (&str, Option<&str>) {
    match input.split_once('#') {
        Some((body, fragment)) => (body, Some(fragment)),
        None => (input, None),
    }
}

/// Extracts the highlight id from a `highlight-<id>` fragment, with or
/// without the leading `#`. Fragments without the prefix are not targets.
pub fn parse_highlight_fragment(fragment: &str) -> Option<&str> {
    let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
    let id = fragment.strip_prefix(HIGHLIGHT_FRAGMENT_PREFIX)?;
    if id.is_empty() { None } else { Some(id) }
}

/// The shareable deep-link form of a highlight id.
pub fn format_highlight_fragment(id: &str) -> String {
    format!("#{HIGHLIGHT_FRAGMENT_PREFIX}{id}")
}

#[cfg(test)]
mod tests {
    use super::{format_highlight_fragment, parse_highlight_fragment, split_fragment};

    #[test]
    fn split_separates_body_and_fragment() {
        assert_eq!(
            split_fragment("https://a.com/x.pdf#highlight-1"),
            ("https://a.com/x.pdf", Some("highlight-1"))
        );
        assert_eq!(split_fragment("https://a.com/x.pdf"), ("https://a.com/x.pdf", None));
    }

    #[test]
    fn parse_accepts_only_prefixed_fragments() {
        assert_eq!(parse_highlight_fragment("highlight-abc"), Some("abc"));
        assert_eq!(parse_highlight_fragment("#highlight-abc"), Some("abc"));
        assert_eq!(parse_highlight_fragment("page=3"), None);
        assert_eq!(parse_highlight_fragment("highlight-"), None);
    }

    #[test]
    fn format_round_trips_through_parse() {
        let fragment = format_highlight_fragment("abc123");
        assert_eq!(fragment, "#highlight-abc123");
        assert_eq!(parse_highlight_fragment(&fragment), Some("abc123"));
    }
}
