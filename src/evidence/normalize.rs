/// Quotes shown in the workspace are cut to this many characters.
pub const QUOTE_MAX_CHARS: usize = 380;

/// Reference previews in the evidence list are cut to this many characters.
pub const REFERENCE_PREVIEW_CHARS: usize = 120;

/// Collapse every whitespace run to a single space and trim both ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Shorten `text` to `limit` characters for display, marking the cut with `...`.
pub fn truncate_for_display(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let head: String = text.chars().take(limit).collect();
    format!("{}...", head.trim_end())
}

/// Whitespace-normalized quote, hard-cut at [`QUOTE_MAX_CHARS`].
pub fn normalize_quote(text: &str) -> String {
    collapse_whitespace(text).chars().take(QUOTE_MAX_CHARS).collect()
}
