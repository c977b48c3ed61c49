use std::sync::LazyLock;

use regex::Regex;

use super::normalize::collapse_whitespace;

static STRAIGHT_QUOTE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"]+)""#).expect("valid straight quote regex"));
static TYPOGRAPHIC_QUOTE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("\u{201c}([^\u{201d}]+)\u{201d}").expect("valid typographic quote regex"));

fn is_quote_char(c: char) -> bool {
    matches!(c, '"' | '\u{201c}' | '\u{201d}')
}

/// Every double-quoted substring of `segment` (straight or typographic),
/// whitespace-normalized, empties dropped, duplicates removed, ordered by
/// where each quote opens.
pub fn extract_quoted(segment: &str) -> Vec<String> {
    let mut found: Vec<(usize, String)> = [&*STRAIGHT_QUOTE_RE, &*TYPOGRAPHIC_QUOTE_RE]
        .into_iter()
        .flat_map(|re| re.captures_iter(segment))
        .filter_map(|caps| {
            let inner = caps.get(1)?;
            Some((inner.start(), collapse_whitespace(inner.as_str())))
        })
        .filter(|(_, text)| !text.is_empty())
        .collect();
    found.sort_by_key(|(start, _)| *start);

    let mut quotes: Vec<String> = Vec::with_capacity(found.len());
    for (_, text) in found {
        if !quotes.contains(&text) {
            quotes.push(text);
        }
    }
    quotes
}

/// Fragments a segment contributes: its quotes, or else the whole segment
/// with quote marks stripped. An all-blank segment contributes nothing.
pub fn segment_fragments(segment: &str) -> Vec<String> {
    let quoted = extract_quoted(segment);
    if !quoted.is_empty() {
        return quoted;
    }
    let stripped: String = segment.chars().filter(|c| !is_quote_char(*c)).collect();
    let whole = collapse_whitespace(&stripped);
    if whole.is_empty() {
        Vec::new()
    } else {
        vec![whole]
    }
}
