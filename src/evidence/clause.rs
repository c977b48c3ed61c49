//! Clause/section number heuristics used as resolution hints and as a
//! placeholder page while the real anchor is unknown.

use std::sync::LazyLock;

use regex::Regex;

/// Upper bound of the page guessed from a clause number.
pub const FALLBACK_PAGE_MAX: u32 = 120;

static CLAUSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?-u:\b)Clause\s+([0-9]{1,3}(?:\.[0-9]+){0,2})(?-u:\b)").expect("valid clause regex")
});
static SECTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?-u:\b)Section\s+([0-9]{1,3}(?:\.[0-9]+){1,3})(?:\([a-z]\))?")
        .expect("valid section regex")
});
static PAGE_HINT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:Clause\s*)?([0-9]{1,3})(?:\.[0-9]+)?").expect("valid page hint regex")
});

/// Derive a clause keyword from evidence text.
///
/// First match wins: `Clause N[.n[.n]]`, then `Section N.n[.n[.n]][(x)]`,
/// then a bare `N.n[.n]` token standing on its own.
pub fn clause_keyword(text: &str) -> Option<String> {
    if let Some(caps) = CLAUSE_RE.captures(text) {
        return caps.get(1).map(|m| m.as_str().to_string());
    }
    if let Some(caps) = SECTION_RE.captures(text) {
        return caps.get(1).map(|m| m.as_str().to_string());
    }
    bare_numeric_token(text).map(str::to_string)
}

/// Guess a page from the first clause-like number, clamped to
/// `1..=FALLBACK_PAGE_MAX`. Defaults to page 1.
pub fn estimate_page(text: &str) -> u32 {
    PAGE_HINT_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .map(|page| page.clamp(1, FALLBACK_PAGE_MAX))
        .unwrap_or(1)
}

fn opens_token(c: char) -> bool {
    c.is_whitespace() || matches!(c, '"' | '\'' | '(')
}

/// First `N.n[.n]` token (N of 1-3 digits) at the start of the text or after
/// whitespace or one of `"'(`, not directly followed by a digit or hyphen.
fn bare_numeric_token(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    for (start, _) in text.char_indices() {
        let opens = start == 0
            || text[..start]
                .chars()
                .next_back()
                .is_some_and(opens_token);
        if !opens {
            continue;
        }
        if let Some(end) = numeric_token_end(bytes, start) {
            return Some(&text[start..end]);
        }
    }
    None
}

fn digit_run(bytes: &[u8], from: usize) -> usize {
    bytes
        .get(from..)
        .map(|rest| rest.iter().take_while(|b| b.is_ascii_digit()).count())
        .unwrap_or(0)
}

fn ends_cleanly(bytes: &[u8], end: usize) -> bool {
    !matches!(bytes.get(end), Some(b) if b.is_ascii_digit() || *b == b'-')
}

/// Longest acceptable token at `start`, trying shorter readings when the
/// longest one runs into a digit or hyphen.
fn numeric_token_end(bytes: &[u8], start: usize) -> Option<usize> {
    let lead = digit_run(bytes, start).min(3);
    for lead_len in (1..=lead).rev() {
        let first_dot = start + lead_len;
        if bytes.get(first_dot) != Some(&b'.') {
            continue;
        }
        let first_group = digit_run(bytes, first_dot + 1);
        for first_len in (1..=first_group).rev() {
            let first_end = first_dot + 1 + first_len;
            if bytes.get(first_end) == Some(&b'.') {
                let second_group = digit_run(bytes, first_end + 1);
                for second_len in (1..=second_group).rev() {
                    let second_end = first_end + 1 + second_len;
                    if ends_cleanly(bytes, second_end) {
                        return Some(second_end);
                    }
                }
            }
            if ends_cleanly(bytes, first_end) {
                return Some(first_end);
            }
        }
    }
    None
}
