use once_cell::sync::Lazy;
use regex::Regex;

/// Longest description carried on an aggregated item, in characters.
pub const SHORT_DESCRIPTION_CHARS: usize = 100;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("static tag regex"));

/// Remove every `<...>` run from `text`. An unterminated `<` is kept as-is.
pub fn strip_tags(text: &str) -> String {
    TAG_RE.replace_all(text, "").into_owned()
}

/// Keep at most `max_chars` characters (not bytes) of `text`.
pub fn cap_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

/// Feed description -> plain, trimmed, length-capped text.
pub fn short_description(raw: &str) -> String {
    let stripped = strip_tags(raw);
    cap_chars(stripped.trim(), SHORT_DESCRIPTION_CHARS)
}
