//! Character-budget helpers.
//!
//! All budgets count `char`s, never bytes, so slicing stays on UTF-8
//! boundaries.

/// Truncate `text` to at most `max_chars` characters, appending a marker with
/// the number of characters dropped.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    let total = text.chars().count();
    if total <= max_chars {
        return text.to_string();
    }
    let byte_offset = text
        .char_indices()
        .nth(max_chars)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    format!("{}…[+{} chars]", &text[..byte_offset], total - max_chars)
}

/// Collapse whitespace runs and cap length; used for memory snippets.
pub fn snippet(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_chars(&collapsed, max_chars)
}
