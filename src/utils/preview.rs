//! Log-safe text previews
//!
//! User text is only ever logged through [`preview`]: the head of the
//! string, cut on a character boundary, with newlines flattened.

/// First `max_chars` characters of `text` on one line, with a count of what
/// was dropped.
pub fn preview(text: &str, max_chars: usize) -> String {
    let flat: String = text
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    let flat = flat.trim();
    let total = flat.chars().count();

    if total <= max_chars {
        return flat.to_string();
    }

    let head: String = flat.chars().take(max_chars).collect();
    format!("{}... [{} more chars]", head.trim_end(), total - max_chars)
}
