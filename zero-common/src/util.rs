//! Utility functions for the Zero screening tools.

/// Left-align `s` in a field of `width` characters.
///
/// Counts characters rather than bytes and never truncates, so over-long
/// values push the rest of the line right.
pub fn pad_right(s: &str, width: usize) -> String {
    format!("{:<width$}", s, width = width)
}

/// Format a float with two decimals, left-aligned in `width` characters.
pub fn pad_decimal(value: f64, width: usize) -> String {
    format!("{:<width$.2}", value, width = width)
}

/// Join up to `limit` items, appending "..." when more exist.
pub fn join_limited<S: AsRef<str>>(items: &[S], limit: usize, sep: &str) -> String {
    let shown: Vec<&str> = items.iter().take(limit).map(AsRef::as_ref).collect();
    let mut joined = shown.join(sep);
    if items.len() > limit {
        joined.push_str("...");
    }
    joined
}
