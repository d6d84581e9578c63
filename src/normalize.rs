use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;

// Permitted characters once a query is normalized: ASCII alphanumerics and single spaces.
static RE_ALLOWED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9 ]+$").unwrap()
});

/// Trim, collapse whitespace runs to one space, lowercase.
///
/// Idempotent: `normalize_query(&normalize_query(s)) == normalize_query(s)`.
pub fn normalize_query(raw: &str) -> String {
    raw.split_whitespace().join(" ").to_lowercase()
}

/// Accept/reject decision applied to an already normalized query.
pub fn is_acceptable_query(normalized: &str, min_chars: usize) -> bool {
    if normalized.is_empty() { return false; }
    if normalized.chars().count() < min_chars { return false; }
    RE_ALLOWED.is_match(normalized)
}

/// Normalize then filter; `None` when the query must not be counted.
pub fn clean_query(raw: &str, min_chars: usize) -> Option<String> {
    let normalized = normalize_query(raw);
    if is_acceptable_query(&normalized, min_chars) {
        Some(normalized)
    } else {
        None
    }
}
