//! Token-set string similarity.
//!
//! Both strings are lowercased and reduced to alphanumeric tokens. The
//! shared tokens and each side's leftovers are joined into three sorted
//! strings, and the best pairwise edit-distance ratio among them is the
//! score. Word order and repeated words therefore do not matter, and a
//! string whose tokens are a subset of the other's scores 1.0.

use std::collections::BTreeSet;

/// Lowercase, replace everything but letters and digits with spaces, and
/// collapse runs of whitespace.
pub fn normalize_text(s: &str) -> String {
    let mapped: String = s
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Sorted, de-duplicated tokens of a string.
pub fn tokenize(s: &str) -> BTreeSet<String> {
    normalize_text(s)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Whether two titles are equal after normalization.
pub fn same_title(a: &str, b: &str) -> bool {
    let a = normalize_text(a);
    !a.is_empty() && a == normalize_text(b)
}

/// Token-set similarity in `[0, 1]`.
///
/// Returns 0.0 when either side has no tokens.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let tokens_a = tokenize(a);
    let tokens_b = tokenize(b);
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let intersection = join(tokens_a.intersection(&tokens_b));
    let only_a = join(tokens_a.difference(&tokens_b));
    let only_b = join(tokens_b.difference(&tokens_a));

    let combined_a = concat(&intersection, &only_a);
    let combined_b = concat(&intersection, &only_b);

    let mut best = ratio(&combined_a, &combined_b);
    if !intersection.is_empty() {
        best = best
            .max(ratio(&intersection, &combined_a))
            .max(ratio(&intersection, &combined_b));
    }
    best.clamp(0.0, 1.0)
}

fn join<'a>(tokens: impl Iterator<Item = &'a String>) -> String {
    tokens.map(String::as_str).collect::<Vec<_>>().join(" ")
}

fn concat(head: &str, tail: &str) -> String {
    match (head.is_empty(), tail.is_empty()) {
        (true, _) => tail.to_string(),
        (_, true) => head.to_string(),
        _ => format!("{} {}", head, tail),
    }
}

fn ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    strsim::normalized_levenshtein(a, b)
}
