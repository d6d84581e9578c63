//! Fuzzy similarity metrics on a 0-100 scale, where 100 means identical.

use itertools::Itertools;

pub trait Similarity: Send + Sync {
    fn name(&self) -> &'static str;
    fn score(&self, a: &str, b: &str) -> f64;
}

/// Normalized indel similarity after sorting each string's whitespace tokens,
/// so "ayam goreng" and "goreng ayam" score 100.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenSortRatio;

/// Normalized indel similarity on the raw strings: `200 * LCS / (len_a + len_b)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndelRatio;

/// Normalized Levenshtein similarity on token-sorted strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct LevenshteinRatio;

impl Similarity for TokenSortRatio {
    fn name(&self) -> &'static str { "token-sort" }

    fn score(&self, a: &str, b: &str) -> f64 {
        indel_ratio(&sort_tokens(a), &sort_tokens(b))
    }
}

impl Similarity for IndelRatio {
    fn name(&self) -> &'static str { "indel" }

    fn score(&self, a: &str, b: &str) -> f64 {
        indel_ratio(a, b)
    }
}

impl Similarity for LevenshteinRatio {
    fn name(&self) -> &'static str { "levenshtein" }

    fn score(&self, a: &str, b: &str) -> f64 {
        strsim::normalized_levenshtein(&sort_tokens(a), &sort_tokens(b)) * 100.0
    }
}

/// Look a metric up by its CLI name.
pub fn by_name(name: &str) -> Option<Box<dyn Similarity>> {
    match name {
        "token-sort" | "token_sort" => Some(Box::new(TokenSortRatio)),
        "indel" | "ratio" => Some(Box::new(IndelRatio)),
        "levenshtein" => Some(Box::new(LevenshteinRatio)),
        _ => None,
    }
}

pub fn sort_tokens(s: &str) -> String {
    s.split_whitespace().sorted_unstable().join(" ")
}

pub fn indel_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 { return 100.0; }
    let lcs = lcs_length(&a, &b);
    200.0 * lcs as f64 / total as f64
}

// Two-row DP over chars
fn lcs_length(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() { return 0; }
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for ca in a {
        for (j, cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}
