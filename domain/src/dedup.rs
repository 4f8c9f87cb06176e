//! Pure deduplication primitives: content normalization, fingerprints and
//! the token-set fallback similarity.
//!
//! The async engine that drives these against the similarity oracle lives
//! in the application layer; everything here is deterministic and
//! side-effect free.

use sha2::{Digest, Sha256};
use std::collections::HashSet;

/// Normalize content for exact-duplicate comparison.
///
/// Lowercases, collapses every whitespace run to a single space, and trims.
/// Two strings differing only in case or whitespace run-length normalize to
/// the same value.
pub fn normalize_content(content: &str) -> String {
    content
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Stable fingerprint of normalized content (hex-encoded SHA-256).
pub fn content_fingerprint(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize_content(content).as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Token-set Jaccard similarity, used when the similarity oracle is
/// unavailable or returns an unparsable score.
///
/// Case-folds and whitespace-tokenizes both texts into word sets. If either
/// set is empty the similarity is 0.0.
pub fn jaccard_similarity(a: &str, b: &str) -> f32 {
    let set_a: HashSet<String> = a.to_lowercase().split_whitespace().map(String::from).collect();
    let set_b: HashSet<String> = b.to_lowercase().split_whitespace().map(String::from).collect();

    if set_a.is_empty() || set_b.is_empty() {
        return 0.0;
    }

    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();
    intersection as f32 / union as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_collapses_case_and_whitespace() {
        assert_eq!(normalize_content("The quick  BROWN\tfox"), "the quick brown fox");
        assert_eq!(normalize_content("  leading and trailing  "), "leading and trailing");
        assert_eq!(normalize_content("a\n\nb"), "a b");
    }

    #[test]
    fn fingerprints_equal_for_case_and_whitespace_variants() {
        assert_eq!(
            content_fingerprint("The quick brown fox."),
            content_fingerprint("the   quick BROWN fox.")
        );
    }

    #[test]
    fn fingerprints_differ_for_different_content() {
        assert_ne!(
            content_fingerprint("The quick brown fox."),
            content_fingerprint("The slow brown fox.")
        );
    }

    #[test]
    fn fingerprint_is_hex_sha256() {
        let fp = content_fingerprint("anything");
        assert_eq!(fp.len(), 64);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn jaccard_is_symmetric() {
        let cases = [
            ("the quick brown fox", "a quick red fox"),
            ("", "nonempty"),
            ("same words here", "same words here"),
            ("one", "two three four"),
        ];
        for (a, b) in cases {
            assert_eq!(jaccard_similarity(a, b), jaccard_similarity(b, a));
        }
    }

    #[test]
    fn jaccard_identical_texts_is_one() {
        assert_eq!(jaccard_similarity("alpha beta gamma", "alpha beta gamma"), 1.0);
        // case-insensitive
        assert_eq!(jaccard_similarity("Alpha Beta", "alpha beta"), 1.0);
    }

    #[test]
    fn jaccard_empty_side_is_zero() {
        assert_eq!(jaccard_similarity("", "words here"), 0.0);
        assert_eq!(jaccard_similarity("words here", ""), 0.0);
        assert_eq!(jaccard_similarity("", ""), 0.0);
        assert_eq!(jaccard_similarity("   ", "words"), 0.0);
    }

    #[test]
    fn jaccard_partial_overlap() {
        // {a, b} vs {b, c}: intersection 1, union 3
        let sim = jaccard_similarity("a b", "b c");
        assert!((sim - 1.0 / 3.0).abs() < f32::EPSILON);
    }
}
