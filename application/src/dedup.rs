//! Two-stage deduplication engine.
//!
//! Stage 1 catches exact duplicates by comparing fingerprints of normalized
//! content. Stage 2 asks the similarity oracle; a candidate is a duplicate
//! iff similarity is strictly greater than 0.90 against the *first* existing
//! item that exceeds the threshold - no best-match search. The existing
//! corpus is only read, never mutated; surviving candidates keep their
//! original order.

use crate::ports::oracle::SimilarityOracle;
use gatherline_domain::{
    CandidateItem, GatherItem, content_fingerprint, jaccard_similarity, preview, truncate_chars,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A candidate is a duplicate iff similarity is strictly greater than this.
pub const SIMILARITY_THRESHOLD: f32 = 0.90;

/// Each side of a semantic comparison is capped at this many characters.
const COMPARE_CHAR_LIMIT: usize = 500;

/// Filters freshly generated candidates against the department's existing
/// corpus.
pub struct DedupEngine {
    oracle: Arc<dyn SimilarityOracle>,
}

impl DedupEngine {
    pub fn new(oracle: Arc<dyn SimilarityOracle>) -> Self {
        Self { oracle }
    }

    /// Return the non-duplicate subset of `candidates`, order preserved.
    ///
    /// `existing` must already be filtered to the active department.
    pub async fn deduplicate(
        &self,
        candidates: Vec<CandidateItem>,
        existing: &[GatherItem],
    ) -> Vec<CandidateItem> {
        if candidates.is_empty() || existing.is_empty() {
            return candidates;
        }

        let existing_fingerprints: Vec<String> = existing
            .iter()
            .map(|item| content_fingerprint(&item.content))
            .collect();

        let original_count = candidates.len();
        let mut kept = Vec::with_capacity(candidates.len());

        'candidates: for candidate in candidates {
            let fingerprint = content_fingerprint(&candidate.content);

            for (index, existing_item) in existing.iter().enumerate() {
                // Stage 1: exact match short-circuits the semantic check
                if fingerprint == existing_fingerprints[index] {
                    info!(
                        summary = %preview(&candidate.summary, 50),
                        "Found exact duplicate (fingerprint match)"
                    );
                    continue 'candidates;
                }

                // Stage 2: first existing item over the threshold wins
                let similarity = self
                    .similarity(&candidate.content, &existing_item.content)
                    .await;
                if similarity > SIMILARITY_THRESHOLD {
                    info!(
                        similarity,
                        summary = %preview(&candidate.summary, 50),
                        existing = %preview(&existing_item.summary, 50),
                        "Found semantic duplicate"
                    );
                    continue 'candidates;
                }
            }

            kept.push(candidate);
        }

        debug!(
            original_count,
            deduplicated_count = kept.len(),
            duplicates_removed = original_count - kept.len(),
            "Deduplication complete"
        );

        kept
    }

    /// Oracle similarity over 500-char prefixes, falling back to Jaccard
    /// over the full texts when the oracle fails.
    async fn similarity(&self, a: &str, b: &str) -> f32 {
        let truncated_a = truncate_chars(a, COMPARE_CHAR_LIMIT);
        let truncated_b = truncate_chars(b, COMPARE_CHAR_LIMIT);

        match self.oracle.score(truncated_a, truncated_b).await {
            Ok(score) => score,
            Err(e) => {
                warn!(error = %e, "Similarity oracle failed, using fallback similarity");
                jaccard_similarity(a, b)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::oracle::OracleError;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedOracle {
        score: f32,
        calls: AtomicUsize,
    }

    impl FixedOracle {
        fn new(score: f32) -> Self {
            Self {
                score,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SimilarityOracle for FixedOracle {
        async fn score(&self, _a: &str, _b: &str) -> Result<f32, OracleError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.score)
        }
    }

    struct FailingOracle;

    #[async_trait]
    impl SimilarityOracle for FailingOracle {
        async fn score(&self, _a: &str, _b: &str) -> Result<f32, OracleError> {
            Err(OracleError::Unavailable("offline".to_string()))
        }
    }

    fn existing(content: &str) -> GatherItem {
        GatherItem {
            id: "e1".to_string(),
            content: content.to_string(),
            summary: "existing".to_string(),
            context: String::new(),
            media_refs: Vec::new(),
            automation_metadata: None,
            created_at: Utc::now(),
        }
    }

    fn candidate(content: &str) -> CandidateItem {
        CandidateItem::new(content, "candidate")
    }

    #[tokio::test]
    async fn empty_existing_passes_everything_through() {
        let engine = DedupEngine::new(Arc::new(FixedOracle::new(1.0)));
        let candidates = vec![candidate("a"), candidate("b")];
        let result = engine.deduplicate(candidates.clone(), &[]).await;
        assert_eq!(result, candidates);
    }

    #[tokio::test]
    async fn exact_duplicate_skips_semantic_stage() {
        let oracle = Arc::new(FixedOracle::new(0.0));
        let engine = DedupEngine::new(Arc::clone(&oracle) as Arc<dyn SimilarityOracle>);
        let corpus = vec![existing("The quick brown fox.")];

        let result = engine
            .deduplicate(vec![candidate("the   quick BROWN fox.")], &corpus)
            .await;

        assert!(result.is_empty());
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn threshold_is_strictly_greater_than() {
        let corpus = vec![existing("existing content here")];

        let engine = DedupEngine::new(Arc::new(FixedOracle::new(0.90)));
        let at_threshold = engine
            .deduplicate(vec![candidate("new content")], &corpus)
            .await;
        assert_eq!(at_threshold.len(), 1, "exactly 0.90 is not a duplicate");

        let engine = DedupEngine::new(Arc::new(FixedOracle::new(0.901)));
        let over_threshold = engine
            .deduplicate(vec![candidate("new content")], &corpus)
            .await;
        assert!(over_threshold.is_empty(), "0.901 is a duplicate");
    }

    #[tokio::test]
    async fn first_exceedance_stops_comparisons_for_candidate() {
        let oracle = Arc::new(FixedOracle::new(0.95));
        let engine = DedupEngine::new(Arc::clone(&oracle) as Arc<dyn SimilarityOracle>);
        let corpus = vec![existing("one"), existing("two"), existing("three")];

        let result = engine.deduplicate(vec![candidate("anything")], &corpus).await;

        assert!(result.is_empty());
        // Only the first existing item was consulted
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn order_preserved_and_existing_untouched() {
        let engine = DedupEngine::new(Arc::new(FixedOracle::new(0.0)));
        let corpus = vec![existing("alpha"), existing("beta")];
        let before = corpus.clone();

        let candidates = vec![candidate("one"), candidate("alpha"), candidate("two")];
        let result = engine.deduplicate(candidates, &corpus).await;

        let contents: Vec<_> = result.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, ["one", "two"]);
        assert_eq!(corpus, before);
    }

    #[tokio::test]
    async fn oracle_failure_falls_back_to_jaccard() {
        let engine = DedupEngine::new(Arc::new(FailingOracle));
        let corpus = vec![existing("the quick brown fox jumps over the lazy dog")];

        // Identical token set: Jaccard = 1.0 > 0.90 -> duplicate
        let dup = engine
            .deduplicate(
                vec![candidate("dog lazy the over jumps fox brown quick the")],
                &corpus,
            )
            .await;
        assert!(dup.is_empty());

        // Disjoint token set: Jaccard = 0.0 -> kept
        let kept = engine
            .deduplicate(vec![candidate("completely unrelated words")], &corpus)
            .await;
        assert_eq!(kept.len(), 1);
    }
}
