//! Quality rubric and the heuristic fallback score.

use crate::gather::GatherItem;
use serde::{Deserialize, Serialize};

/// Weighted rubric handed to the scoring oracle, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityRubric {
    pub coverage: u8,
    pub depth: u8,
    pub relevance: u8,
    pub quality: u8,
}

impl Default for QualityRubric {
    fn default() -> Self {
        Self {
            coverage: 30,
            depth: 25,
            relevance: 25,
            quality: 20,
        }
    }
}

/// Heuristic department score used when the scoring oracle is unavailable.
///
/// `50 + min(n*2, 20) + min(avg_content_len/50, 20) + frac_with_summary*10`,
/// clamped to 100. An empty slice scores 0.
pub fn heuristic_quality_score(items: &[GatherItem]) -> f32 {
    if items.is_empty() {
        return 0.0;
    }

    let base = 50.0;
    let item_bonus = ((items.len() * 2) as f32).min(20.0);

    let avg_length =
        items.iter().map(|i| i.content.len()).sum::<usize>() as f32 / items.len() as f32;
    let length_bonus = (avg_length / 50.0).min(20.0);

    let with_summary = items.iter().filter(|i| !i.summary.is_empty()).count();
    let summary_bonus = with_summary as f32 / items.len() as f32 * 10.0;

    (base + item_bonus + length_bonus + summary_bonus).min(100.0)
}

/// Clamp an oracle-reported score into the valid [0, 100] range.
pub fn clamp_score(score: f32) -> f32 {
    score.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn item(content_len: usize, summary: &str) -> GatherItem {
        GatherItem {
            id: "i".to_string(),
            content: "x".repeat(content_len),
            summary: summary.to_string(),
            context: String::new(),
            media_refs: Vec::new(),
            automation_metadata: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn empty_corpus_scores_zero() {
        assert_eq!(heuristic_quality_score(&[]), 0.0);
    }

    #[test]
    fn single_short_item_without_summary() {
        // 50 base + 2 item bonus + 100/50=2 length bonus + 0 summary
        let items = vec![item(100, "")];
        assert!((heuristic_quality_score(&items) - 54.0).abs() < 0.001);
    }

    #[test]
    fn item_bonus_caps_at_20() {
        // 30 items of zero-length content, all with summaries:
        // 50 + 20 (capped) + 0 + 10 = 80
        let items: Vec<_> = (0..30).map(|_| item(0, "s")).collect();
        assert!((heuristic_quality_score(&items) - 80.0).abs() < 0.001);
    }

    #[test]
    fn length_bonus_caps_at_20() {
        // One 10_000-char item with summary: 50 + 2 + 20 (capped) + 10 = 82
        let items = vec![item(10_000, "s")];
        assert!((heuristic_quality_score(&items) - 82.0).abs() < 0.001);
    }

    #[test]
    fn score_never_exceeds_100() {
        let items: Vec<_> = (0..50).map(|_| item(10_000, "s")).collect();
        assert!(heuristic_quality_score(&items) <= 100.0);
    }

    #[test]
    fn clamp_score_bounds() {
        assert_eq!(clamp_score(-5.0), 0.0);
        assert_eq!(clamp_score(42.5), 42.5);
        assert_eq!(clamp_score(150.0), 100.0);
    }

    #[test]
    fn default_rubric_weights() {
        let rubric = QualityRubric::default();
        assert_eq!(
            rubric.coverage + rubric.depth + rubric.relevance + rubric.quality,
            100
        );
        assert_eq!(rubric.coverage, 30);
    }
}
