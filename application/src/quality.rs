//! Department quality scoring.
//!
//! Delegates to the scoring oracle with the weighted rubric; when the oracle
//! is unavailable or unparsable, falls back to the size/length/summary
//! heuristic. An empty department corpus always scores 0.

use crate::ports::oracle::ScoringOracle;
use gatherline_domain::quality::clamp_score;
use gatherline_domain::{DepartmentConfig, GatherItem, QualityRubric, heuristic_quality_score};
use std::sync::Arc;
use tracing::{debug, warn};

/// Computes the readiness score of one department's corpus.
pub struct QualityScorer {
    oracle: Arc<dyn ScoringOracle>,
    rubric: QualityRubric,
}

impl QualityScorer {
    pub fn new(oracle: Arc<dyn ScoringOracle>) -> Self {
        Self {
            oracle,
            rubric: QualityRubric::default(),
        }
    }

    pub fn with_rubric(mut self, rubric: QualityRubric) -> Self {
        self.rubric = rubric;
        self
    }

    /// Score `items`, which must already be filtered to `department`.
    pub async fn score(&self, department: &DepartmentConfig, items: &[GatherItem]) -> f32 {
        if items.is_empty() {
            debug!(department = %department.slug, "No items for department, score is 0");
            return 0.0;
        }

        match self
            .oracle
            .score_department(department, items, &self.rubric)
            .await
        {
            Ok(score) => {
                let score = clamp_score(score);
                debug!(
                    department = %department.slug,
                    quality_score = score,
                    items_count = items.len(),
                    "Quality analysis complete"
                );
                score
            }
            Err(e) => {
                warn!(
                    department = %department.slug,
                    error = %e,
                    "Scoring oracle failed, using heuristic quality score"
                );
                heuristic_quality_score(items)
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

    struct FixedScoring(f32);

    #[async_trait]
    impl ScoringOracle for FixedScoring {
        async fn score_department(
            &self,
            _department: &DepartmentConfig,
            _items: &[GatherItem],
            _rubric: &QualityRubric,
        ) -> Result<f32, OracleError> {
            Ok(self.0)
        }
    }

    struct FailingScoring;

    #[async_trait]
    impl ScoringOracle for FailingScoring {
        async fn score_department(
            &self,
            _department: &DepartmentConfig,
            _items: &[GatherItem],
            _rubric: &QualityRubric,
        ) -> Result<f32, OracleError> {
            Err(OracleError::Unparsable("eighty five".to_string()))
        }
    }

    fn dept() -> DepartmentConfig {
        DepartmentConfig {
            id: "d".to_string(),
            slug: "story".to_string(),
            name: "Story".to_string(),
            description: String::new(),
            number: 1,
            active: true,
            automation_enabled: true,
            quality_threshold: None,
            model: None,
        }
    }

    fn item() -> GatherItem {
        GatherItem {
            id: "i".to_string(),
            content: "x".repeat(100),
            summary: "s".to_string(),
            context: String::new(),
            media_refs: Vec::new(),
            automation_metadata: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn empty_corpus_scores_zero_without_oracle() {
        let scorer = QualityScorer::new(Arc::new(FixedScoring(95.0)));
        assert_eq!(scorer.score(&dept(), &[]).await, 0.0);
    }

    #[tokio::test]
    async fn oracle_score_is_clamped() {
        let scorer = QualityScorer::new(Arc::new(FixedScoring(130.0)));
        assert_eq!(scorer.score(&dept(), &[item()]).await, 100.0);

        let scorer = QualityScorer::new(Arc::new(FixedScoring(-4.0)));
        assert_eq!(scorer.score(&dept(), &[item()]).await, 0.0);
    }

    #[tokio::test]
    async fn oracle_failure_uses_heuristic() {
        let scorer = QualityScorer::new(Arc::new(FailingScoring));
        let items = vec![item()];
        let expected = heuristic_quality_score(&items);
        assert_eq!(scorer.score(&dept(), &items).await, expected);
    }
}
