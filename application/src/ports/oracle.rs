//! Similarity and scoring oracle ports.
//!
//! Both oracles are best-effort collaborators: when one is unavailable or
//! returns an unparsable score, the consuming engine falls back to its
//! internal heuristic rather than failing the caller.

use async_trait::async_trait;
use gatherline_domain::{DepartmentConfig, GatherItem, QualityRubric};
use thiserror::Error;

/// Errors from an oracle collaborator.
#[derive(Error, Debug)]
pub enum OracleError {
    #[error("Oracle unavailable: {0}")]
    Unavailable(String),

    #[error("Unparsable oracle reply: {0}")]
    Unparsable(String),
}

/// Scores semantic similarity between two texts.
#[async_trait]
pub trait SimilarityOracle: Send + Sync {
    /// Returns a similarity score in [0.0, 1.0].
    async fn score(&self, a: &str, b: &str) -> Result<f32, OracleError>;
}

/// Scores the readiness of a department's corpus.
#[async_trait]
pub trait ScoringOracle: Send + Sync {
    /// Returns a quality score in [0, 100] for the department-filtered
    /// corpus, judged against the weighted rubric.
    async fn score_department(
        &self,
        department: &DepartmentConfig,
        items: &[GatherItem],
        rubric: &QualityRubric,
    ) -> Result<f32, OracleError>;
}
