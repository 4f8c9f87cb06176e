//! Content generator port.
//!
//! The generator is an external AI collaborator invoked through this narrow
//! contract; it may legitimately return an empty batch, which ends the
//! department's inner loop.

use async_trait::async_trait;
use gatherline_domain::{CandidateItem, ContextItem, DepartmentConfig, DepartmentRunSummary};
use thiserror::Error;

/// Errors from the content generator collaborator.
#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("Generator unavailable: {0}")]
    Unavailable(String),

    #[error("Generator returned invalid output: {0}")]
    InvalidOutput(String),
}

/// Generates candidate gather items for one department.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Generate a batch of candidates.
    ///
    /// `context` is the assembled generation context (current corpus plus
    /// graph snapshots); `cascade` is the ordered list of every previously
    /// completed department's run summary.
    async fn generate(
        &self,
        department: &DepartmentConfig,
        context: &[ContextItem],
        cascade: &[DepartmentRunSummary],
        model: &str,
    ) -> Result<Vec<CandidateItem>, GeneratorError>;
}
