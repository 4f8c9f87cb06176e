//! Downstream evaluation trigger port.

use async_trait::async_trait;
use gatherline_domain::ProjectId;

/// Fire-and-forget trigger for downstream department evaluation.
///
/// Failure is absorbed by the adapter and reported as `false`; the
/// orchestrator only logs it.
#[async_trait]
pub trait EvaluationTrigger: Send + Sync {
    async fn trigger(&self, project: &ProjectId, department_number: u32) -> bool;
}
