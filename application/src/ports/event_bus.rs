//! Progress event bus port.

use async_trait::async_trait;
use gatherline_domain::{ProgressEvent, ProjectId};

/// Publishes progress events for external observers.
///
/// Publishing is best-effort: adapters absorb and log their own failures,
/// a lost event never aborts the session.
#[async_trait]
pub trait ProgressPublisher: Send + Sync {
    async fn publish(&self, project: &ProjectId, event: ProgressEvent);
}

/// No-op publisher for when progress reporting is not needed.
pub struct NoProgressPublisher;

#[async_trait]
impl ProgressPublisher for NoProgressPublisher {
    async fn publish(&self, _project: &ProjectId, _event: ProgressEvent) {}
}
