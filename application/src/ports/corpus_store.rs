//! Corpus store port.
//!
//! Every read and write is namespaced by project id; that namespace is the
//! only isolation between concurrently running sessions for different
//! projects. Each `write` call must be one complete, independently
//! consumable unit - the hosting runtime may hard-kill a session between
//! iterations.

use async_trait::async_trait;
use gatherline_domain::{AutomationMetadata, CandidateItem, GatherItem, ProjectId};
use thiserror::Error;

/// Errors from the corpus store. Always fatal to the session.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage I/O error: {0}")]
    Io(String),

    #[error("Storage serialization error: {0}")]
    Serialization(String),
}

/// Persisted gather item storage.
#[async_trait]
pub trait CorpusStore: Send + Sync {
    /// Read the full corpus for a project.
    async fn read(&self, project: &ProjectId) -> Result<Vec<GatherItem>, StoreError>;

    /// Persist a batch of surviving candidates, attaching the automation
    /// metadata, and return the stored items with their assigned ids.
    async fn write(
        &self,
        project: &ProjectId,
        items: &[CandidateItem],
        metadata: &AutomationMetadata,
    ) -> Result<Vec<GatherItem>, StoreError>;
}
