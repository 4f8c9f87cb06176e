//! Knowledge graph port.
//!
//! Mirrors the two failure classes of the graph client: enrichment reads
//! degrade to empty results and never abort the caller, while durable-intent
//! writes return a `Result` so the call site decides whether the failure is
//! fatal to its unit of work.

use async_trait::async_trait;
use gatherline_domain::{ContextItem, DepartmentConfig, GatherItem, ProjectId, TaskKind};
use thiserror::Error;

/// Errors from durable-intent graph operations.
#[derive(Error, Debug)]
pub enum KnowledgeGraphError {
    #[error("Graph connection failure: {0}")]
    Connection(String),

    #[error("Graph request timed out")]
    Timeout,

    #[error("Graph request failed: {0}")]
    Request(String),
}

/// Access to the knowledge-graph service.
#[async_trait]
pub trait KnowledgeGraph: Send + Sync {
    /// Project-wide semantic context snapshot. Degrades to empty.
    async fn project_context(&self, project: &ProjectId, limit: usize) -> Vec<ContextItem>;

    /// Department-specific semantic context. Degrades to empty.
    async fn department_context(&self, project: &ProjectId, department: &str) -> Vec<ContextItem>;

    /// Index persisted items into the graph. Best-effort: returns whether
    /// the items were indexed, absorbing transport failures.
    async fn index_items(
        &self,
        project: &ProjectId,
        items: &[GatherItem],
        department: &DepartmentConfig,
    ) -> bool;

    /// Store a task execution result. Durable-intent.
    async fn store_result(
        &self,
        task_id: &str,
        kind: TaskKind,
        result: &serde_json::Value,
    ) -> Result<String, KnowledgeGraphError>;

    /// Store a task execution context for future reference. Durable-intent.
    async fn store_context(
        &self,
        task_id: &str,
        context: &serde_json::Value,
    ) -> Result<String, KnowledgeGraphError>;

    /// Cache a value with a TTL. Returns false on failure.
    async fn cache_put(&self, key: &str, value: &serde_json::Value, ttl_seconds: u64) -> bool;

    /// Read a cached value if still valid. Degrades to `None`.
    async fn cache_get(&self, key: &str) -> Option<serde_json::Value>;
}

/// Graph stub that stores nothing and returns nothing.
///
/// Used when running without a knowledge-graph service.
pub struct NoKnowledgeGraph;

#[async_trait]
impl KnowledgeGraph for NoKnowledgeGraph {
    async fn project_context(&self, _project: &ProjectId, _limit: usize) -> Vec<ContextItem> {
        Vec::new()
    }

    async fn department_context(&self, _project: &ProjectId, _department: &str) -> Vec<ContextItem> {
        Vec::new()
    }

    async fn index_items(
        &self,
        _project: &ProjectId,
        _items: &[GatherItem],
        _department: &DepartmentConfig,
    ) -> bool {
        false
    }

    async fn store_result(
        &self,
        _task_id: &str,
        _kind: TaskKind,
        _result: &serde_json::Value,
    ) -> Result<String, KnowledgeGraphError> {
        Ok(String::new())
    }

    async fn store_context(
        &self,
        _task_id: &str,
        _context: &serde_json::Value,
    ) -> Result<String, KnowledgeGraphError> {
        Ok(String::new())
    }

    async fn cache_put(&self, _key: &str, _value: &serde_json::Value, _ttl_seconds: u64) -> bool {
        false
    }

    async fn cache_get(&self, _key: &str) -> Option<serde_json::Value> {
        None
    }
}
