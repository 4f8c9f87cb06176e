//! Generic task runner.
//!
//! A [`TaskHandler`] is the narrow interface a unit of background work
//! implements; [`TaskRunner`] wraps any registered handler with result
//! caching, context/result storage in the knowledge graph, and metrics.
//! Handlers are dispatched by [`TaskKind`], so an unknown kind is a typed
//! error rather than a stringly-keyed miss.
//!
//! The runner itself never retries: whole-task retry on failure belongs to
//! the hosting task runtime.

use crate::error::AutomationError;
use crate::ports::knowledge_graph::KnowledgeGraph;
use crate::ports::metrics::{MetricsSink, NoMetrics};
use async_trait::async_trait;
use gatherline_domain::{AutomationRequest, SessionOutcome, TaskKind};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// One unit of background work.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn execute(&self, request: &AutomationRequest)
    -> Result<SessionOutcome, AutomationError>;
}

/// Dispatches requests to registered handlers, wrapping each run with
/// graph-backed caching and bookkeeping.
pub struct TaskRunner {
    handlers: HashMap<TaskKind, Arc<dyn TaskHandler>>,
    graph: Arc<dyn KnowledgeGraph>,
    metrics: Arc<dyn MetricsSink>,
    cache_ttl_seconds: Option<u64>,
}

impl TaskRunner {
    pub fn new(graph: Arc<dyn KnowledgeGraph>) -> Self {
        Self {
            handlers: HashMap::new(),
            graph,
            metrics: Arc::new(NoMetrics),
            cache_ttl_seconds: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Enable result caching with the given TTL.
    pub fn with_cache_ttl(mut self, seconds: u64) -> Self {
        self.cache_ttl_seconds = Some(seconds);
        self
    }

    pub fn register(mut self, kind: TaskKind, handler: Arc<dyn TaskHandler>) -> Self {
        self.handlers.insert(kind, handler);
        self
    }

    /// Run the handler registered for `kind`.
    ///
    /// A valid cached outcome short-circuits the handler entirely. Context
    /// and result storage are best-effort; their failures are logged and
    /// never fail the task.
    pub async fn run(
        &self,
        kind: TaskKind,
        request: &AutomationRequest,
    ) -> Result<SessionOutcome, AutomationError> {
        let handler = self
            .handlers
            .get(&kind)
            .ok_or_else(|| AutomationError::Handler(format!("no handler registered for {kind}")))?;

        let cache_key = format!("{kind}:{}:result", request.task_id);

        if self.cache_ttl_seconds.is_some()
            && let Some(cached) = self.graph.cache_get(&cache_key).await
            && let Ok(outcome) = serde_json::from_value::<SessionOutcome>(cached)
        {
            info!(task_id = %request.task_id, kind = %kind, "Returning cached task result");
            self.metrics.incr("task_cache_hits", 1);
            return Ok(outcome);
        }

        if let Ok(context) = serde_json::to_value(request)
            && let Err(e) = self.graph.store_context(&request.task_id, &context).await
        {
            warn!(task_id = %request.task_id, error = %e, "Failed to store task context");
        }

        self.metrics.incr("tasks_started", 1);
        let outcome = match handler.execute(request).await {
            Ok(outcome) => outcome,
            Err(e) => {
                self.metrics.incr("tasks_failed", 1);
                return Err(e);
            }
        };
        self.metrics.incr("tasks_completed", 1);

        if let Ok(result) = serde_json::to_value(&outcome) {
            if let Err(e) = self.graph.store_result(&request.task_id, kind, &result).await {
                warn!(task_id = %request.task_id, error = %e, "Failed to store task result");
            }
            if let Some(ttl) = self.cache_ttl_seconds
                && !self.graph.cache_put(&cache_key, &result, ttl).await
            {
                warn!(task_id = %request.task_id, "Failed to cache task result");
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::knowledge_graph::KnowledgeGraphError;
    use async_trait::async_trait;
    use gatherline_domain::{
        ContextItem, DepartmentConfig, GatherItem, ProjectId, SessionStatus,
    };
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticHandler {
        calls: AtomicUsize,
        fail: bool,
    }

    impl StaticHandler {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }
    }

    #[async_trait]
    impl TaskHandler for StaticHandler {
        async fn execute(
            &self,
            _request: &AutomationRequest,
        ) -> Result<SessionOutcome, AutomationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AutomationError::Generation("boom".to_string()));
            }
            Ok(SessionOutcome {
                status: SessionStatus::Completed,
                iterations: 2,
                departments_processed: 1,
                items_created: 4,
                summary: Vec::new(),
                message: None,
            })
        }
    }

    /// Graph fake recording durable writes and serving a scripted cache.
    struct MemoryGraph {
        cache: Mutex<HashMap<String, serde_json::Value>>,
        results: Mutex<Vec<String>>,
        contexts: Mutex<Vec<String>>,
        fail_stores: bool,
    }

    impl MemoryGraph {
        fn new() -> Self {
            Self {
                cache: Mutex::new(HashMap::new()),
                results: Mutex::new(Vec::new()),
                contexts: Mutex::new(Vec::new()),
                fail_stores: false,
            }
        }
    }

    #[async_trait]
    impl KnowledgeGraph for MemoryGraph {
        async fn project_context(&self, _project: &ProjectId, _limit: usize) -> Vec<ContextItem> {
            Vec::new()
        }

        async fn department_context(
            &self,
            _project: &ProjectId,
            _department: &str,
        ) -> Vec<ContextItem> {
            Vec::new()
        }

        async fn index_items(
            &self,
            _project: &ProjectId,
            _items: &[GatherItem],
            _department: &DepartmentConfig,
        ) -> bool {
            true
        }

        async fn store_result(
            &self,
            task_id: &str,
            _kind: TaskKind,
            _result: &serde_json::Value,
        ) -> Result<String, KnowledgeGraphError> {
            if self.fail_stores {
                return Err(KnowledgeGraphError::Timeout);
            }
            self.results.lock().unwrap().push(task_id.to_string());
            Ok("node-1".to_string())
        }

        async fn store_context(
            &self,
            task_id: &str,
            _context: &serde_json::Value,
        ) -> Result<String, KnowledgeGraphError> {
            if self.fail_stores {
                return Err(KnowledgeGraphError::Timeout);
            }
            self.contexts.lock().unwrap().push(task_id.to_string());
            Ok("node-2".to_string())
        }

        async fn cache_put(
            &self,
            key: &str,
            value: &serde_json::Value,
            _ttl_seconds: u64,
        ) -> bool {
            self.cache
                .lock()
                .unwrap()
                .insert(key.to_string(), value.clone());
            true
        }

        async fn cache_get(&self, key: &str) -> Option<serde_json::Value> {
            self.cache.lock().unwrap().get(key).cloned()
        }
    }

    fn request() -> AutomationRequest {
        AutomationRequest::new("proj-1", "user-1", "task-9")
    }

    #[tokio::test]
    async fn unregistered_kind_is_a_typed_error() {
        let runner = TaskRunner::new(Arc::new(MemoryGraph::new()));
        let err = runner
            .run(TaskKind::GatherAutomation, &request())
            .await
            .unwrap_err();
        assert!(matches!(err, AutomationError::Handler(_)));
    }

    #[tokio::test]
    async fn success_stores_context_and_result() {
        let graph = Arc::new(MemoryGraph::new());
        let handler = Arc::new(StaticHandler::new());
        let runner = TaskRunner::new(Arc::clone(&graph) as Arc<dyn KnowledgeGraph>)
            .register(TaskKind::GatherAutomation, Arc::clone(&handler) as Arc<dyn TaskHandler>);

        let outcome = runner
            .run(TaskKind::GatherAutomation, &request())
            .await
            .unwrap();

        assert_eq!(outcome.items_created, 4);
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
        assert_eq!(*graph.contexts.lock().unwrap(), ["task-9"]);
        assert_eq!(*graph.results.lock().unwrap(), ["task-9"]);
    }

    #[tokio::test]
    async fn cached_outcome_skips_the_handler() {
        let graph = Arc::new(MemoryGraph::new());
        let handler = Arc::new(StaticHandler::new());
        let runner = TaskRunner::new(Arc::clone(&graph) as Arc<dyn KnowledgeGraph>)
            .with_cache_ttl(3600)
            .register(TaskKind::GatherAutomation, Arc::clone(&handler) as Arc<dyn TaskHandler>);

        let first = runner
            .run(TaskKind::GatherAutomation, &request())
            .await
            .unwrap();
        let second = runner
            .run(TaskKind::GatherAutomation, &request())
            .await
            .unwrap();

        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
        assert_eq!(first.items_created, second.items_created);
    }

    #[tokio::test]
    async fn durable_store_failures_do_not_fail_the_task() {
        let graph = Arc::new(MemoryGraph {
            fail_stores: true,
            ..MemoryGraph::new()
        });
        let handler = Arc::new(StaticHandler::new());
        let runner = TaskRunner::new(Arc::clone(&graph) as Arc<dyn KnowledgeGraph>)
            .register(TaskKind::GatherAutomation, handler as Arc<dyn TaskHandler>);

        let outcome = runner.run(TaskKind::GatherAutomation, &request()).await;
        assert!(outcome.is_ok());
    }

    #[tokio::test]
    async fn handler_errors_propagate() {
        let handler = Arc::new(StaticHandler {
            calls: AtomicUsize::new(0),
            fail: true,
        });
        let runner = TaskRunner::new(Arc::new(MemoryGraph::new()))
            .register(TaskKind::GatherAutomation, handler as Arc<dyn TaskHandler>);

        let err = runner
            .run(TaskKind::GatherAutomation, &request())
            .await
            .unwrap_err();
        assert!(matches!(err, AutomationError::Generation(_)));
    }
}
