//! Persistent-connection client for the knowledge-graph service.
//!
//! The client owns one TCP connection. A single background listener task
//! reads inbound frames and resolves pending requests through an id-keyed
//! `oneshot` table, so any number of requests can be outstanding at once
//! and responses may arrive out of order. Unparsable or unmatched inbound
//! messages are logged and dropped without side effects.
//!
//! Failure classes follow the asymmetric policy of the pipeline:
//! enrichment reads (`get_context`, `get_department_context`,
//! `search_similar`, `cache_get`, `get_history`) absorb every lower-level
//! fault and degrade to an empty result, while durable-intent writes
//! (`store_result`, `store_context`, `batch_index`) propagate their errors
//! so the call site can decide what is fatal.

use super::error::{GraphError, Result};
use super::protocol::{self, GraphRequest, GraphResponse};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gatherline_application::ports::knowledge_graph::{KnowledgeGraph, KnowledgeGraphError};
use gatherline_domain::{ContextItem, DepartmentConfig, GatherItem, ProjectId, TaskKind};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::BufReader;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Cache TTL applied when a stored record does not carry one.
const DEFAULT_CACHE_TTL_SECONDS: u64 = 3600;

/// Connection settings for [`GraphClient`].
#[derive(Debug, Clone)]
pub struct GraphClientConfig {
    /// `host:port` of the graph service.
    pub addr: String,
    /// Connection attempts before giving up.
    pub max_retries: u32,
    /// Base of the exponential backoff between attempts
    /// (`backoff_base * 2^attempt`).
    pub backoff_base: Duration,
    /// Per-request timeout; a single timeout does not tear the
    /// connection down.
    pub request_timeout: Duration,
}

impl Default for GraphClientConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8002".to_string(),
            max_retries: 3,
            backoff_base: Duration::from_secs(1),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Lifecycle state of the client's connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

struct Connection {
    writer: OwnedWriteHalf,
    listener: JoinHandle<()>,
}

type PendingTable = Arc<Mutex<HashMap<u64, oneshot::Sender<GraphResponse>>>>;

/// Client for the knowledge-graph RPC service.
pub struct GraphClient {
    config: GraphClientConfig,
    next_id: AtomicU64,
    pending: PendingTable,
    conn: Mutex<Option<Connection>>,
    state: Arc<std::sync::Mutex<ConnectionState>>,
}

impl GraphClient {
    pub fn new(config: GraphClientConfig) -> Self {
        Self {
            config,
            next_id: AtomicU64::new(1),
            pending: Arc::new(Mutex::new(HashMap::new())),
            conn: Mutex::new(None),
            state: Arc::new(std::sync::Mutex::new(ConnectionState::Disconnected)),
        }
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_state(&self, state: ConnectionState) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = state;
    }

    /// Establish the connection, retrying with exponential backoff.
    ///
    /// A no-op when already connected. On success exactly one background
    /// listener task is running for this connection.
    pub async fn connect(&self) -> Result<()> {
        let mut guard = self.conn.lock().await;
        if guard.is_some() {
            return Ok(());
        }

        self.set_state(ConnectionState::Connecting);
        let mut attempt = 0;
        let mut last_error = String::new();

        while attempt < self.config.max_retries {
            attempt += 1;
            info!(addr = %self.config.addr, attempt, "Connecting to knowledge graph");

            match TcpStream::connect(&self.config.addr).await {
                Ok(stream) => {
                    let (read_half, write_half) = stream.into_split();
                    let pending = Arc::clone(&self.pending);
                    let state = Arc::clone(&self.state);
                    let listener = tokio::spawn(listen_loop(read_half, pending, state));

                    *guard = Some(Connection {
                        writer: write_half,
                        listener,
                    });
                    self.set_state(ConnectionState::Connected);
                    info!(addr = %self.config.addr, "Connected to knowledge graph");
                    return Ok(());
                }
                Err(e) => {
                    last_error = e.to_string();
                    warn!(attempt, error = %e, "Failed to connect to knowledge graph");
                    if attempt < self.config.max_retries {
                        tokio::time::sleep(self.config.backoff_base * 2u32.pow(attempt)).await;
                    }
                }
            }
        }

        self.set_state(ConnectionState::Disconnected);
        Err(GraphError::ConnectionFailed {
            attempts: self.config.max_retries,
            last_error,
        })
    }

    /// Close the connection. Idempotent.
    pub async fn disconnect(&self) {
        let mut guard = self.conn.lock().await;
        if let Some(conn) = guard.take() {
            conn.listener.abort();
            info!("Disconnected from knowledge graph");
        }
        // Dropping the senders wakes outstanding callers with ListenerGone
        self.pending.lock().await.clear();
        self.set_state(ConnectionState::Disconnected);
    }

    /// Run `op` against a connected client, disconnecting on every exit path.
    pub async fn with_connection<'a, T, Fut>(
        &'a self,
        op: impl FnOnce(&'a Self) -> Fut,
    ) -> Result<T>
    where
        Fut: Future<Output = Result<T>> + 'a,
    {
        self.connect().await?;
        let result = op(self).await;
        self.disconnect().await;
        result
    }

    async fn ensure_connected(&self) -> Result<()> {
        if self.conn.lock().await.is_some() {
            return Ok(());
        }
        self.connect().await
    }

    async fn send(&self, request: &GraphRequest) -> Result<()> {
        let payload = serde_json::to_string(request)?;
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or(GraphError::NotConnected)?;
        protocol::write_frame(&mut conn.writer, &payload).await?;
        Ok(())
    }

    /// Send one request and await its correlated response.
    ///
    /// On timeout the pending entry is removed and the call fails with
    /// [`GraphError::Timeout`]; the connection stays up.
    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        self.ensure_connected().await?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, tx);

        let request = GraphRequest::new(id, method, params);
        debug!(method, request_id = id, "Sending graph request");

        if let Err(e) = self.send(&request).await {
            self.pending.lock().await.remove(&id);
            return Err(e);
        }

        match tokio::time::timeout(self.config.request_timeout, rx).await {
            Ok(Ok(response)) => {
                if let Some(rpc_error) = response.error {
                    return Err(GraphError::Rpc {
                        message: rpc_error.message,
                    });
                }
                debug!(method, request_id = id, "Received graph response");
                Ok(response.result.unwrap_or(Value::Null))
            }
            Ok(Err(_)) => Err(GraphError::ListenerGone),
            Err(_) => {
                error!(method, request_id = id, "Graph request timed out");
                self.pending.lock().await.remove(&id);
                Err(GraphError::Timeout { id })
            }
        }
    }

    // ---- typed calls -----------------------------------------------------

    /// Store a task execution result. Durable-intent: errors propagate.
    pub async fn store_result(
        &self,
        task_id: &str,
        task_type: &str,
        result: &Value,
        metadata: Option<&Value>,
    ) -> Result<String> {
        let content = json!({
            "task_id": task_id,
            "task_type": task_type,
            "result": result,
            "timestamp": Utc::now().to_rfc3339(),
            "metadata": metadata.cloned().unwrap_or_else(|| json!({})),
        });

        let reply = self
            .request(
                "store_knowledge",
                json!({"knowledge_type": "task_result", "content": content}),
            )
            .await?;
        let node_id = reply.get("id").and_then(|v| v.as_str()).unwrap_or_default();
        info!(task_id, node_id, "Stored task result in knowledge graph");
        Ok(node_id.to_string())
    }

    /// Store a task execution context. Durable-intent: errors propagate.
    pub async fn store_context(&self, task_id: &str, context: &Value) -> Result<String> {
        let content = json!({
            "task_id": task_id,
            "context": context,
            "timestamp": Utc::now().to_rfc3339(),
        });

        let reply = self
            .request(
                "store_knowledge",
                json!({"knowledge_type": "task_context", "content": content}),
            )
            .await?;
        let node_id = reply.get("id").and_then(|v| v.as_str()).unwrap_or_default();
        info!(task_id, node_id, "Stored task context in knowledge graph");
        Ok(node_id.to_string())
    }

    /// Historical task results by type. Degrades to empty.
    pub async fn get_history(&self, task_type: &str, limit: usize) -> Vec<Value> {
        let params = json!({
            "knowledge_type": "task_result",
            "query": {"task_type": task_type, "limit": limit},
        });

        match self.request("get_knowledge", params).await {
            Ok(reply) => results_array(&reply),
            Err(e) => {
                error!(task_type, error = %e, "Failed to retrieve task history");
                Vec::new()
            }
        }
    }

    /// Project-wide semantic context. Degrades to empty.
    pub async fn get_context(&self, project: &ProjectId, limit: usize) -> Vec<Value> {
        let params = json!({"project_id": project.as_str(), "limit": limit});
        match self.request("get_context", params).await {
            Ok(reply) => reply
                .get("context")
                .and_then(|c| c.as_array())
                .cloned()
                .unwrap_or_default(),
            Err(e) => {
                error!(project = %project, error = %e, "Error getting graph context");
                Vec::new()
            }
        }
    }

    /// Department-specific semantic context. Degrades to empty.
    pub async fn get_department_context(
        &self,
        project: &ProjectId,
        department: &str,
    ) -> Vec<Value> {
        let params = json!({"project_id": project.as_str(), "department": department});
        match self.request("get_department_context", params).await {
            Ok(reply) => reply
                .get("context")
                .and_then(|c| c.as_array())
                .cloned()
                .unwrap_or_default(),
            Err(e) => {
                error!(project = %project, department, error = %e, "Error getting department context");
                Vec::new()
            }
        }
    }

    /// Semantic similarity search. Degrades to empty.
    pub async fn search_similar(
        &self,
        description: &str,
        kind: Option<&str>,
        limit: usize,
    ) -> Vec<Value> {
        let mut query = description.to_string();
        if let Some(kind) = kind {
            query.push_str(&format!(" task_type:{kind}"));
        }

        match self
            .request("search_embeddings", json!({"query": query, "limit": limit}))
            .await
        {
            Ok(reply) => {
                let results = results_array(&reply);
                info!(query = description, count = results.len(), "Found similar entries");
                results
            }
            Err(e) => {
                error!(query = description, error = %e, "Failed to search similar entries");
                Vec::new()
            }
        }
    }

    /// Cache a value under `key` with a TTL. Returns false on failure.
    pub async fn cache_put(&self, key: &str, value: &Value, ttl_seconds: u64) -> bool {
        let content = json!({
            "cache_key": key,
            "result": value,
            "created_at": Utc::now().to_rfc3339(),
            "ttl_seconds": ttl_seconds,
        });

        match self
            .request(
                "store_knowledge",
                json!({"knowledge_type": "task_cache", "content": content}),
            )
            .await
        {
            Ok(_) => {
                info!(cache_key = key, ttl = ttl_seconds, "Cached value");
                true
            }
            Err(e) => {
                error!(cache_key = key, error = %e, "Failed to cache value");
                false
            }
        }
    }

    /// Read a cached value if still valid.
    ///
    /// Expiry is judged client-side at read time: the record is valid while
    /// `now - created_at < ttl_seconds`, whatever the store returns.
    pub async fn cache_get(&self, key: &str) -> Option<Value> {
        let params = json!({"knowledge_type": "task_cache", "query": {"cache_key": key}});

        let reply = match self.request("get_knowledge", params).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(cache_key = key, error = %e, "Failed to retrieve cached value");
                return None;
            }
        };

        let records = results_array(&reply);
        let content = records.first()?.get("content")?;

        let created_at = content
            .get("created_at")
            .and_then(|v| v.as_str())
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))?;
        let ttl_seconds = content
            .get("ttl_seconds")
            .and_then(|v| v.as_u64())
            .unwrap_or(DEFAULT_CACHE_TTL_SECONDS);

        if (Utc::now() - created_at).num_seconds() < ttl_seconds as i64 {
            info!(cache_key = key, "Cache hit");
            content.get("result").cloned()
        } else {
            info!(cache_key = key, "Cache expired");
            None
        }
    }

    /// Index gather items as graph nodes. Durable-intent: errors propagate;
    /// the returned bool is the service's own success flag.
    pub async fn batch_index(
        &self,
        project: &ProjectId,
        items: &[GatherItem],
        department: &DepartmentConfig,
    ) -> Result<bool> {
        let nodes: Vec<Value> = items
            .iter()
            .map(|item| {
                json!({
                    "id": item.id,
                    "projectId": project.as_str(),
                    "content": item.content,
                    "summary": item.summary,
                    "department": department.slug,
                    "departmentName": department.name,
                    "type": "GatherItem",
                    "automated": true,
                    "metadata": item.automation_metadata,
                })
            })
            .collect();

        let reply = self
            .request(
                "batch_create_nodes",
                json!({"project_id": project.as_str(), "nodes": nodes}),
            )
            .await?;

        let success = reply
            .get("success")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        if success {
            info!(
                project = %project,
                department = %department.slug,
                count = items.len(),
                "Indexed items in knowledge graph"
            );
        }
        Ok(success)
    }

    /// Ping the service. Degrades to false.
    pub async fn health_check(&self) -> bool {
        match self.request("ping", json!({})).await {
            Ok(reply) => reply.get("status").and_then(|v| v.as_str()) == Some("ok"),
            Err(e) => {
                warn!(error = %e, "Knowledge graph health check failed");
                false
            }
        }
    }
}

/// Background listener - single owner of the read half.
///
/// Resolves pending requests by the echoed response id; anything that does
/// not parse or does not match an outstanding request is logged and
/// discarded. When the loop exits, pending senders are dropped so waiting
/// callers observe [`GraphError::ListenerGone`].
async fn listen_loop(
    read_half: OwnedReadHalf,
    pending: PendingTable,
    state: Arc<std::sync::Mutex<ConnectionState>>,
) {
    let mut reader = BufReader::new(read_half);

    loop {
        let frame = match protocol::read_frame(&mut reader).await {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                warn!("Knowledge graph connection closed");
                break;
            }
            Err(e) => {
                warn!(error = %e, "Listener read error");
                break;
            }
        };

        let response: GraphResponse = match serde_json::from_str(&frame) {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, frame = %frame, "Discarding unparsable graph message");
                continue;
            }
        };

        let Some(id) = response.id else {
            debug!("Discarding graph message without id");
            continue;
        };

        match pending.lock().await.remove(&id) {
            Some(tx) => {
                let _ = tx.send(response);
            }
            None => debug!(response_id = id, "No pending request for response"),
        }
    }

    pending.lock().await.clear();
    *state.lock().unwrap_or_else(|e| e.into_inner()) = ConnectionState::Disconnected;
}

fn results_array(reply: &Value) -> Vec<Value> {
    reply
        .get("results")
        .and_then(|r| r.as_array())
        .cloned()
        .unwrap_or_default()
}

#[async_trait]
impl KnowledgeGraph for GraphClient {
    async fn project_context(&self, project: &ProjectId, limit: usize) -> Vec<ContextItem> {
        self.get_context(project, limit)
            .await
            .iter()
            .filter_map(ContextItem::from_value)
            .collect()
    }

    async fn department_context(&self, project: &ProjectId, department: &str) -> Vec<ContextItem> {
        self.get_department_context(project, department)
            .await
            .iter()
            .filter_map(ContextItem::from_value)
            .collect()
    }

    async fn index_items(
        &self,
        project: &ProjectId,
        items: &[GatherItem],
        department: &DepartmentConfig,
    ) -> bool {
        match self.batch_index(project, items, department).await {
            Ok(success) => success,
            Err(e) => {
                error!(
                    project = %project,
                    department = %department.slug,
                    error = %e,
                    "Error indexing items in knowledge graph"
                );
                false
            }
        }
    }

    async fn store_result(
        &self,
        task_id: &str,
        kind: TaskKind,
        result: &Value,
    ) -> std::result::Result<String, KnowledgeGraphError> {
        GraphClient::store_result(self, task_id, kind.as_str(), result, None)
            .await
            .map_err(Into::into)
    }

    async fn store_context(
        &self,
        task_id: &str,
        context: &Value,
    ) -> std::result::Result<String, KnowledgeGraphError> {
        GraphClient::store_context(self, task_id, context)
            .await
            .map_err(Into::into)
    }

    async fn cache_put(&self, key: &str, value: &Value, ttl_seconds: u64) -> bool {
        GraphClient::cache_put(self, key, value, ttl_seconds).await
    }

    async fn cache_get(&self, key: &str) -> Option<Value> {
        GraphClient::cache_get(self, key).await
    }
}

impl From<GraphError> for KnowledgeGraphError {
    fn from(e: GraphError) -> Self {
        match e {
            GraphError::ConnectionFailed { .. } => KnowledgeGraphError::Connection(e.to_string()),
            GraphError::Timeout { .. } => KnowledgeGraphError::Timeout,
            other => KnowledgeGraphError::Request(other.to_string()),
        }
    }
}
