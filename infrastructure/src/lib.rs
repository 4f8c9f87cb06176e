//! Infrastructure layer for gatherline
//!
//! Adapters for every application port: the knowledge-graph RPC client,
//! HTTP-backed catalog / LLM collaborators / evaluation trigger, JSONL
//! corpus and event sinks, and figment-based configuration loading.

pub mod catalog;
pub mod config;
pub mod evaluation;
pub mod events;
pub mod graph;
pub mod llm;
pub mod metrics;
pub mod store;

pub use catalog::HttpDepartmentCatalog;
pub use config::{ConfigLoader, FileConfig};
pub use evaluation::HttpEvaluationTrigger;
pub use events::JsonlProgressPublisher;
pub use graph::{GraphClient, GraphClientConfig, GraphError};
pub use llm::{ChatClient, LlmContentGenerator, LlmScoringOracle, LlmSimilarityOracle};
pub use metrics::LogMetricsSink;
pub use store::JsonlCorpusStore;
