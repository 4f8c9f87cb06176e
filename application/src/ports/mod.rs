//! Ports - interfaces to external collaborators.
//!
//! Implementations (adapters) live in the infrastructure layer.

pub mod content_generator;
pub mod corpus_store;
pub mod department_catalog;
pub mod evaluation;
pub mod event_bus;
pub mod knowledge_graph;
pub mod metrics;
pub mod oracle;

pub use content_generator::{ContentGenerator, GeneratorError};
pub use corpus_store::{CorpusStore, StoreError};
pub use department_catalog::{CatalogError, DepartmentCatalog};
pub use evaluation::EvaluationTrigger;
pub use event_bus::{NoProgressPublisher, ProgressPublisher};
pub use knowledge_graph::{KnowledgeGraph, KnowledgeGraphError, NoKnowledgeGraph};
pub use metrics::{MetricsSink, NoMetrics};
pub use oracle::{OracleError, ScoringOracle, SimilarityOracle};
