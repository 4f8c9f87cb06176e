//! Application layer for gatherline
//!
//! Use cases and ports. The ports define how the pipeline talks to its
//! collaborators (content generator, oracles, corpus store, department
//! catalog, knowledge graph, event bus); implementations live in the
//! infrastructure layer.

pub mod dedup;
pub mod error;
pub mod ports;
pub mod quality;
pub mod runner;
pub mod use_cases;

pub use dedup::{DedupEngine, SIMILARITY_THRESHOLD};
pub use error::AutomationError;
pub use quality::QualityScorer;
pub use runner::{TaskHandler, TaskRunner};
pub use use_cases::run_automation::RunAutomationUseCase;
