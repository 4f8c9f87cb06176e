//! Session-level error taxonomy.
//!
//! Only two failure classes abort a running session: the cooperative soft
//! timeout and persistence failures. Every other error raised inside one
//! iteration is logged and converted into a skipped iteration by the
//! orchestrator.

use thiserror::Error;

/// Errors surfaced by the orchestrator and task runner.
#[derive(Error, Debug)]
pub enum AutomationError {
    /// Cooperative soft time budget exceeded; the hosting task runtime
    /// decides whether to retry the whole session.
    #[error("Soft time budget exceeded")]
    SoftTimeout,

    /// Corpus read/write failure. Fatal: silent loss here would corrupt
    /// session state.
    #[error("Persistence failure: {0}")]
    Persistence(String),

    /// Department catalog could not be loaded.
    #[error("Department catalog failure: {0}")]
    Catalog(String),

    /// Content generation failed for one iteration.
    #[error("Generation failure: {0}")]
    Generation(String),

    /// Task runner dispatch or handler failure.
    #[error("Task handler failure: {0}")]
    Handler(String),
}

impl AutomationError {
    /// Whether this error must abort the department loop and session.
    ///
    /// Non-fatal errors are absorbed at the innermost iteration and the
    /// loop continues.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AutomationError::SoftTimeout | AutomationError::Persistence(_)
        )
    }

    pub fn is_soft_timeout(&self) -> bool {
        matches!(self, AutomationError::SoftTimeout)
    }
}
