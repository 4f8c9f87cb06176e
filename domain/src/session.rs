//! Orchestration session state and outcome types.

use crate::department::DepartmentRunSummary;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Iteration ceiling applied when a request does not set its own.
pub const DEFAULT_MAX_ITERATIONS: u32 = 50;

/// Project identifier namespace for every corpus and graph access.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(String);

impl ProjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProjectId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Input for one automation session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationRequest {
    pub project_id: ProjectId,
    pub user_id: String,
    pub task_id: String,
    pub max_iterations: u32,
}

impl AutomationRequest {
    pub fn new(
        project_id: impl Into<ProjectId>,
        user_id: impl Into<String>,
        task_id: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            user_id: user_id.into(),
            task_id: task_id.into(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

impl From<String> for ProjectId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Completed,
    TimedOut,
    Failed,
}

/// Session-wide mutable counters.
///
/// `total_iterations` is shared across all departments and enforces one
/// global ceiling on generative calls; it never decreases.
#[derive(Debug, Clone)]
pub struct SessionCounters {
    max_iterations: u32,
    total_iterations: u32,
    items_created: usize,
    processed: Vec<DepartmentRunSummary>,
}

impl SessionCounters {
    pub fn new(max_iterations: u32) -> Self {
        Self {
            max_iterations,
            total_iterations: 0,
            items_created: 0,
            processed: Vec::new(),
        }
    }

    pub fn total_iterations(&self) -> u32 {
        self.total_iterations
    }

    pub fn items_created(&self) -> usize {
        self.items_created
    }

    /// Summaries of every department processed so far, in processing order.
    pub fn processed(&self) -> &[DepartmentRunSummary] {
        &self.processed
    }

    /// Whether another generation iteration fits inside the global budget.
    pub fn can_iterate(&self) -> bool {
        self.total_iterations < self.max_iterations
    }

    /// Record one completed iteration. Never exceeds the ceiling.
    pub fn record_iteration(&mut self) {
        debug_assert!(self.total_iterations < self.max_iterations);
        self.total_iterations = (self.total_iterations + 1).min(self.max_iterations);
    }

    pub fn record_items(&mut self, count: usize) {
        self.items_created += count;
    }

    /// Append-only: department summaries arrive in processing order.
    pub fn record_department(&mut self, summary: DepartmentRunSummary) {
        self.processed.push(summary);
    }

    pub fn into_summaries(self) -> Vec<DepartmentRunSummary> {
        self.processed
    }
}

/// Result of one automation session, also the payload of its terminal event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionOutcome {
    pub status: SessionStatus,
    pub iterations: u32,
    pub departments_processed: usize,
    pub items_created: usize,
    pub summary: Vec<DepartmentRunSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SessionOutcome {
    /// Outcome for a session that found no automatable departments.
    pub fn empty() -> Self {
        Self {
            status: SessionStatus::Completed,
            iterations: 0,
            departments_processed: 0,
            items_created: 0,
            summary: Vec::new(),
            message: Some("No departments configured for automation".to_string()),
        }
    }
}
