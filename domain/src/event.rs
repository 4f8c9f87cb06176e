//! Progress events published over the event bus.
//!
//! Every orchestration session emits exactly one terminal event
//! ([`AutomationComplete`](ProgressEvent::AutomationComplete),
//! [`AutomationTimeout`](ProgressEvent::AutomationTimeout) or
//! [`AutomationError`](ProgressEvent::AutomationError)), so observers of
//! the bus never wait indefinitely for an outcome.

use crate::department::DepartmentRunSummary;
use serde::{Deserialize, Serialize};

/// One progress event, serialized with a snake_case `type` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    AutomationStarted {
        task_id: String,
        departments_count: usize,
        max_iterations: u32,
    },
    DepartmentStarted {
        department: String,
        department_name: String,
        department_number: u32,
        threshold: f32,
        model: String,
        total_iterations: u32,
    },
    Deduplicating {
        department: String,
        department_name: String,
        items_to_check: usize,
    },
    IterationComplete {
        department: String,
        department_name: String,
        iteration: u32,
        total_iterations: u32,
        quality_score: f32,
        items_created: usize,
        threshold: f32,
        max_iterations: u32,
    },
    DepartmentComplete {
        department: String,
        department_name: String,
        quality_score: f32,
        iterations_used: u32,
        items_created: usize,
        threshold: f32,
    },
    AutomationComplete {
        task_id: String,
        total_iterations: u32,
        departments_processed: usize,
        items_created: usize,
        summary: Vec<DepartmentRunSummary>,
    },
    AutomationTimeout {
        task_id: String,
        message: String,
    },
    AutomationError {
        task_id: String,
        error: String,
    },
}

impl ProgressEvent {
    /// The wire name of this event's type.
    pub fn kind(&self) -> &'static str {
        match self {
            ProgressEvent::AutomationStarted { .. } => "automation_started",
            ProgressEvent::DepartmentStarted { .. } => "department_started",
            ProgressEvent::Deduplicating { .. } => "deduplicating",
            ProgressEvent::IterationComplete { .. } => "iteration_complete",
            ProgressEvent::DepartmentComplete { .. } => "department_complete",
            ProgressEvent::AutomationComplete { .. } => "automation_complete",
            ProgressEvent::AutomationTimeout { .. } => "automation_timeout",
            ProgressEvent::AutomationError { .. } => "automation_error",
        }
    }

    /// Whether this event terminates a session.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProgressEvent::AutomationComplete { .. }
                | ProgressEvent::AutomationTimeout { .. }
                | ProgressEvent::AutomationError { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let event = ProgressEvent::AutomationStarted {
            task_id: "t1".to_string(),
            departments_count: 3,
            max_iterations: 50,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "automation_started");
        assert_eq!(json["departments_count"], 3);
    }

    #[test]
    fn iteration_complete_round_trips() {
        let event = ProgressEvent::IterationComplete {
            department: "story".to_string(),
            department_name: "Story".to_string(),
            iteration: 2,
            total_iterations: 5,
            quality_score: 73.5,
            items_created: 4,
            threshold: 80.0,
            max_iterations: 50,
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: ProgressEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn terminal_classification() {
        let complete = ProgressEvent::AutomationComplete {
            task_id: "t".to_string(),
            total_iterations: 0,
            departments_processed: 0,
            items_created: 0,
            summary: Vec::new(),
        };
        let timeout = ProgressEvent::AutomationTimeout {
            task_id: "t".to_string(),
            message: "over budget".to_string(),
        };
        let started = ProgressEvent::AutomationStarted {
            task_id: "t".to_string(),
            departments_count: 1,
            max_iterations: 1,
        };
        assert!(complete.is_terminal());
        assert!(timeout.is_terminal());
        assert!(!started.is_terminal());
    }

    #[test]
    fn kind_matches_serialized_tag() {
        let event = ProgressEvent::Deduplicating {
            department: "story".to_string(),
            department_name: "Story".to_string(),
            items_to_check: 7,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], event.kind());
    }
}
