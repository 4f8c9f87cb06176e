//! Task kinds dispatched by the generic task runner.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a unit of background work.
///
/// The runner dispatches handlers by this enum rather than by free-form
/// strings, so an unknown kind is unrepresentable past the parse boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// The iterative per-department gather creation session.
    GatherAutomation,
}

impl TaskKind {
    /// Wire/queue name of this task kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::GatherAutomation => "gather_automation",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gather_automation" => Ok(TaskKind::GatherAutomation),
            other => Err(DomainError::UnknownTaskKind(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_str() {
        let kind: TaskKind = "gather_automation".parse().unwrap();
        assert_eq!(kind, TaskKind::GatherAutomation);
        assert_eq!(kind.to_string(), "gather_automation");
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert!("video_render".parse::<TaskKind>().is_err());
    }
}
