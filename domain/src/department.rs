//! Department configuration and per-department run results.

use serde::{Deserialize, Serialize};

/// Quality threshold applied when a department does not set its own.
pub const DEFAULT_QUALITY_THRESHOLD: f32 = 80.0;

/// Configuration of one production department.
///
/// Owned by an external catalog; read-only to the pipeline. The catalog
/// returns departments already filtered to `active` + `automation_enabled`
/// and sorted by `number`; the orchestrator re-checks the flags before
/// processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentConfig {
    pub id: String,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Explicit processing order; lower numbers run first.
    pub number: u32,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub automation_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_threshold: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

fn default_true() -> bool {
    true
}

impl DepartmentConfig {
    /// Resolve the quality threshold, falling back to the default of 80.
    pub fn threshold(&self) -> f32 {
        self.quality_threshold.unwrap_or(DEFAULT_QUALITY_THRESHOLD)
    }

    /// Resolve the model to generate with, falling back to the session default.
    pub fn model_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.model.as_deref().unwrap_or(default)
    }

    /// Whether this department participates in automated gather creation.
    pub fn is_automatable(&self) -> bool {
        self.active && self.automation_enabled
    }
}

/// Result of one department's inner loop, appended to the session's
/// cascading context once the department finishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentRunSummary {
    pub department: String,
    pub name: String,
    pub number: u32,
    pub quality_score: f32,
    pub iterations: u32,
    pub items_created: usize,
    pub threshold: f32,
    pub model: String,
}
