use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of an attached media reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Audio,
    Video,
}

/// Reference to an external media asset attached to a gather item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRef {
    pub url: String,
    pub kind: MediaKind,
}

/// Metadata attached to every automatically created gather item.
///
/// `quality_score` is the department score *before* the iteration that
/// created the item; `based_on_nodes` lists knowledge-graph node ids the
/// generation drew on, when known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationMetadata {
    pub task_id: String,
    pub department: String,
    pub department_name: String,
    pub department_number: u32,
    pub iteration: u32,
    pub quality_score: f32,
    pub model: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub based_on_nodes: Vec<String>,
}

/// A generated content unit that has not yet been deduplicated or persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateItem {
    pub content: String,
    pub summary: String,
    #[serde(default)]
    pub context: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub media_refs: Vec<MediaRef>,
}

impl CandidateItem {
    pub fn new(content: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            summary: summary.into(),
            context: String::new(),
            media_refs: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }
}

/// A persisted gather item. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatherItem {
    pub id: String,
    pub content: String,
    pub summary: String,
    #[serde(default)]
    pub context: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub media_refs: Vec<MediaRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub automation_metadata: Option<AutomationMetadata>,
    pub created_at: DateTime<Utc>,
}

impl GatherItem {
    /// Department slug this item was created for, if it was created by
    /// automation at all.
    pub fn department(&self) -> Option<&str> {
        self.automation_metadata.as_ref().map(|m| m.department.as_str())
    }

    /// Whether this item belongs to the given department.
    pub fn in_department(&self, slug: &str) -> bool {
        self.department() == Some(slug)
    }
}

/// One unit of generation context.
///
/// The orchestrator assembles these from the current corpus and from
/// knowledge-graph snapshots before every generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextItem {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl ContextItem {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            summary: None,
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Lenient conversion from a loose graph payload.
    ///
    /// Accepts `{"content": "...", "summary": "..."}` objects or bare
    /// strings; anything else yields `None` and is skipped by callers.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        if let Some(s) = value.as_str() {
            return Some(Self::new(s));
        }
        let content = value.get("content")?.as_str()?;
        let mut item = Self::new(content);
        if let Some(summary) = value.get("summary").and_then(|s| s.as_str()) {
            item.summary = Some(summary.to_string());
        }
        Some(item)
    }
}

impl From<&GatherItem> for ContextItem {
    fn from(item: &GatherItem) -> Self {
        Self {
            content: item.content.clone(),
            summary: Some(item.summary.clone()),
        }
    }
}
