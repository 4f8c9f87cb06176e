//! Typed configuration sections with defaults.

use crate::graph::GraphClientConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the worker.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub graph: GraphSection,
    pub automation: AutomationSection,
    pub catalog: CatalogSection,
    pub llm: LlmSection,
    pub storage: StorageSection,
    pub events: EventsSection,
}

/// Knowledge-graph service connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphSection {
    pub addr: String,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub request_timeout_secs: u64,
}

impl Default for GraphSection {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8002".to_string(),
            max_retries: 3,
            backoff_base_ms: 1000,
            request_timeout_secs: 30,
        }
    }
}

impl GraphSection {
    pub fn client_config(&self) -> GraphClientConfig {
        GraphClientConfig {
            addr: self.addr.clone(),
            max_retries: self.max_retries,
            backoff_base: Duration::from_millis(self.backoff_base_ms),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}

/// Session defaults for automated gather creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomationSection {
    pub max_iterations: u32,
    /// Cooperative soft budget; the hosting runtime enforces a larger hard
    /// budget on top.
    pub soft_budget_secs: u64,
    pub default_model: String,
    pub context_limit: usize,
    pub cache_ttl_secs: u64,
}

impl Default for AutomationSection {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            soft_budget_secs: 540,
            default_model: "anthropic/claude-sonnet-4.5".to_string(),
            context_limit: 50,
            cache_ttl_secs: 3600,
        }
    }
}

/// Project CMS endpoints (department catalog + evaluation trigger).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSection {
    pub api_url: String,
    pub api_key: Option<String>,
}

impl Default for CatalogSection {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3010/api".to_string(),
            api_key: None,
        }
    }
}

/// Chat-completions endpoint for the generator and oracles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    pub api_url: String,
    pub api_key: Option<String>,
    /// Fast model for similarity and quality scoring.
    pub utility_model: String,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            api_url: "https://openrouter.ai/api/v1".to_string(),
            api_key: None,
            utility_model: "anthropic/claude-3-haiku".to_string(),
        }
    }
}

/// Corpus file location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    pub dir: String,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            dir: "./data/gather".to_string(),
        }
    }
}

/// Progress event stream location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsSection {
    pub dir: String,
}

impl Default for EventsSection {
    fn default() -> Self {
        Self {
            dir: "./data/events".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_session_policy() {
        let config = FileConfig::default();
        assert_eq!(config.automation.max_iterations, 50);
        assert_eq!(config.automation.soft_budget_secs, 540);
        assert_eq!(config.graph.max_retries, 3);
        assert_eq!(config.graph.request_timeout_secs, 30);
    }

    #[test]
    fn graph_section_builds_client_config() {
        let section = GraphSection {
            addr: "graph:9000".to_string(),
            max_retries: 5,
            backoff_base_ms: 250,
            request_timeout_secs: 10,
        };
        let client = section.client_config();
        assert_eq!(client.addr, "graph:9000");
        assert_eq!(client.max_retries, 5);
        assert_eq!(client.backoff_base, Duration::from_millis(250));
        assert_eq!(client.request_timeout, Duration::from_secs(10));
    }
}
