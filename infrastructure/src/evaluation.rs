//! HTTP evaluation trigger adapter.

use async_trait::async_trait;
use gatherline_application::ports::evaluation::EvaluationTrigger;
use gatherline_domain::ProjectId;
use tracing::{info, warn};

/// Fires the downstream department evaluation endpoint.
///
/// Strictly fire-and-forget: every failure is absorbed and reported as
/// `false`.
pub struct HttpEvaluationTrigger {
    http: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
}

impl HttpEvaluationTrigger {
    pub fn new(api_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.into(),
            api_key,
        }
    }
}

#[async_trait]
impl EvaluationTrigger for HttpEvaluationTrigger {
    async fn trigger(&self, project: &ProjectId, department_number: u32) -> bool {
        let url = format!(
            "{}/departments/evaluate",
            self.api_url.trim_end_matches('/')
        );
        let body = serde_json::json!({
            "project_id": project.as_str(),
            "department_number": department_number,
        });

        let mut request = self.http.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        match request.send().await {
            Ok(response) if response.status().is_success() => {
                info!(
                    project = %project,
                    department_number,
                    "Triggered department evaluation"
                );
                true
            }
            Ok(response) => {
                warn!(
                    project = %project,
                    department_number,
                    status = response.status().as_u16(),
                    "Department evaluation trigger rejected"
                );
                false
            }
            Err(e) => {
                warn!(
                    project = %project,
                    department_number,
                    error = %e,
                    "Failed to trigger department evaluation"
                );
                false
            }
        }
    }
}
