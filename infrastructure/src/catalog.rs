//! HTTP department catalog adapter.
//!
//! Queries the project CMS for departments flagged for automation, already
//! filtered server-side to active + automation-enabled and sorted by their
//! ordering number. The sort is re-applied locally in case the server
//! ignores the parameter.

use async_trait::async_trait;
use gatherline_application::ports::department_catalog::{CatalogError, DepartmentCatalog};
use gatherline_domain::{DepartmentConfig, ProjectId};
use tracing::{debug, info};

/// Department catalog backed by the project CMS HTTP API.
pub struct HttpDepartmentCatalog {
    http: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
}

impl HttpDepartmentCatalog {
    pub fn new(api_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.into(),
            api_key,
        }
    }
}

#[async_trait]
impl DepartmentCatalog for HttpDepartmentCatalog {
    async fn list_automatable(
        &self,
        project: &ProjectId,
    ) -> Result<Vec<DepartmentConfig>, CatalogError> {
        let url = format!("{}/departments", self.api_url.trim_end_matches('/'));
        debug!(project = %project, url = %url, "Querying departments from catalog");

        let mut request = self.http.get(&url).query(&[
            ("where[automationEnabled][equals]", "true"),
            ("where[active][equals]", "true"),
            ("sort", "number"),
            ("limit", "1000"),
        ]);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| CatalogError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Request(format!("HTTP {}", status.as_u16())));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| CatalogError::InvalidPayload(e.to_string()))?;

        let docs = payload
            .get("docs")
            .and_then(|d| d.as_array())
            .ok_or_else(|| CatalogError::InvalidPayload("missing docs array".to_string()))?;

        let mut departments: Vec<DepartmentConfig> = docs
            .iter()
            .map(|doc| {
                serde_json::from_value(doc.clone())
                    .map_err(|e| CatalogError::InvalidPayload(e.to_string()))
            })
            .collect::<Result<_, _>>()?;
        departments.sort_by_key(|d| d.number);

        info!(
            project = %project,
            count = departments.len(),
            "Retrieved departments from catalog"
        );
        Ok(departments)
    }
}
