//! Department catalog port.

use async_trait::async_trait;
use gatherline_domain::{DepartmentConfig, ProjectId};
use thiserror::Error;

/// Errors from the department catalog.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Catalog request failed: {0}")]
    Request(String),

    #[error("Catalog returned an invalid payload: {0}")]
    InvalidPayload(String),
}

/// Read-only access to the department catalog.
#[async_trait]
pub trait DepartmentCatalog: Send + Sync {
    /// List departments eligible for automation: active, automation-enabled,
    /// sorted by their explicit ordering number.
    async fn list_automatable(
        &self,
        project: &ProjectId,
    ) -> Result<Vec<DepartmentConfig>, CatalogError>;
}
