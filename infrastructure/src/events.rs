//! JSONL progress event publisher.
//!
//! Appends each event as one JSON line to a per-project stream file
//! (`automated-gather-{project}.jsonl`), merging `timestamp` and
//! `project_id` into the record. Publishing is best-effort: failures are
//! logged and absorbed.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use gatherline_application::ports::event_bus::ProgressPublisher;
use gatherline_domain::{ProgressEvent, ProjectId};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::warn;

/// Progress publisher writing one JSON object per line.
pub struct JsonlProgressPublisher {
    dir: PathBuf,
}

impl JsonlProgressPublisher {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn path(&self, project: &ProjectId) -> PathBuf {
        self.dir.join(format!("automated-gather-{project}.jsonl"))
    }

    async fn append(&self, project: &ProjectId, line: &str) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path(project))
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.write_all(b"\n").await?;
        file.flush().await
    }
}

#[async_trait]
impl ProgressPublisher for JsonlProgressPublisher {
    async fn publish(&self, project: &ProjectId, event: ProgressEvent) {
        let mut record = match serde_json::to_value(&event) {
            Ok(serde_json::Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                warn!(event = event.kind(), "Could not serialize progress event");
                return;
            }
        };
        record.insert(
            "timestamp".to_string(),
            serde_json::Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        record.insert(
            "project_id".to_string(),
            serde_json::Value::String(project.to_string()),
        );

        let line = match serde_json::to_string(&record) {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "Could not serialize progress event");
                return;
            }
        };

        if let Err(e) = self.append(project, &line).await {
            warn!(
                project = %project,
                event = event.kind(),
                error = %e,
                "Failed to publish progress event"
            );
        }
    }
}
