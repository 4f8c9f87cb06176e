//! JSONL corpus store.
//!
//! One append-only file per project, one JSON object per line. Every write
//! call appends a complete batch and is independently consumable - a
//! hard-killed session never leaves a half-written iteration behind
//! earlier batches.

use async_trait::async_trait;
use chrono::Utc;
use gatherline_application::ports::corpus_store::{CorpusStore, StoreError};
use gatherline_domain::{AutomationMetadata, CandidateItem, GatherItem, ProjectId};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

/// Corpus store writing one JSONL file per project.
pub struct JsonlCorpusStore {
    dir: PathBuf,
    sequence: AtomicU64,
}

impl JsonlCorpusStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            sequence: AtomicU64::new(0),
        }
    }

    fn path(&self, project: &ProjectId) -> PathBuf {
        self.dir.join(format!("{project}.jsonl"))
    }

    fn next_id(&self) -> String {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);
        format!("gi-{}-{}", Utc::now().timestamp_millis(), sequence)
    }
}

#[async_trait]
impl CorpusStore for JsonlCorpusStore {
    async fn read(&self, project: &ProjectId) -> Result<Vec<GatherItem>, StoreError> {
        let path = self.path(project);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;

        let mut items = Vec::new();
        for (line_number, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<GatherItem>(line) {
                Ok(item) => items.push(item),
                Err(e) => warn!(
                    path = %path.display(),
                    line = line_number + 1,
                    error = %e,
                    "Skipping unparsable corpus line"
                ),
            }
        }
        Ok(items)
    }

    async fn write(
        &self,
        project: &ProjectId,
        items: &[CandidateItem],
        metadata: &AutomationMetadata,
    ) -> Result<Vec<GatherItem>, StoreError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;

        let saved: Vec<GatherItem> = items
            .iter()
            .map(|candidate| GatherItem {
                id: self.next_id(),
                content: candidate.content.clone(),
                summary: candidate.summary.clone(),
                context: candidate.context.clone(),
                media_refs: candidate.media_refs.clone(),
                automation_metadata: Some(metadata.clone()),
                created_at: Utc::now(),
            })
            .collect();

        let mut batch = String::new();
        for item in &saved {
            let line =
                serde_json::to_string(item).map_err(|e| StoreError::Serialization(e.to_string()))?;
            batch.push_str(&line);
            batch.push('\n');
        }

        let path = self.path(project);
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;
        file.write_all(batch.as_bytes())
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;
        file.flush().await.map_err(|e| StoreError::Io(e.to_string()))?;

        info!(
            project = %project,
            count = saved.len(),
            department = %metadata.department,
            "Saved gather items"
        );
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> AutomationMetadata {
        AutomationMetadata {
            task_id: "task-1".to_string(),
            department: "story".to_string(),
            department_name: "Story".to_string(),
            department_number: 1,
            iteration: 1,
            quality_score: 40.0,
            model: "m".to_string(),
            based_on_nodes: Vec::new(),
        }
    }

    #[tokio::test]
    async fn read_of_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlCorpusStore::new(dir.path());
        let items = store.read(&ProjectId::new("nowhere")).await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlCorpusStore::new(dir.path());
        let project = ProjectId::new("proj-1");

        let saved = store
            .write(
                &project,
                &[
                    CandidateItem::new("first content", "first"),
                    CandidateItem::new("second content", "second"),
                ],
                &metadata(),
            )
            .await
            .unwrap();

        assert_eq!(saved.len(), 2);
        assert_ne!(saved[0].id, saved[1].id);
        assert_eq!(
            saved[0].automation_metadata.as_ref().unwrap().department,
            "story"
        );

        let read_back = store.read(&project).await.unwrap();
        assert_eq!(read_back, saved);
    }

    #[tokio::test]
    async fn writes_append_instead_of_rewriting() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlCorpusStore::new(dir.path());
        let project = ProjectId::new("proj-1");

        store
            .write(&project, &[CandidateItem::new("one", "one")], &metadata())
            .await
            .unwrap();
        store
            .write(&project, &[CandidateItem::new("two", "two")], &metadata())
            .await
            .unwrap();

        let items = store.read(&project).await.unwrap();
        let summaries: Vec<_> = items.iter().map(|i| i.summary.as_str()).collect();
        assert_eq!(summaries, ["one", "two"]);
    }

    #[tokio::test]
    async fn unparsable_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlCorpusStore::new(dir.path());
        let project = ProjectId::new("proj-1");

        store
            .write(&project, &[CandidateItem::new("good", "good")], &metadata())
            .await
            .unwrap();
        tokio::fs::OpenOptions::new()
            .append(true)
            .open(dir.path().join("proj-1.jsonl"))
            .await
            .unwrap()
            .write_all(b"{ corrupted line\n")
            .await
            .unwrap();

        let items = store.read(&project).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].summary, "good");
    }

    #[tokio::test]
    async fn projects_are_isolated_by_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlCorpusStore::new(dir.path());

        store
            .write(
                &ProjectId::new("proj-a"),
                &[CandidateItem::new("a", "a")],
                &metadata(),
            )
            .await
            .unwrap();

        let other = store.read(&ProjectId::new("proj-b")).await.unwrap();
        assert!(other.is_empty());
    }
}
