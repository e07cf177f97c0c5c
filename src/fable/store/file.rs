// SPDX-License-Identifier: MIT

//! File-backed checkpoint store: `<dir>/<session_id>.json`

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;

use super::CheckpointStore;
use crate::fable::error::StoreError;
use crate::fable::workflow::Checkpoint;

const EXTENSION: &str = "json";

/// Stores each checkpoint as a pretty-printed JSON file.
///
/// Writes go to a temporary sibling first and are renamed into place, so a
/// crash mid-write never leaves a truncated checkpoint behind. Session ids
/// are expected to be validated by the caller (no path separators).
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, session_id: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", session_id, EXTENSION))
    }
}

#[async_trait]
impl CheckpointStore for FileStore {
    async fn load(&self, session_id: &str) -> Result<Option<Checkpoint>, StoreError> {
        let path = self.path_for(session_id);
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, checkpoint: &Checkpoint) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).await?;

        let path = self.path_for(checkpoint.session_id());
        let tmp = path.with_extension(format!("{}.tmp", EXTENSION));
        let content = serde_json::to_string_pretty(checkpoint)?;

        fs::write(&tmp, content).await?;
        fs::rename(&tmp, &path).await?;
        log::debug!("Saved checkpoint {:?}", path);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>, StoreError> {
        let mut ids = Vec::new();
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(ids),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == EXTENSION) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(stem.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fable::session::SessionRecord;
    use crate::fable::workflow::Step;

    #[tokio::test]
    async fn test_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("stories"));

        let mut record = SessionRecord::new("s-1", "a dragon and a coin");
        record.story = "Once upon a time".to_string();
        record.history.push("Initial draft generated.".to_string());
        let cp = Checkpoint {
            record,
            next: Step::HumanFeedback,
        };

        store.save(&cp).await.unwrap();

        // A fresh store over the same directory sees the checkpoint
        let reopened = FileStore::new(dir.path().join("stories"));
        assert_eq!(reopened.load("s-1").await.unwrap(), Some(cp));
    }

    #[tokio::test]
    async fn test_missing_session_and_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("never-created"));

        assert_eq!(store.load("nope").await.unwrap(), None);
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_ignores_other_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        for id in ["b", "a"] {
            let cp = Checkpoint {
                record: SessionRecord::new(id, "p"),
                next: Step::Done,
            };
            store.save(&cp).await.unwrap();
        }
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();

        assert_eq!(store.list().await.unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_json_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.json"), "{ not json").unwrap();
        let store = FileStore::new(dir.path());

        assert!(matches!(store.load("bad").await, Err(StoreError::Json(_))));
    }
}
