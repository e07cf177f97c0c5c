// SPDX-License-Identifier: MIT

//! Session service: the surface exposed to CLIs and API layers
//!
//! Each operation loads a checkpoint, runs the workflow on an owned copy and
//! commits the result only when the workflow suspends or completes. A failed
//! call therefore leaves the stored session exactly as it was.
//!
//! Calls on the same session id are serialized by a per-session lock held
//! from load through commit.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use uuid::Uuid;

use super::error::StoryError;
use super::session::{SessionRecord, SessionView};
use super::store::CheckpointStore;
use super::workflow::{Checkpoint, StoryWorkflow};

const MAX_SESSION_ID_LEN: usize = 128;

pub struct StoryService {
    workflow: StoryWorkflow,
    store: Arc<dyn CheckpointStore>,
    locks: RwLock<HashMap<String, Arc<Mutex<()>>>>,
}

impl StoryService {
    pub fn new(workflow: StoryWorkflow, store: Arc<dyn CheckpointStore>) -> Self {
        Self {
            workflow,
            store,
            locks: RwLock::new(HashMap::new()),
        }
    }

    /// Create a session, draft the story and stop at the feedback gate
    pub async fn start(
        &self,
        prompt: &str,
        session_id: Option<String>,
    ) -> Result<SessionView, StoryError> {
        if prompt.trim().is_empty() {
            return Err(StoryError::EmptyPrompt);
        }

        let session_id = match session_id {
            Some(id) if !is_valid_session_id(&id) => return Err(StoryError::InvalidSessionId(id)),
            Some(id) => id,
            None => Uuid::new_v4().to_string(),
        };

        let _guard = self.lock_session(&session_id).await;
        if self.store.load(&session_id).await?.is_some() {
            return Err(StoryError::SessionExists(session_id));
        }

        log::info!("Starting session {}", session_id);
        let checkpoint = self
            .workflow
            .start(SessionRecord::new(session_id, prompt))
            .await?;
        self.commit(checkpoint).await
    }

    /// Answer the feedback gate of a suspended session
    pub async fn resume(
        &self,
        session_id: &str,
        feedback: &str,
    ) -> Result<SessionView, StoryError> {
        let _guard = self.lock_session(session_id).await;
        let checkpoint = self.load(session_id).await?;
        log::info!(
            "Resuming session {} at revision {}",
            session_id,
            checkpoint.record.revision_count
        );
        let checkpoint = self.workflow.resume(checkpoint, feedback).await?;
        self.commit(checkpoint).await
    }

    pub async fn get(&self, session_id: &str) -> Result<SessionView, StoryError> {
        Ok(self.load(session_id).await?.view())
    }

    pub async fn list(&self) -> Result<Vec<String>, StoryError> {
        Ok(self.store.list().await?)
    }

    /// Wait for exclusive access to one session.
    ///
    /// Entries nobody holds are pruned on the way in; the guard keeps its own
    /// entry alive until it is dropped.
    async fn lock_session(&self, session_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.write().await;
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks
                .entry(session_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    async fn load(&self, session_id: &str) -> Result<Checkpoint, StoryError> {
        if !is_valid_session_id(session_id) {
            return Err(StoryError::SessionNotFound(session_id.to_string()));
        }
        self.store
            .load(session_id)
            .await?
            .ok_or_else(|| StoryError::SessionNotFound(session_id.to_string()))
    }

    async fn commit(&self, mut checkpoint: Checkpoint) -> Result<SessionView, StoryError> {
        checkpoint.record.updated_at = Utc::now();
        self.store.save(&checkpoint).await?;
        log::info!(
            "Committed session {} (next: {}, revision {})",
            checkpoint.session_id(),
            checkpoint.next,
            checkpoint.record.revision_count
        );
        Ok(checkpoint.view())
    }
}

/// Letters, digits, '-' and '_' only, 1..=128 chars
pub fn is_valid_session_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_SESSION_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_validation() {
        assert!(is_valid_session_id("abc-123_DEF"));
        assert!(is_valid_session_id(&Uuid::new_v4().to_string()));

        assert!(!is_valid_session_id(""));
        assert!(!is_valid_session_id("../etc/passwd"));
        assert!(!is_valid_session_id("has space"));
        assert!(!is_valid_session_id("dot.json"));
        assert!(!is_valid_session_id(&"x".repeat(129)));
    }
}
