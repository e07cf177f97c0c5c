// SPDX-License-Identifier: MIT

//! Checkpoint persistence
//!
//! - `MemoryStore` - process-local map, for tests and one-shot runs
//! - `FileStore` - one JSON document per session, survives restarts

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;

use super::error::StoreError;
use super::workflow::Checkpoint;

/// Keyed storage for session checkpoints
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Return exactly what the last `save` for this session stored
    async fn load(&self, session_id: &str) -> Result<Option<Checkpoint>, StoreError>;

    /// Insert or replace the checkpoint for its session
    async fn save(&self, checkpoint: &Checkpoint) -> Result<(), StoreError>;

    /// Known session ids, sorted
    async fn list(&self) -> Result<Vec<String>, StoreError>;
}
