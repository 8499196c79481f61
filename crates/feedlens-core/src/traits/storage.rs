// SPDX-FileCopyrightText: 2026 Feedlens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key/value store trait for persistence backends.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::FeedlensError;

/// Persistent key/value contract shared by every stateful component.
///
/// No transactions; writes are last-write-wins. Logically related operations
/// are serialized by the single-worker assumption of the engine, not by the
/// store.
#[async_trait]
pub trait KvStore: Send + Sync + 'static {
    /// Fetch the given keys. Absent keys are simply missing from the result map.
    async fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>, FeedlensError>;

    /// Write all entries. Each key is replaced wholesale.
    async fn set(&self, entries: HashMap<String, Value>) -> Result<(), FeedlensError>;

    /// Delete the given keys. Deleting an absent key is not an error.
    async fn remove(&self, keys: &[&str]) -> Result<(), FeedlensError>;

    /// Convenience single-key fetch.
    async fn get_one(&self, key: &str) -> Result<Option<Value>, FeedlensError> {
        Ok(self.get(&[key]).await?.remove(key))
    }

    /// Convenience single-key write.
    async fn set_one(&self, key: &str, value: Value) -> Result<(), FeedlensError> {
        self.set(HashMap::from([(key.to_string(), value)])).await
    }
}
