pub mod http;
pub mod in_memory;
mod errors;
mod options;
pub mod pool;

pub use errors::StoreError;
pub use options::ClientOptions;

use async_trait::async_trait;
use std::time::Duration;
use tidemq_models::{Message, MessageId};

/// Append-only, per-topic log with consumer-group claim tracking.
///
/// The read operations return `Ok(None)` when nothing is available; that
/// outcome is never reported as an error.
#[async_trait]
pub trait StreamStore: Send + Sync + 'static {
    /// Append an entry, trimming the topic to roughly `max_len` entries by
    /// evicting the oldest ones. Returns the id assigned to the new entry.
    async fn append(
        &self,
        topic: &str,
        max_len: usize,
        key: &str,
        value: &str,
    ) -> Result<MessageId, StoreError>;

    /// Claim entries no consumer of `group` has seen yet, waiting up to
    /// `block` for one to arrive.
    async fn read_new(
        &self,
        group: &str,
        consumer: &str,
        topic: &str,
        block: Duration,
    ) -> Result<Option<Vec<Message>>, StoreError>;

    /// Entries previously claimed by `consumer` and never acknowledged.
    async fn read_pending(
        &self,
        group: &str,
        consumer: &str,
        topic: &str,
    ) -> Result<Option<Vec<Message>>, StoreError>;

    /// Mark one claimed entry as processed for `group`.
    async fn acknowledge(&self, topic: &str, group: &str, id: &MessageId)
        -> Result<(), StoreError>;
}

pub(crate) fn require_non_empty(value: &str, name: &str) -> Result<(), StoreError> {
    if value.is_empty() {
        return Err(StoreError::InvalidArgument(format!("{name} can not be empty")));
    }
    Ok(())
}
