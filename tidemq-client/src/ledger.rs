use std::collections::BTreeMap;

use tidemq_models::{Message, MessageId};

#[derive(Debug, Clone)]
struct LedgerEntry {
    message: Message,
    failures: u32,
}

/// Consecutive callback failures per in-flight message.
///
/// An entry exists only while a message has failed at least once and has been
/// neither acknowledged nor dead-lettered.
///
/// Entries leave only through those two paths. If the store evicts a message
/// by retention trimming before it reaches the retry limit, it is never
/// redelivered and its entry stays here for the life of the consumer.
#[derive(Debug, Default)]
pub struct RetryLedger {
    entries: BTreeMap<MessageId, LedgerEntry>,
}

impl RetryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more failure for `message`, returning the new total.
    pub fn record_failure(&mut self, message: &Message) -> u32 {
        let entry = self
            .entries
            .entry(message.id.clone())
            .or_insert_with(|| LedgerEntry {
                message: message.clone(),
                failures: 0,
            });
        entry.failures += 1;
        entry.failures
    }

    pub fn failures(&self, id: &MessageId) -> u32 {
        self.entries.get(id).map(|entry| entry.failures).unwrap_or(0)
    }

    /// Forget `id`, returning the failure count it had.
    pub fn clear(&mut self, id: &MessageId) -> Option<u32> {
        self.entries.remove(id).map(|entry| entry.failures)
    }

    /// Snapshot of messages whose failure count reached `limit`.
    pub fn exhausted(&self, limit: u32) -> Vec<Message> {
        self.entries
            .values()
            .filter(|entry| entry.failures >= limit)
            .map(|entry| entry.message.clone())
            .collect()
    }

    pub fn contains(&self, id: &MessageId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
