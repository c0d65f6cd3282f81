use crate::{require_non_empty, StoreError, StreamStore};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tidemq_models::{Message, MessageId};
use tokio::sync::Notify;
use tokio::time::Instant;

struct Entry {
    seq: u64,
    message: Message,
}

struct Claim {
    id: MessageId,
    consumer: String,
}

#[derive(Default)]
struct GroupState {
    last_delivered: u64,
    pending: BTreeMap<u64, Claim>,
}

#[derive(Default)]
struct TopicState {
    entries: VecDeque<Entry>,
    last_seq: u64,
    groups: HashMap<String, GroupState>,
}

/// Process-local stream store with consumer groups.
///
/// Groups are created on first read and start at the head of the stream.
#[derive(Clone, Default)]
pub struct InMemoryStreamStore {
    topics: Arc<Mutex<HashMap<String, TopicState>>>,
    notify: Arc<Notify>,
}

impl InMemoryStreamStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently retained for `topic`.
    pub fn topic_len(&self, topic: &str) -> usize {
        self.topics
            .lock()
            .get(topic)
            .map(|state| state.entries.len())
            .unwrap_or(0)
    }

    /// Ids claimed within `group` and not yet acknowledged, in stream order.
    pub fn pending_ids(&self, topic: &str, group: &str) -> Vec<MessageId> {
        self.topics
            .lock()
            .get(topic)
            .and_then(|state| state.groups.get(group))
            .map(|group| group.pending.values().map(|claim| claim.id.clone()).collect())
            .unwrap_or_default()
    }

    fn claim_new(&self, group: &str, consumer: &str, topic: &str) -> Option<Vec<Message>> {
        let mut guard = self.topics.lock();
        let TopicState {
            entries, groups, ..
        } = guard.entry(topic.to_string()).or_default();
        let group_state = groups.entry(group.to_string()).or_default();

        let start = group_state.last_delivered;
        let mut claimed = Vec::new();
        for entry in entries.iter().filter(|entry| entry.seq > start) {
            group_state.pending.insert(
                entry.seq,
                Claim {
                    id: entry.message.id.clone(),
                    consumer: consumer.to_string(),
                },
            );
            group_state.last_delivered = entry.seq;
            claimed.push(entry.message.clone());
        }

        (!claimed.is_empty()).then_some(claimed)
    }
}

fn sequence_of(id: &MessageId) -> Option<u64> {
    id.as_str().rsplit_once('-')?.1.parse().ok()
}

#[async_trait]
impl StreamStore for InMemoryStreamStore {
    async fn append(
        &self,
        topic: &str,
        max_len: usize,
        key: &str,
        value: &str,
    ) -> Result<MessageId, StoreError> {
        require_non_empty(topic, "topic")?;
        if max_len == 0 {
            return Err(StoreError::InvalidArgument(
                "max_len must be positive".into(),
            ));
        }

        let mut guard = self.topics.lock();
        let state = guard.entry(topic.to_string()).or_default();
        state.last_seq += 1;
        let seq = state.last_seq;
        let id = MessageId::new(format!("{}-{}", Utc::now().timestamp_millis(), seq));
        state.entries.push_back(Entry {
            seq,
            message: Message::new(id.clone(), key, value),
        });

        while state.entries.len() > max_len {
            if let Some(evicted) = state.entries.pop_front() {
                for group in state.groups.values_mut() {
                    group.pending.remove(&evicted.seq);
                }
            }
        }
        drop(guard);

        self.notify.notify_waiters();
        Ok(id)
    }

    async fn read_new(
        &self,
        group: &str,
        consumer: &str,
        topic: &str,
        block: Duration,
    ) -> Result<Option<Vec<Message>>, StoreError> {
        require_non_empty(group, "group")?;
        require_non_empty(consumer, "consumer")?;
        require_non_empty(topic, "topic")?;

        let deadline = Instant::now() + block;
        loop {
            let mut notified = std::pin::pin!(self.notify.notified());
            notified.as_mut().enable();

            if let Some(batch) = self.claim_new(group, consumer, topic) {
                return Ok(Some(batch));
            }

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Ok(None);
            }
        }
    }

    async fn read_pending(
        &self,
        group: &str,
        consumer: &str,
        topic: &str,
    ) -> Result<Option<Vec<Message>>, StoreError> {
        require_non_empty(group, "group")?;
        require_non_empty(consumer, "consumer")?;
        require_non_empty(topic, "topic")?;

        let guard = self.topics.lock();
        let Some(state) = guard.get(topic) else {
            return Ok(None);
        };
        let Some(group_state) = state.groups.get(group) else {
            return Ok(None);
        };

        let pending: Vec<Message> = group_state
            .pending
            .iter()
            .filter(|(_, claim)| claim.consumer == consumer)
            .filter_map(|(seq, _)| {
                state
                    .entries
                    .binary_search_by_key(seq, |entry| entry.seq)
                    .ok()
                    .map(|index| state.entries[index].message.clone())
            })
            .collect();

        Ok((!pending.is_empty()).then_some(pending))
    }

    async fn acknowledge(
        &self,
        topic: &str,
        group: &str,
        id: &MessageId,
    ) -> Result<(), StoreError> {
        require_non_empty(topic, "topic")?;
        require_non_empty(group, "group")?;
        require_non_empty(id.as_str(), "message id")?;

        let mut guard = self.topics.lock();
        let group_state = guard
            .get_mut(topic)
            .and_then(|state| state.groups.get_mut(group))
            .ok_or_else(|| StoreError::UnknownEntry(id.clone()))?;

        match sequence_of(id) {
            Some(seq) if group_state.pending.get(&seq).is_some_and(|claim| &claim.id == id) => {
                group_state.pending.remove(&seq);
                Ok(())
            }
            _ => Err(StoreError::UnknownEntry(id.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOPIC: &str = "orders";
    const GROUP: &str = "billing";

    #[tokio::test]
    async fn new_entries_are_claimed_once_per_group() {
        let store = InMemoryStreamStore::new();
        let id = store.append(TOPIC, 10, "k", "v").await.unwrap();

        let first = store
            .read_new(GROUP, "c1", TOPIC, Duration::ZERO)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first, vec![Message::new(id.clone(), "k", "v")]);

        let second = store
            .read_new(GROUP, "c2", TOPIC, Duration::ZERO)
            .await
            .unwrap();
        assert!(second.is_none());

        let other_group = store
            .read_new("audit", "c1", TOPIC, Duration::ZERO)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(other_group.len(), 1);
    }

    #[tokio::test]
    async fn pending_is_scoped_to_the_claiming_consumer() {
        let store = InMemoryStreamStore::new();
        let id = store.append(TOPIC, 10, "k", "v").await.unwrap();
        store
            .read_new(GROUP, "c1", TOPIC, Duration::ZERO)
            .await
            .unwrap();

        let mine = store.read_pending(GROUP, "c1", TOPIC).await.unwrap().unwrap();
        assert_eq!(mine[0].id, id);
        assert!(store.read_pending(GROUP, "c2", TOPIC).await.unwrap().is_none());

        store.acknowledge(TOPIC, GROUP, &id).await.unwrap();
        assert!(store.read_pending(GROUP, "c1", TOPIC).await.unwrap().is_none());
        assert!(matches!(
            store.acknowledge(TOPIC, GROUP, &id).await,
            Err(StoreError::UnknownEntry(_))
        ));
    }

    #[tokio::test]
    async fn append_trims_oldest_entries_and_their_claims() {
        let store = InMemoryStreamStore::new();
        let first = store.append(TOPIC, 2, "k", "1").await.unwrap();
        store
            .read_new(GROUP, "c1", TOPIC, Duration::ZERO)
            .await
            .unwrap();
        store.append(TOPIC, 2, "k", "2").await.unwrap();
        store.append(TOPIC, 2, "k", "3").await.unwrap();

        assert_eq!(store.topic_len(TOPIC), 2);
        assert!(!store.pending_ids(TOPIC, GROUP).contains(&first));
    }

    #[tokio::test]
    async fn blocking_read_wakes_on_append() {
        let store = InMemoryStreamStore::new();
        let reader = {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .read_new(GROUP, "c1", TOPIC, Duration::from_secs(5))
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        store.append(TOPIC, 10, "k", "v").await.unwrap();

        let batch = reader.await.unwrap().unwrap().unwrap();
        assert_eq!(batch.len(), 1);
    }

    #[tokio::test]
    async fn blocking_read_times_out_empty() {
        let store = InMemoryStreamStore::new();
        let batch = store
            .read_new(GROUP, "c1", TOPIC, Duration::from_millis(20))
            .await
            .unwrap();
        assert!(batch.is_none());
    }

    #[tokio::test]
    async fn rejects_empty_arguments() {
        let store = InMemoryStreamStore::new();
        assert!(matches!(
            store.append("", 10, "k", "v").await,
            Err(StoreError::InvalidArgument(_))
        ));
        assert!(matches!(
            store.read_pending(GROUP, "", TOPIC).await,
            Err(StoreError::InvalidArgument(_))
        ));
        assert!(matches!(
            store.acknowledge(TOPIC, GROUP, &MessageId::new("")).await,
            Err(StoreError::InvalidArgument(_))
        ));
    }
}
