use std::sync::Arc;

use tidemq_broker::{StoreError, StreamStore};
use tidemq_models::MessageId;

use crate::options::ProducerOptions;

/// Appends messages to topics, capping each topic at `max_len` entries.
#[derive(Clone)]
pub struct Producer {
    store: Arc<dyn StreamStore>,
    options: ProducerOptions,
}

impl Producer {
    pub fn new(store: Arc<dyn StreamStore>, options: ProducerOptions) -> Self {
        Self {
            store,
            options: options.repaired(),
        }
    }

    pub fn options(&self) -> &ProducerOptions {
        &self.options
    }

    pub async fn send(&self, topic: &str, key: &str, value: &str) -> Result<MessageId, StoreError> {
        if topic.is_empty() {
            return Err(StoreError::InvalidArgument("topic can not be empty".into()));
        }
        self.store
            .append(topic, self.options.max_len, key, value)
            .await
    }
}
