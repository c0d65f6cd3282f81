use std::{fmt, sync::Arc, time::Duration};

use crate::dead_letter::DeadLetterQueue;

pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(2);
pub const DEFAULT_MAX_RETRY_LIMIT: u32 = 3;
pub const DEFAULT_HANDLE_TIMEOUT: Duration = Duration::from_secs(1);
pub const DEFAULT_DEAD_LETTER_TIMEOUT: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_LEN: usize = 500;

/// Tuning for a [`Consumer`](crate::Consumer). Zero values are replaced by
/// the defaults when the consumer is built.
#[derive(Clone)]
pub struct ConsumerOptions {
    /// How long a read for new entries blocks.
    pub poll_timeout: Duration,
    /// Failure count at which a message is dead-lettered.
    pub max_retry_limit: u32,
    /// Time budget shared by all callbacks of one batch.
    pub handle_timeout: Duration,
    /// Time budget for one dead-letter escalation pass.
    pub dead_letter_timeout: Duration,
    /// `None` logs and drops exhausted messages. Moved into the consumer
    /// when it is built.
    pub dead_letter_queue: Option<Arc<dyn DeadLetterQueue>>,
}

impl Default for ConsumerOptions {
    fn default() -> Self {
        Self {
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            max_retry_limit: DEFAULT_MAX_RETRY_LIMIT,
            handle_timeout: DEFAULT_HANDLE_TIMEOUT,
            dead_letter_timeout: DEFAULT_DEAD_LETTER_TIMEOUT,
            dead_letter_queue: None,
        }
    }
}

impl fmt::Debug for ConsumerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsumerOptions")
            .field("poll_timeout", &self.poll_timeout)
            .field("max_retry_limit", &self.max_retry_limit)
            .field("handle_timeout", &self.handle_timeout)
            .field("dead_letter_timeout", &self.dead_letter_timeout)
            .field("custom_dead_letter_queue", &self.dead_letter_queue.is_some())
            .finish()
    }
}

impl ConsumerOptions {
    pub fn with_poll_timeout(mut self, poll_timeout: Duration) -> Self {
        self.poll_timeout = poll_timeout;
        self
    }

    pub fn with_max_retry_limit(mut self, max_retry_limit: u32) -> Self {
        self.max_retry_limit = max_retry_limit;
        self
    }

    pub fn with_handle_timeout(mut self, handle_timeout: Duration) -> Self {
        self.handle_timeout = handle_timeout;
        self
    }

    pub fn with_dead_letter_timeout(mut self, dead_letter_timeout: Duration) -> Self {
        self.dead_letter_timeout = dead_letter_timeout;
        self
    }

    pub fn with_dead_letter_queue<Q>(mut self, queue: Q) -> Self
    where
        Q: DeadLetterQueue,
    {
        self.dead_letter_queue = Some(Arc::new(queue));
        self
    }

    pub fn repaired(mut self) -> Self {
        if self.poll_timeout.is_zero() {
            self.poll_timeout = DEFAULT_POLL_TIMEOUT;
        }
        if self.max_retry_limit == 0 {
            self.max_retry_limit = DEFAULT_MAX_RETRY_LIMIT;
        }
        if self.handle_timeout.is_zero() {
            self.handle_timeout = DEFAULT_HANDLE_TIMEOUT;
        }
        if self.dead_letter_timeout.is_zero() {
            self.dead_letter_timeout = DEFAULT_DEAD_LETTER_TIMEOUT;
        }
        self
    }
}

/// Tuning for a [`Producer`](crate::Producer).
#[derive(Debug, Clone)]
pub struct ProducerOptions {
    /// Approximate number of entries a topic retains; older ones are evicted.
    pub max_len: usize,
}

impl Default for ProducerOptions {
    fn default() -> Self {
        Self {
            max_len: DEFAULT_MAX_LEN,
        }
    }
}

impl ProducerOptions {
    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = max_len;
        self
    }

    pub fn repaired(mut self) -> Self {
        if self.max_len == 0 {
            self.max_len = DEFAULT_MAX_LEN;
        }
        self
    }
}
