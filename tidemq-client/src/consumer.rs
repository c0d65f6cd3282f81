//! Polling delivery engine.
//!
//! One iteration of the loop:
//!
//! 1. claim new entries (blocking up to `poll_timeout`) and hand them to the
//!    handler under the `handle_timeout` budget,
//! 2. escalate ledger entries that reached `max_retry_limit` to the dead-letter
//!    queue under the `dead_letter_timeout` budget,
//! 3. re-read entries this consumer claimed earlier but never acknowledged and
//!    hand them to the handler again.
//!
//! New entries are always handled before pending ones within an iteration.
//! Read errors are logged and the iteration restarts; nothing in steady state
//! is reported back to the caller. A panicking callback or dead-letter sink
//! counts as a failure of that message only.

use std::{any::Any, panic::AssertUnwindSafe, sync::Arc};

use futures_util::FutureExt;
use log::{debug, error, info, warn};
use tidemq_broker::StreamStore;
use tidemq_models::Message;
use tokio::{
    task::{JoinError, JoinHandle},
    time::{timeout_at, Instant},
};
use tokio_util::sync::CancellationToken;

use crate::{
    dead_letter::{DeadLetterQueue, LoggingDeadLetterQueue},
    error::ConsumerError,
    handler::MessageHandler,
    ledger::RetryLedger,
    options::ConsumerOptions,
};

/// A validated, not yet running polling engine for one
/// (topic, group, consumer id) triple.
pub struct Consumer {
    topic: String,
    group: String,
    consumer_id: String,
    store: Arc<dyn StreamStore>,
    handler: Arc<dyn MessageHandler>,
    dead_letter_queue: Arc<dyn DeadLetterQueue>,
    options: ConsumerOptions,
    ledger: RetryLedger,
    cancellation: CancellationToken,
}

pub struct ConsumerBuilder {
    topic: String,
    group: String,
    consumer_id: String,
    store: Option<Arc<dyn StreamStore>>,
    handler: Option<Arc<dyn MessageHandler>>,
    options: ConsumerOptions,
}

impl ConsumerBuilder {
    pub fn store(mut self, store: Arc<dyn StreamStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn handler<H>(mut self, handler: H) -> Self
    where
        H: MessageHandler,
    {
        self.handler = Some(Arc::new(handler));
        self
    }

    pub fn options(mut self, options: ConsumerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> Result<Consumer, ConsumerError> {
        let handler = self.handler.ok_or(ConsumerError::MissingHandler)?;
        let store = self.store.ok_or(ConsumerError::MissingStore)?;
        if self.topic.is_empty() {
            return Err(ConsumerError::EmptyTopic);
        }
        if self.group.is_empty() {
            return Err(ConsumerError::EmptyGroup);
        }
        if self.consumer_id.is_empty() {
            return Err(ConsumerError::EmptyConsumerId);
        }

        let mut options = self.options.repaired();
        let dead_letter_queue = options
            .dead_letter_queue
            .take()
            .unwrap_or_else(|| Arc::new(LoggingDeadLetterQueue::new()));

        Ok(Consumer {
            topic: self.topic,
            group: self.group,
            consumer_id: self.consumer_id,
            store,
            handler,
            dead_letter_queue,
            options,
            ledger: RetryLedger::new(),
            cancellation: CancellationToken::new(),
        })
    }
}

impl Consumer {
    pub fn builder(
        topic: impl Into<String>,
        group: impl Into<String>,
        consumer_id: impl Into<String>,
    ) -> ConsumerBuilder {
        ConsumerBuilder {
            topic: topic.into(),
            group: group.into(),
            consumer_id: consumer_id.into(),
            store: None,
            handler: None,
            options: ConsumerOptions::default(),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn consumer_id(&self) -> &str {
        &self.consumer_id
    }

    /// Repaired options. The dead-letter queue has moved into the consumer,
    /// so `dead_letter_queue` is always `None` here.
    pub fn options(&self) -> &ConsumerOptions {
        &self.options
    }

    pub fn ledger(&self) -> &RetryLedger {
        &self.ledger
    }

    /// Spawn the polling loop on its own task.
    pub fn start(self) -> ConsumerHandle {
        let cancellation = self.cancellation.clone();
        let task = tokio::spawn(self.run());
        ConsumerHandle { cancellation, task }
    }

    async fn run(mut self) -> Self {
        info!(
            "Consumer {} started on topic {} (group {})",
            self.consumer_id, self.topic, self.group
        );

        while !self.cancellation.is_cancelled() {
            self.run_once().await;
        }

        info!(
            "Consumer {} stopped with {} message(s) awaiting retry",
            self.consumer_id,
            self.ledger.len()
        );
        self
    }

    /// Execute a single loop iteration.
    pub async fn run_once(&mut self) {
        let read = self.store.read_new(
            &self.group,
            &self.consumer_id,
            &self.topic,
            self.options.poll_timeout,
        );
        let received = tokio::select! {
            _ = self.cancellation.cancelled() => return,
            result = read => result,
        };
        let messages = match received {
            Ok(messages) => messages.unwrap_or_default(),
            Err(err) => {
                error!("receive msg failed, topic: {}, error: {}", self.topic, err);
                tokio::task::yield_now().await;
                return;
            }
        };

        self.handle_messages(&messages).await;
        self.deliver_dead_letters().await;

        let pending = match self
            .store
            .read_pending(&self.group, &self.consumer_id, &self.topic)
            .await
        {
            Ok(messages) => messages.unwrap_or_default(),
            Err(err) => {
                error!(
                    "pending msg receive failed, topic: {}, error: {}",
                    self.topic, err
                );
                tokio::task::yield_now().await;
                return;
            }
        };

        self.handle_messages(&pending).await;
    }

    async fn handle_messages(&mut self, messages: &[Message]) {
        if messages.is_empty() {
            return;
        }

        let deadline = Instant::now() + self.options.handle_timeout;
        for (index, message) in messages.iter().enumerate() {
            if Instant::now() >= deadline {
                warn!(
                    "handling budget of {:?} spent, {} msg(s) left for redelivery",
                    self.options.handle_timeout,
                    messages.len() - index
                );
                return;
            }

            let handled = AssertUnwindSafe(self.handler.handle(message)).catch_unwind();
            match timeout_at(deadline, handled).await {
                Ok(Ok(Ok(()))) => {}
                Ok(Ok(Err(err))) => {
                    let failures = self.ledger.record_failure(message);
                    debug!(
                        "callback failed, msg id: {}, failures: {}, error: {}",
                        message.id, failures, err
                    );
                    continue;
                }
                Ok(Err(panic)) => {
                    let failures = self.ledger.record_failure(message);
                    error!(
                        "callback panicked, msg id: {}, failures: {}, panic: {}",
                        message.id,
                        failures,
                        panic_reason(&*panic)
                    );
                    continue;
                }
                Err(_) => {
                    let failures = self.ledger.record_failure(message);
                    warn!(
                        "callback cut off by handling budget, msg id: {}, failures: {}",
                        message.id, failures
                    );
                    return;
                }
            }

            if let Err(err) = self
                .store
                .acknowledge(&self.topic, &self.group, &message.id)
                .await
            {
                error!("ack msg failed, msg id: {}, error: {}", message.id, err);
                continue;
            }

            self.ledger.clear(&message.id);
        }
    }

    async fn deliver_dead_letters(&mut self) {
        let exhausted = self.ledger.exhausted(self.options.max_retry_limit);
        if exhausted.is_empty() {
            return;
        }

        let deadline = Instant::now() + self.options.dead_letter_timeout;
        for message in exhausted {
            if Instant::now() >= deadline {
                warn!(
                    "dead letter budget of {:?} spent, remaining msgs wait for the next pass",
                    self.options.dead_letter_timeout
                );
                return;
            }

            let delivered =
                AssertUnwindSafe(self.dead_letter_queue.deliver(&message)).catch_unwind();
            match timeout_at(deadline, delivered).await {
                Ok(Ok(Ok(()))) => {}
                Ok(Ok(Err(err))) => error!(
                    "dead letter deliver failed, msg id: {}, error: {}",
                    message.id, err
                ),
                Ok(Err(panic)) => error!(
                    "dead letter deliver panicked, msg id: {}, panic: {}",
                    message.id,
                    panic_reason(&*panic)
                ),
                Err(_) => error!(
                    "dead letter deliver timed out, msg id: {}",
                    message.id
                ),
            }

            // The entry is dropped even if this ack fails; the store may then
            // redeliver a message that was already dead-lettered.
            if let Err(err) = self
                .store
                .acknowledge(&self.topic, &self.group, &message.id)
                .await
            {
                error!(
                    "ack after dead letter failed, msg id: {}, error: {}",
                    message.id, err
                );
            }

            self.ledger.clear(&message.id);
        }
    }
}

fn panic_reason(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

/// Control surface of a running [`Consumer`].
pub struct ConsumerHandle {
    cancellation: CancellationToken,
    task: JoinHandle<Consumer>,
}

impl ConsumerHandle {
    /// Ask the loop to stop before its next iteration. Idempotent.
    ///
    /// A callback that is already running is not interrupted.
    pub fn stop(&self) {
        self.cancellation.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Wait for the loop to exit and take the consumer back.
    pub async fn join(self) -> Result<Consumer, JoinError> {
        self.task.await
    }

    pub async fn shutdown(self) -> Result<Consumer, JoinError> {
        self.stop();
        self.join().await
    }
}
