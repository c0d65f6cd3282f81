use async_trait::async_trait;
use log::error;
use tidemq_models::{Message, SendableError};

/// Destination for messages that exhausted their retry budget.
#[async_trait]
pub trait DeadLetterQueue: Send + Sync + 'static {
    async fn deliver(&self, message: &Message) -> Result<(), SendableError>;
}

/// Logs the message and reports success, effectively dropping it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingDeadLetterQueue;

impl LoggingDeadLetterQueue {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DeadLetterQueue for LoggingDeadLetterQueue {
    async fn deliver(&self, message: &Message) -> Result<(), SendableError> {
        error!(
            "msg failed beyond retry limit, msg id: {}, key: {}",
            message.id, message.key
        );
        Ok(())
    }
}
