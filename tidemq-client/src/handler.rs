use std::future::Future;

use async_trait::async_trait;
use tidemq_models::{Message, SendableError};

/// User callback invoked once per delivered message.
///
/// Returning an error leaves the message unacknowledged so it is redelivered.
/// Handlers may see the same message more than once and must be idempotent.
///
/// All callbacks of one batch share the consumer's `handle_timeout` budget.
/// When it runs out the returned future is dropped at its next await point,
/// so work after that point never happens and the message counts as failed.
/// A panic is caught and likewise counts as one failure.
#[async_trait]
pub trait MessageHandler: Send + Sync + 'static {
    async fn handle(&self, message: &Message) -> Result<(), SendableError>;
}

/// Adapter turning an async closure into a [`MessageHandler`].
pub struct FnHandler<F> {
    func: F,
}

pub fn handler_fn<F, Fut>(func: F) -> FnHandler<F>
where
    F: Fn(Message) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), SendableError>> + Send + 'static,
{
    FnHandler { func }
}

#[async_trait]
impl<F, Fut> MessageHandler for FnHandler<F>
where
    F: Fn(Message) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), SendableError>> + Send + 'static,
{
    async fn handle(&self, message: &Message) -> Result<(), SendableError> {
        (self.func)(message.clone()).await
    }
}
