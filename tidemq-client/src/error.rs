use thiserror::Error;

/// Reasons a [`Consumer`](crate::Consumer) refuses to be built.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConsumerError {
    #[error("message handler can not be empty")]
    MissingHandler,
    #[error("stream store can not be empty")]
    MissingStore,
    #[error("topic can not be empty")]
    EmptyTopic,
    #[error("group id can not be empty")]
    EmptyGroup,
    #[error("consumer id can not be empty")]
    EmptyConsumerId,
}
