use thiserror::Error;
use tidemq_models::MessageId;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("entry is not pending: {0}")]
    UnknownEntry(MessageId),
    #[error("no idle connection available and wait mode is off")]
    PoolExhausted,
    #[error("store rejected credentials")]
    Unauthorized,
    #[error("internal store error: {0}")]
    Internal(String),
}
