//! Publish/consume API layered over a [`StreamStore`](tidemq_broker::StreamStore).
//!
//! Producers append with a retention cap. Each [`Consumer`] drives one polling
//! loop bound to a (topic, group, consumer id) triple and gives at-least-once
//! delivery: successful messages are acknowledged, failures are counted in a
//! [`RetryLedger`] and redriven from the pending list, and messages that fail
//! `max_retry_limit` times are handed to a [`DeadLetterQueue`] and
//! acknowledged.

pub mod consumer;
pub mod dead_letter;
mod error;
pub mod handler;
pub mod ledger;
pub mod options;
pub mod producer;

pub use consumer::{Consumer, ConsumerBuilder, ConsumerHandle};
pub use dead_letter::{DeadLetterQueue, LoggingDeadLetterQueue};
pub use error::ConsumerError;
pub use handler::{handler_fn, FnHandler, MessageHandler};
pub use ledger::RetryLedger;
pub use options::{ConsumerOptions, ProducerOptions};
pub use producer::Producer;
