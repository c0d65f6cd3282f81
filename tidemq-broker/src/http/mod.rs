//! JSON-over-HTTP transport for [`StreamStore`](crate::StreamStore).

pub mod client;
pub mod server;
pub mod types;
