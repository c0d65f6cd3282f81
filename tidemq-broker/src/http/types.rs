use serde::{Deserialize, Serialize};
use tidemq_models::{Message, MessageId};

#[derive(Debug, Serialize, Deserialize)]
pub struct AppendRequest {
    pub topic: String,
    pub max_len: usize,
    pub key: String,
    pub value: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AppendResponse {
    pub id: MessageId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReadNewRequest {
    pub group: String,
    pub consumer: String,
    pub topic: String,
    pub block_ms: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReadPendingRequest {
    pub group: String,
    pub consumer: String,
    pub topic: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReadResponse {
    pub messages: Vec<Message>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AckRequest {
    pub topic: String,
    pub group: String,
    pub id: MessageId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AckResponse {
    pub id: MessageId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}
