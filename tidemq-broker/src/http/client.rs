use crate::{
    http::types::{
        AckRequest, AckResponse, AppendRequest, AppendResponse, ErrorResponse, ReadNewRequest,
        ReadPendingRequest, ReadResponse,
    },
    pool::ConnectionLimiter,
    ClientOptions, StoreError, StreamStore,
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tidemq_models::{Message, MessageId};

/// [`StreamStore`] adapter talking to a remote `tidemq-broker` over HTTP.
///
/// Every request borrows a slot from the connection limiter for its whole
/// round trip; the slot is returned when the request finishes, whether it
/// succeeded or not.
#[derive(Clone)]
pub struct HttpStreamStore {
    client: Client,
    base_url: Url,
    limiter: ConnectionLimiter,
    password: Option<String>,
}

impl HttpStreamStore {
    pub fn new(base_url: Url, options: ClientOptions) -> Result<Self, StoreError> {
        let options = options.repaired();
        let client = Client::builder()
            .pool_max_idle_per_host(options.max_idle)
            .pool_idle_timeout(options.idle_timeout)
            .build()
            .map_err(|err| StoreError::Internal(err.to_string()))?;
        Ok(Self::with_client(base_url, client, options))
    }

    pub fn with_client(base_url: Url, client: Client, options: ClientOptions) -> Self {
        let options = options.repaired();
        Self {
            client,
            base_url,
            limiter: ConnectionLimiter::new(options.max_active, options.wait),
            password: options.password,
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, StoreError> {
        self.base_url
            .join(path)
            .map_err(|err| StoreError::Internal(err.to_string()))
    }

    /// POST `body` to `path`. `Ok(None)` means the store answered with no content.
    async fn call<Req, Resp>(&self, path: &str, body: &Req) -> Result<Option<Resp>, StoreError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        let _slot = self.limiter.acquire().await?;

        let mut request = self.client.post(url).json(body);
        if let Some(password) = &self.password {
            request = request.bearer_auth(password);
        }
        let response = request
            .send()
            .await
            .map_err(|err| StoreError::Internal(err.to_string()))?;

        match response.status() {
            StatusCode::NO_CONTENT => Ok(None),
            status if status.is_success() => response
                .json::<Resp>()
                .await
                .map(Some)
                .map_err(|err| StoreError::Internal(err.to_string())),
            status => {
                let payload = response.json::<ErrorResponse>().await.ok();
                Err(decode_error(status, payload))
            }
        }
    }
}

fn decode_error(status: StatusCode, payload: Option<ErrorResponse>) -> StoreError {
    let Some(payload) = payload else {
        return StoreError::Internal(format!("unexpected store status: {status}"));
    };

    match payload.code.as_str() {
        "invalid_argument" => StoreError::InvalidArgument(payload.message),
        "unknown_entry" => StoreError::UnknownEntry(MessageId::new(payload.message)),
        "unauthorized" => StoreError::Unauthorized,
        "pool_exhausted" => StoreError::PoolExhausted,
        _ => StoreError::Internal(format!("{status}: {}", payload.message)),
    }
}

#[async_trait]
impl StreamStore for HttpStreamStore {
    async fn append(
        &self,
        topic: &str,
        max_len: usize,
        key: &str,
        value: &str,
    ) -> Result<MessageId, StoreError> {
        let request = AppendRequest {
            topic: topic.to_string(),
            max_len,
            key: key.to_string(),
            value: value.to_string(),
        };
        self.call::<_, AppendResponse>("append", &request)
            .await?
            .map(|response| response.id)
            .ok_or_else(|| StoreError::Internal("append returned no entry id".into()))
    }

    async fn read_new(
        &self,
        group: &str,
        consumer: &str,
        topic: &str,
        block: Duration,
    ) -> Result<Option<Vec<Message>>, StoreError> {
        let request = ReadNewRequest {
            group: group.to_string(),
            consumer: consumer.to_string(),
            topic: topic.to_string(),
            block_ms: block.as_millis() as u64,
        };
        Ok(self
            .call::<_, ReadResponse>("read-new", &request)
            .await?
            .map(|response| response.messages)
            .filter(|messages| !messages.is_empty()))
    }

    async fn read_pending(
        &self,
        group: &str,
        consumer: &str,
        topic: &str,
    ) -> Result<Option<Vec<Message>>, StoreError> {
        let request = ReadPendingRequest {
            group: group.to_string(),
            consumer: consumer.to_string(),
            topic: topic.to_string(),
        };
        Ok(self
            .call::<_, ReadResponse>("read-pending", &request)
            .await?
            .map(|response| response.messages)
            .filter(|messages| !messages.is_empty()))
    }

    async fn acknowledge(
        &self,
        topic: &str,
        group: &str,
        id: &MessageId,
    ) -> Result<(), StoreError> {
        let request = AckRequest {
            topic: topic.to_string(),
            group: group.to_string(),
            id: id.clone(),
        };
        self.call::<_, AckResponse>("ack", &request).await?;
        Ok(())
    }
}
