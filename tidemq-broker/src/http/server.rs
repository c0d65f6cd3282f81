use crate::{
    http::types::{
        AckRequest, AckResponse, AppendRequest, AppendResponse, ErrorResponse, ReadNewRequest,
        ReadPendingRequest, ReadResponse,
    },
    StoreError, StreamStore,
};
use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use log::{debug, info};
use serde::Serialize;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tidemq_models::Message;
use tokio::net::TcpListener;

/// Upper bound on how long a single `/read-new` request may hold the connection.
const MAX_BLOCK: Duration = Duration::from_secs(60);

struct AppState<S> {
    store: Arc<S>,
    password: Option<Arc<str>>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            password: self.password.clone(),
        }
    }
}

impl<S> AppState<S> {
    fn authorized(&self, headers: &HeaderMap) -> bool {
        let Some(password) = &self.password else {
            return true;
        };
        headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .is_some_and(|token| token == &**password)
    }
}

pub async fn run_server<S>(
    addr: SocketAddr,
    store: S,
    password: Option<String>,
) -> Result<(), std::io::Error>
where
    S: StreamStore,
{
    let listener = TcpListener::bind(addr).await?;
    serve(listener, store, password).await
}

/// Serve `store` on an already bound listener.
pub async fn serve<S>(
    listener: TcpListener,
    store: S,
    password: Option<String>,
) -> Result<(), std::io::Error>
where
    S: StreamStore,
{
    info!("Stream store listening on {}", listener.local_addr()?);
    axum::serve(listener, router(store, password)).await
}

pub fn router<S>(store: S, password: Option<String>) -> Router
where
    S: StreamStore,
{
    let state = AppState {
        store: Arc::new(store),
        password: password.filter(|p| !p.is_empty()).map(Arc::from),
    };

    Router::new()
        .route("/append", post(append::<S>))
        .route("/read-new", post(read_new::<S>))
        .route("/read-pending", post(read_pending::<S>))
        .route("/ack", post(ack::<S>))
        .with_state(state)
}

async fn append<S>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    Json(request): Json<AppendRequest>,
) -> Response
where
    S: StreamStore,
{
    if !state.authorized(&headers) {
        return error_response(StoreError::Unauthorized);
    }

    match state
        .store
        .append(&request.topic, request.max_len, &request.key, &request.value)
        .await
    {
        Ok(id) => json_response(StatusCode::CREATED, AppendResponse { id }),
        Err(err) => error_response(err),
    }
}

async fn read_new<S>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    Json(request): Json<ReadNewRequest>,
) -> Response
where
    S: StreamStore,
{
    if !state.authorized(&headers) {
        return error_response(StoreError::Unauthorized);
    }

    let block = Duration::from_millis(request.block_ms).min(MAX_BLOCK);
    debug!(
        "read-new group={} consumer={} topic={} block={:?}",
        request.group, request.consumer, request.topic, block
    );
    read_response(
        state
            .store
            .read_new(&request.group, &request.consumer, &request.topic, block)
            .await,
    )
}

async fn read_pending<S>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    Json(request): Json<ReadPendingRequest>,
) -> Response
where
    S: StreamStore,
{
    if !state.authorized(&headers) {
        return error_response(StoreError::Unauthorized);
    }

    read_response(
        state
            .store
            .read_pending(&request.group, &request.consumer, &request.topic)
            .await,
    )
}

async fn ack<S>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    Json(request): Json<AckRequest>,
) -> Response
where
    S: StreamStore,
{
    if !state.authorized(&headers) {
        return error_response(StoreError::Unauthorized);
    }

    match state
        .store
        .acknowledge(&request.topic, &request.group, &request.id)
        .await
    {
        Ok(()) => json_response(StatusCode::OK, AckResponse { id: request.id }),
        Err(err) => error_response(err),
    }
}

fn read_response(result: Result<Option<Vec<Message>>, StoreError>) -> Response {
    match result {
        Ok(Some(messages)) => json_response(StatusCode::OK, ReadResponse { messages }),
        Ok(None) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: StoreError) -> Response {
    match err {
        StoreError::InvalidArgument(message) => json_response(
            StatusCode::BAD_REQUEST,
            ErrorResponse::new("invalid_argument", message),
        ),
        StoreError::UnknownEntry(id) => json_response(
            StatusCode::NOT_FOUND,
            ErrorResponse::new("unknown_entry", id.to_string()),
        ),
        StoreError::Unauthorized => json_response(
            StatusCode::UNAUTHORIZED,
            ErrorResponse::new("unauthorized", "missing or invalid bearer token"),
        ),
        StoreError::PoolExhausted => json_response(
            StatusCode::SERVICE_UNAVAILABLE,
            ErrorResponse::new("pool_exhausted", StoreError::PoolExhausted.to_string()),
        ),
        StoreError::Internal(message) => json_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorResponse::new("internal", message),
        ),
    }
}

fn json_response<T>(status: StatusCode, payload: T) -> Response
where
    T: Serialize,
{
    (status, Json(payload)).into_response()
}
