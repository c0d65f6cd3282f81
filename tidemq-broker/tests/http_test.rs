//! Round trips through the HTTP transport against an in-memory store.

use std::time::Duration;

use anyhow::Result;
use reqwest::Url;
use tidemq_broker::{
    http::{client::HttpStreamStore, server::serve},
    in_memory::InMemoryStreamStore,
    ClientOptions, StoreError, StreamStore,
};
use tokio::net::TcpListener;

const TOPIC: &str = "test_topic";
const GROUP: &str = "test_group_id";
const CONSUMER: &str = "test_consumer_id";

async fn spawn_server(password: Option<&str>) -> Result<(Url, InMemoryStreamStore)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let store = InMemoryStreamStore::new();
    let served = store.clone();
    let password = password.map(str::to_string);
    tokio::spawn(async move { serve(listener, served, password).await });
    Ok((Url::parse(&format!("http://{addr}/"))?, store))
}

#[tokio::test]
async fn append_read_and_ack_over_http() -> Result<()> {
    let (url, backing) = spawn_server(None).await?;
    let remote = HttpStreamStore::new(url, ClientOptions::default())?;

    let id = remote.append(TOPIC, 10, "test_key", "test_val").await?;
    assert_eq!(backing.topic_len(TOPIC), 1);

    let batch = remote
        .read_new(GROUP, CONSUMER, TOPIC, Duration::from_millis(50))
        .await?
        .expect("one new message");
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].id, id);
    assert_eq!(batch[0].key, "test_key");
    assert_eq!(batch[0].value, "test_val");

    let pending = remote.read_pending(GROUP, CONSUMER, TOPIC).await?;
    assert_eq!(pending.map(|messages| messages.len()), Some(1));

    remote.acknowledge(TOPIC, GROUP, &id).await?;
    assert!(remote.read_pending(GROUP, CONSUMER, TOPIC).await?.is_none());

    let again = remote.acknowledge(TOPIC, GROUP, &id).await;
    assert!(matches!(again, Err(StoreError::UnknownEntry(unknown)) if unknown == id));
    Ok(())
}

#[tokio::test]
async fn empty_read_maps_to_no_message() -> Result<()> {
    let (url, _backing) = spawn_server(None).await?;
    let remote = HttpStreamStore::new(url, ClientOptions::default())?;

    let batch = remote
        .read_new(GROUP, CONSUMER, TOPIC, Duration::from_millis(20))
        .await?;
    assert!(batch.is_none());
    Ok(())
}

#[tokio::test]
async fn invalid_arguments_surface_as_invalid_argument() -> Result<()> {
    let (url, _backing) = spawn_server(None).await?;
    let remote = HttpStreamStore::new(url, ClientOptions::default())?;

    let result = remote.append("", 10, "k", "v").await;
    assert!(matches!(result, Err(StoreError::InvalidArgument(_))));
    Ok(())
}

#[tokio::test]
async fn password_protected_server_rejects_anonymous_clients() -> Result<()> {
    let (url, _backing) = spawn_server(Some("hunter2")).await?;

    let anonymous = HttpStreamStore::new(url.clone(), ClientOptions::default())?;
    let result = anonymous.append(TOPIC, 10, "k", "v").await;
    assert!(matches!(result, Err(StoreError::Unauthorized)));

    let authorized =
        HttpStreamStore::new(url, ClientOptions::default().with_password("hunter2"))?;
    authorized.append(TOPIC, 10, "k", "v").await?;
    Ok(())
}
