mod config;

use std::sync::Arc;

use config::{parse_config, Config, StoreBackend};
use log::{error, info};
use tidemq_broker::{http::client::HttpStreamStore, in_memory::InMemoryStreamStore, StreamStore};
use tidemq_client::{handler_fn, Consumer};
use tidemq_models::{Message, RuntimeError, SendableError};
use tidemq_utilities::startup;

#[tokio::main]
async fn main() -> Result<(), SendableError> {
    let config = parse_config();
    startup::startup("tidemq worker", &config.logger)?;
    info!(
        "Consumer {} joining group {} on topic {}",
        config.consumer_id, config.group, config.topic
    );

    let store = build_store(&config)?;
    let consumer = Consumer::builder(&config.topic, &config.group, &config.consumer_id)
        .store(store)
        .handler(handler_fn(log_message))
        .options(config.consumer.clone())
        .build()
        .map_err(|err| RuntimeError::boxed("worker.consumer.config", err.to_string()))?;

    let handle = consumer.start();

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Stopping consumer...");

    match handle.shutdown().await {
        Ok(consumer) => info!(
            "Consumer stopped, {} message(s) still awaiting retry",
            consumer.ledger().len()
        ),
        Err(err) if !err.is_cancelled() => error!("Consumer task join error: {}", err),
        Err(_) => {}
    }

    Ok(())
}

fn build_store(config: &Config) -> Result<Arc<dyn StreamStore>, SendableError> {
    match config.backend {
        StoreBackend::Http => {
            let url = reqwest::Url::parse(&config.endpoint).map_err(|err| {
                RuntimeError::boxed("worker.store.invalid_endpoint", err.to_string())
            })?;
            let store = HttpStreamStore::new(url, config.client.clone())
                .map_err(|err| RuntimeError::boxed("worker.store.client", err.to_string()))?;
            Ok(Arc::new(store))
        }
        StoreBackend::InMemory => Ok(Arc::new(InMemoryStreamStore::new())),
    }
}

async fn log_message(message: Message) -> Result<(), SendableError> {
    info!(
        "receive msg, msg id: {}, msg key: {}, msg val: {}",
        message.id, message.key, message.value
    );
    Ok(())
}
