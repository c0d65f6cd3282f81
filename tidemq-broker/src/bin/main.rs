use log::info;
use std::{env, net::SocketAddr};
use tidemq_broker::{http::server::run_server, in_memory::InMemoryStreamStore};
use tidemq_models::SendableError;
use tidemq_utilities::{startup, LoggerOptions};

#[tokio::main]
async fn main() -> Result<(), SendableError> {
    let logger = LoggerOptions::default()
        .with_level(env::var("TIDEMQ_LOG_LEVEL").unwrap_or_default())
        .with_file_name(env::var("TIDEMQ_LOG_FILE").unwrap_or_default());
    startup::startup("tidemq broker", &logger)?;

    let addr: SocketAddr = env::var("TIDEMQ_BROKER_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:7070".into())
        .parse()?;
    let password = env::var("TIDEMQ_BROKER_PASSWORD").ok();
    if password.as_deref().is_some_and(|p| !p.is_empty()) {
        info!("Bearer token authentication enabled");
    }

    run_server(addr, InMemoryStreamStore::new(), password).await?;
    Ok(())
}
