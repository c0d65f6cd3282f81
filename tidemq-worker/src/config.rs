use std::time::Duration;

use clap::{Parser, ValueEnum};
use tidemq_broker::ClientOptions;
use tidemq_client::ConsumerOptions;
use tidemq_utilities::LoggerOptions;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum StoreBackend {
    Http,
    InMemory,
}

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Stream store implementation to consume from
    #[arg(long, value_enum, default_value_t = StoreBackend::Http)]
    pub backend: StoreBackend,

    /// Base URL of the tidemq broker (used when --backend=http)
    #[arg(long, default_value = "http://127.0.0.1:7070/")]
    pub endpoint: String,

    /// Bearer token expected by the broker
    #[arg(long)]
    pub password: Option<String>,

    #[arg(long)]
    pub topic: String,

    #[arg(long)]
    pub group: String,

    /// Consumer identity within the group, defaults to a random uuid
    #[arg(long)]
    pub consumer_id: Option<String>,

    /// How long each read for new messages blocks
    #[arg(long, default_value_t = 2000)]
    pub poll_timeout_ms: u64,

    /// Failures after which a message is dead-lettered
    #[arg(long, default_value_t = 3)]
    pub max_retry_limit: u32,

    #[arg(long, default_value_t = 1000)]
    pub handle_timeout_ms: u64,

    #[arg(long, default_value_t = 1000)]
    pub dead_letter_timeout_ms: u64,

    #[arg(long, default_value_t = 20)]
    pub pool_max_idle: usize,

    #[arg(long, default_value_t = 10)]
    pub pool_idle_timeout_seconds: u64,

    /// Concurrent broker requests, 0 for unlimited
    #[arg(long, default_value_t = 100)]
    pub pool_max_active: usize,

    /// Wait for a free connection instead of failing when the pool is saturated
    #[arg(long, default_value_t = false)]
    pub pool_wait: bool,

    #[arg(long, default_value = "info")]
    pub log_level: String,

    #[arg(long, default_value = "tidemq-worker.log")]
    pub log_file: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend: StoreBackend,
    pub endpoint: String,
    pub topic: String,
    pub group: String,
    pub consumer_id: String,
    pub client: ClientOptions,
    pub consumer: ConsumerOptions,
    pub logger: LoggerOptions,
}

pub fn parse_config() -> Config {
    Config::from(CliArgs::parse())
}

impl From<CliArgs> for Config {
    fn from(args: CliArgs) -> Self {
        let consumer_id = args
            .consumer_id
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let mut client = ClientOptions::default()
            .with_max_idle(args.pool_max_idle)
            .with_idle_timeout(Duration::from_secs(args.pool_idle_timeout_seconds))
            .with_max_active(args.pool_max_active);
        if args.pool_wait {
            client = client.with_wait_mode();
        }
        if let Some(password) = args.password {
            client = client.with_password(password);
        }

        let consumer = ConsumerOptions::default()
            .with_poll_timeout(Duration::from_millis(args.poll_timeout_ms))
            .with_max_retry_limit(args.max_retry_limit)
            .with_handle_timeout(Duration::from_millis(args.handle_timeout_ms))
            .with_dead_letter_timeout(Duration::from_millis(args.dead_letter_timeout_ms));

        Config {
            backend: args.backend,
            endpoint: args.endpoint,
            topic: args.topic,
            group: args.group,
            consumer_id,
            client: client.repaired(),
            consumer,
            logger: LoggerOptions::default()
                .with_level(args.log_level)
                .with_file_name(args.log_file),
        }
    }
}
