use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use job_queue_redis::RedisStore;
use job_queue_worker::handler::{EchoHandler, SleepHandler};
use job_queue_worker::{
    assemble_worker, config, EventBus, HandlerRegistry, IsolationMode, WorkerConfig,
};

#[derive(Parser, Debug)]
#[command(name = "jq-worker")]
#[command(about = "Queue-backed job worker", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Redis URL
    #[arg(long)]
    redis: Option<String>,

    /// Comma-separated queue list; overrides QUEUES and the config file
    #[arg(short, long)]
    queues: Option<String>,

    /// Seconds to sleep when every queue is empty
    #[arg(short, long)]
    interval: Option<u64>,

    /// Run job bodies inline, without crash containment
    #[arg(long)]
    inline: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let mut config = match &args.config {
        Some(path) => WorkerConfig::from_file(path)?,
        None => WorkerConfig::default(),
    };

    // Override with CLI args, then the environment
    if let Some(redis) = args.redis {
        config.redis_url = redis;
    }
    if let Some(interval) = args.interval {
        config.interval_secs = interval;
    }
    if args.inline {
        config.isolation = IsolationMode::Inline;
    }
    if let Some(queues) = &args.queues {
        config.queues = config::parse_queue_list(queues);
    } else if std::env::var("QUEUES").is_ok() {
        config.queues = config::queues_from_env();
    }

    let store = Arc::new(RedisStore::connect(&config.redis_url).await?);
    tracing::info!(url = %config.redis_url, "connected to store");

    // Register job handlers
    let registry = HandlerRegistry::new();
    registry.register("echo", EchoHandler);
    registry.register("sleep", SleepHandler::new(1000));
    tracing::info!("registered job classes: {:?}", registry.classes());

    let events = Arc::new(EventBus::new());
    let mut worker = assemble_worker(&config, store, Arc::new(registry), events);
    worker.run().await
}
