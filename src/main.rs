//! Command-line interface for kafkalib
//!
//! # Usage Examples
//!
//! ```bash
//! # Publish one message
//! kafkalib publish --topic orders --message '{"id": 7}'
//!
//! # Publish with a partitioning key
//! kafkalib publish --topic orders --key customer-42 --message '{"id": 8}'
//!
//! # Print records until Ctrl-C, decoding registry-framed Avro
//! KAFKA_SCHEMA_REGISTRY_URL=http://localhost:8081 kafkalib subscribe --topic orders
//!
//! # Stop after 30 seconds
//! kafkalib subscribe --topic orders --timeout 30s
//! ```
//!
//! Broker, group and security settings are read from the `KAFKA_*`
//! environment variables, or from a `.env` file in the working directory.

use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use kafka_types::process_env;
use kafkalib::config::parse_duration;
use kafkalib::{CancellationToken, ConsumerConfig, Message};
use tracing::info;

#[derive(Parser)]
#[command(name = "kafkalib")]
#[command(about = "Publish to and subscribe from Kafka topics")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish a single message
    Publish {
        /// Destination topic
        #[arg(long, env = "KAFKA_TOPIC")]
        topic: String,

        /// Message text
        #[arg(long)]
        message: String,

        /// Partitioning key
        #[arg(long)]
        key: Option<String>,
    },

    /// Print every record received from a topic
    Subscribe {
        /// Topic to consume from
        #[arg(long, env = "KAFKA_TOPIC")]
        topic: String,

        /// Stop after this long (e.g. "300", "30s", "5m", "1h"); runs until
        /// Ctrl-C when omitted
        #[arg(long, value_parser = parse_duration)]
        timeout: Option<Duration>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // `.env` values must be visible to clap's env fallbacks
    kafka_types::load_dotenv();
    let cli = Cli::parse();

    match cli.command {
        Commands::Publish {
            topic,
            message,
            key,
        } => match key {
            Some(key) => kafkalib::publish_keyed(&topic, &key, &message).await?,
            None => kafkalib::publish(&topic, &message).await?,
        },
        Commands::Subscribe { topic, timeout } => run_subscribe(topic, timeout).await?,
    }

    Ok(())
}

async fn run_subscribe(topic: String, timeout: Option<Duration>) -> anyhow::Result<()> {
    let config = ConsumerConfig::from_lookup(|key| {
        if key == "KAFKA_TOPIC" {
            Some(topic.clone())
        } else {
            process_env(key)
        }
    })
    .context("Failed to load consumer configuration")?;

    let token = CancellationToken::new();
    tokio::spawn(kafkalib::cancel_on_ctrl_c(token.clone()));
    if let Some(timeout) = timeout {
        let token = token.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(timeout) => {
                    info!("Timeout of {timeout:?} reached, stopping");
                    token.cancel();
                }
            }
        });
    }

    let stats = kafkalib::subscribe_with(config, print_record, token.clone()).await;
    token.cancel();
    stats.map(|_| ())
}

async fn print_record(message: Message) -> anyhow::Result<()> {
    let line = serde_json::json!({
        "topic": message.topic,
        "partition": message.partition,
        "offset": message.offset,
        "timestamp": message.timestamp,
        "schema_id": message.schema_id(),
        "payload": message.payload_text(),
    });
    println!("{line}");
    Ok(())
}
