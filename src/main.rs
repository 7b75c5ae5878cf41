//! Command-line interface for log-repush
//!
//! # Usage Examples
//!
//! ## One Pass
//! ```bash
//! log-repush --input /var/log/app/events.log \
//!   --offset-file /var/lib/log-repush/last_line.json \
//!   --error-file /var/log/app/repush-errors.txt \
//!   --brokers kafka-1:9092,kafka-2:9092
//! ```
//!
//! ## Scheduled
//! ```bash
//! # Every minute, cron syntax
//! log-repush --input events.log --brokers localhost:9092 --schedule '* * * * *'
//!
//! # Every 30 seconds
//! log-repush --input events.log --brokers localhost:9092 --schedule '@every 30s'
//! ```
//!
//! ## Environment
//! Every flag has an environment fallback: `LOG_REPUSH_INPUT`,
//! `LOG_REPUSH_OFFSET_FILE`, `LOG_REPUSH_ERROR_FILE`, `LOG_REPUSH_SCHEDULE`,
//! `KAFKA_BROKERS`. Log verbosity follows `RUST_LOG`.

use anyhow::Context;
use clap::Parser;
use log_repush::kafka::ProducerOpts;
use log_repush::schedule::{shutdown_signal, Trigger};
use log_repush::{RepushContext, RepushOpts};

#[derive(Parser)]
#[command(name = "log-repush")]
#[command(about = "Republish new lines of a JSON log to Kafka")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    repush: RepushOpts,

    #[command(flatten)]
    producer: ProducerOpts,

    /// Run repeatedly: a cron expression, a descriptor such as `@hourly`,
    /// or `@every <duration>`. Without it a single pass is run.
    #[arg(long, env = "LOG_REPUSH_SCHEDULE")]
    schedule: Option<String>,
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

    let cli = Cli::parse();

    let trigger = cli
        .schedule
        .as_deref()
        .map(str::parse::<Trigger>)
        .transpose()?;

    let context = RepushContext::from_opts(&cli.repush, &cli.producer)?;

    let result = match trigger {
        None => context
            .run_pass()
            .await
            .map(|_| ())
            .context("Republish pass failed"),
        Some(trigger) => {
            tracing::info!("Running on schedule '{}'", cli.schedule.unwrap_or_default());
            let passes = context.run_scheduled(&trigger, shutdown_signal()).await;
            tracing::info!("Schedule stopped after {passes} passes");
            Ok(())
        }
    };

    // Always flush, even when the pass failed
    if let Err(e) = context.shutdown().await {
        tracing::error!("{e:#}");
    }

    result
}
