//! log-repush Library
//!
//! Tails a newline-delimited JSON log and republishes every new line to the
//! Kafka topic named in the line itself.
//!
//! # Features
//!
//! - Incremental passes: a persisted line offset marks how far the log has been
//!   republished, so each pass only publishes lines appended since the last one
//! - Failure isolation: malformed or undeliverable lines are appended to a
//!   failure file and never stop a pass
//! - Scheduling: run once, or repeatedly on a cron expression or fixed interval
//!
//! # Crates
//!
//! - `log_repush_jsonl_source` - record decoding and the pass itself
//! - `log_repush_kafka_producer` - the `Publisher` seam and its Kafka implementation
//! - `log_repush_file` - line reader and failure file
//! - `checkpoint` - the persisted line offset
//!
//! # CLI Usage
//!
//! ```bash
//! # One pass
//! log-repush --input app.log --brokers localhost:9092
//!
//! # Every five minutes, failures split by day
//! log-repush --input app.log --brokers localhost:9092 \
//!   --error-file 'failed/{date}.txt' --schedule '*/5 * * * *'
//! ```

use clap::Args;
use std::path::PathBuf;

pub mod config;
mod context;
pub mod schedule;

pub use context::RepushContext;

// Re-export member crates for convenience
pub use checkpoint;
pub use log_repush_jsonl_source as jsonl;
pub use log_repush_kafka_producer as kafka;

#[derive(Args, Clone, Debug)]
pub struct RepushOpts {
    /// Newline-delimited JSON log to republish
    #[arg(long, env = "LOG_REPUSH_INPUT")]
    pub input: PathBuf,

    /// File holding the number of lines already republished
    #[arg(long, default_value = "last_line.json", env = "LOG_REPUSH_OFFSET_FILE")]
    pub offset_file: PathBuf,

    /// File collecting lines that failed to parse or publish.
    /// `{date}` is replaced with the current UTC date (YYYY-MM-DD).
    #[arg(long, default_value = "error.txt", env = "LOG_REPUSH_ERROR_FILE")]
    pub error_file: PathBuf,
}
