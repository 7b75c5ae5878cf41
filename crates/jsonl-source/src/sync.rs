//! Tail-and-republish pass
//!
//! A pass runs three phases, strictly in order and without concurrency:
//!
//! 1. **Initialize**: load the stored offset, open the log, open the failure sink
//! 2. **Scan**: read every line; lines past the stored offset are parsed and
//!    published, failures go to the sink and never stop the scan
//! 3. **Finalize**: persist the number of lines scanned as the new offset
//!
//! The log is always read from its first line; lines already covered by the
//! stored offset are only counted. Only setup failures and offset persistence
//! failures abort a pass.

use checkpoint::{LineOffset, OffsetError, OffsetStore};
use chrono::Utc;
use log_repush_file::{resolve_failure_path, FailureSink, LineReader, DEFAULT_BUFFER_SIZE};
use log_repush_kafka_producer::{ProducerMessage, Publisher};
use std::path::PathBuf;
use thiserror::Error;

use crate::record::parse_line;

/// Configuration for one tailed log
#[derive(Clone, Debug)]
pub struct Config {
    /// Newline-delimited JSON log to tail
    pub log_path: PathBuf,

    /// Failure file; `{date}` is replaced with the UTC date of each pass
    pub failure_path: PathBuf,

    /// Read buffer size for the log file
    pub buffer_size: usize,
}

impl Config {
    pub fn new(log_path: impl Into<PathBuf>, failure_path: impl Into<PathBuf>) -> Self {
        Self {
            log_path: log_path.into(),
            failure_path: failure_path.into(),
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

/// Outcome of a completed pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Offset loaded at the start of the pass
    pub start_offset: LineOffset,
    /// Offset persisted at the end of the pass (total lines scanned)
    pub end_offset: LineOffset,
    /// Records acknowledged by the publisher
    pub published: u64,
    /// Lines that could not be decoded
    pub parse_failures: u64,
    /// Records the publisher rejected
    pub publish_failures: u64,
    /// Failed lines that could not be written to the failure sink
    pub sink_failures: u64,
}

impl PassReport {
    /// Lines handled by this pass (past the start offset).
    pub fn new_lines(&self) -> u64 {
        self.end_offset.get().saturating_sub(self.start_offset.get())
    }

    /// Lines routed to the failure sink (or attempted).
    pub fn failed(&self) -> u64 {
        self.parse_failures + self.publish_failures
    }
}

/// Errors that abort a pass. None of them advance the offset.
#[derive(Error, Debug)]
pub enum PassError {
    #[error("failed to load offset: {0}")]
    LoadOffset(#[source] OffsetError),

    #[error("failed to open log file {}: {source}", path.display())]
    OpenLog {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open failure file {}: {source}", path.display())]
    OpenFailureSink {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read log file {} at line {line}: {source}", path.display())]
    ReadLog {
        path: PathBuf,
        line: u64,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to store offset {offset}: {source}")]
    StoreOffset {
        offset: LineOffset,
        #[source]
        source: OffsetError,
    },
}

/// Run one pass over `config.log_path`.
///
/// Delivery is at-least-once: the offset is written only after the whole
/// file has been scanned, so a pass that dies midway is repeated in full by
/// the next one.
pub async fn run_pass(
    config: &Config,
    offsets: &dyn OffsetStore,
    publisher: &dyn Publisher,
) -> Result<PassReport, PassError> {
    // Initialize
    let start_offset = offsets.load().await.map_err(PassError::LoadOffset)?;

    let mut reader = LineReader::open(&config.log_path, config.buffer_size)
        .await
        .map_err(|source| PassError::OpenLog {
            path: config.log_path.clone(),
            source,
        })?;

    let failure_path = resolve_failure_path(&config.failure_path, Utc::now().date_naive());
    let mut sink =
        FailureSink::open(&failure_path)
            .await
            .map_err(|source| PassError::OpenFailureSink {
                path: failure_path.clone(),
                source,
            })?;

    tracing::info!(
        "Starting pass over {} after line {}",
        config.log_path.display(),
        start_offset
    );

    // Scan
    let mut report = PassReport {
        start_offset,
        ..Default::default()
    };
    let mut line_no: u64 = 0;

    loop {
        let line = match reader.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(source) => {
                return Err(PassError::ReadLog {
                    path: config.log_path.clone(),
                    line: line_no + 1,
                    source,
                })
            }
        };
        line_no += 1;

        if start_offset.covers(line_no) {
            continue;
        }

        let failed_line = match parse_line(line) {
            Ok(record) => match publisher.publish(&record.topic, &record).await {
                Ok(()) => {
                    report.published += 1;
                    tracing::debug!(
                        topic = %record.topic,
                        key = ?record.key(),
                        "Published line {line_no}"
                    );
                    None
                }
                Err(e) => {
                    report.publish_failures += 1;
                    tracing::warn!("Line {line_no}: failed to publish to {}: {e}", record.topic);
                    Some(String::from_utf8_lossy(line).into_owned())
                }
            },
            Err(e) => {
                report.parse_failures += 1;
                tracing::warn!("Line {line_no}: failed to parse: {e}");
                Some(e.line)
            }
        };

        if let Some(raw) = failed_line {
            if let Err(e) = sink.record(&raw).await {
                report.sink_failures += 1;
                tracing::error!(
                    "Line {line_no}: failed to write to failure file {}: {e}",
                    sink.path().display()
                );
            }
        }
    }

    // Finalize
    let end_offset = LineOffset::new(line_no);
    if end_offset < start_offset {
        tracing::warn!(
            "{} has {} lines but the stored offset is {}; the offset moves back",
            config.log_path.display(),
            end_offset,
            start_offset
        );
    }
    drop(reader);

    offsets
        .store(end_offset)
        .await
        .map_err(|source| PassError::StoreOffset {
            offset: end_offset,
            source,
        })?;
    report.end_offset = end_offset;

    if let Err(e) = sink.close().await {
        tracing::error!(
            "Failed to close failure file {}: {e}",
            failure_path.display()
        );
    }

    tracing::info!(
        "Pass complete: {} new lines, {} published, {} failed ({} parse, {} publish) (offset {} -> {})",
        report.new_lines(),
        report.published,
        report.failed(),
        report.parse_failures,
        report.publish_failures,
        report.start_offset,
        report.end_offset
    );

    Ok(report)
}
