//! File access for log-repush
//!
//! This crate provides the two file-backed collaborators of a pass:
//!
//! - **[`LineReader`]**: reads the tailed log one raw line at a time
//! - **[`FailureSink`]**: append-only side file collecting lines that could
//!   not be parsed or published, kept for manual inspection or replay
//!
//! # Example
//!
//! ```ignore
//! use log_repush_file::{FailureSink, LineReader, DEFAULT_BUFFER_SIZE};
//!
//! let mut reader = LineReader::open("app.log", DEFAULT_BUFFER_SIZE).await?;
//! let mut sink = FailureSink::open("error.txt").await?;
//!
//! while let Some(line) = reader.next_line().await? {
//!     if line.is_empty() {
//!         sink.record(&String::from_utf8_lossy(line)).await?;
//!     }
//! }
//! sink.close().await?;
//! ```

mod failure;
mod local;

pub use failure::{resolve_failure_path, FailureSink, DATE_PLACEHOLDER};
pub use local::LineReader;

/// Default buffer size for reading operations (1MB)
pub const DEFAULT_BUFFER_SIZE: usize = 1024 * 1024;
