//! JSONL tail-and-republish for log-repush
//!
//! This crate reads a newline-delimited JSON log, decodes every line that a
//! previous pass has not yet seen into a [`Record`], and republishes it to the
//! record's topic. Lines that fail to parse or publish are appended to a
//! failure file, and the scanned line count is persisted once the pass ends.

pub mod record;
mod sync;

pub use record::{parse_line, ParseError, ParseErrorKind, Record};
pub use sync::{run_pass, Config, PassError, PassReport};

// Re-export collaborator types for convenience
pub use checkpoint::{LineOffset, OffsetStore};
pub use log_repush_file::DEFAULT_BUFFER_SIZE;
pub use log_repush_kafka_producer::Publisher;
