//! Offset tracking for log-repush
//!
//! Persists how many lines of the tailed log have already been scanned, so
//! that the next pass resumes after them instead of republishing them.
//!
//! # Architecture
//!
//! - [`LineOffset`] is the 1-indexed count of lines already processed
//! - [`OffsetStore`] is the storage-agnostic load/store contract
//! - [`FilesystemStore`] keeps the offset in a small JSON side file
//!
//! An absent offset file is the expected first-run state and loads as
//! [`LineOffset::ZERO`]. A present but unreadable file is an error: silently
//! restarting from zero would republish an unknown range of lines.

mod error;
mod filesystem;
pub mod store;


pub use error::OffsetError;
pub use filesystem::FilesystemStore;
pub use store::{LineOffset, OffsetStore, StoredOffset};
