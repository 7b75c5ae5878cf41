//! Offset storage trait and types
//!
//! This module defines the OffsetStore trait for backend-agnostic offset
//! persistence, plus the on-disk record shape.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::OffsetError;

/// Number of log lines already scanned by previous passes.
///
/// Line numbers are 1-indexed, so an offset of `n` means lines `1..=n` have
/// been handled and the next pass starts at line `n + 1`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LineOffset(u64);

impl LineOffset {
    pub const ZERO: LineOffset = LineOffset(0);

    pub fn new(lines: u64) -> Self {
        Self(lines)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    /// Whether 1-indexed `line` was already covered by this offset.
    pub fn covers(self, line: u64) -> bool {
        line <= self.0
    }
}

impl From<u64> for LineOffset {
    fn from(lines: u64) -> Self {
        Self(lines)
    }
}

impl std::fmt::Display for LineOffset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Offset record as persisted by a backend.
///
/// `updatedAt` is optional on read so that files holding only
/// `{"lastLine": N}` keep loading.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoredOffset {
    /// Last line already processed
    pub last_line: u64,
    /// When the offset was written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl StoredOffset {
    pub fn new(offset: LineOffset) -> Self {
        Self {
            last_line: offset.get(),
            updated_at: Some(Utc::now()),
        }
    }

    pub fn offset(&self) -> LineOffset {
        LineOffset(self.last_line)
    }
}

/// Trait for offset storage operations.
///
/// `store` is expected to replace the previous value wholesale; a crash
/// during `store` must leave either the old or the new value readable.
#[async_trait]
pub trait OffsetStore: Send + Sync {
    /// Read the persisted offset.
    ///
    /// Returns [`LineOffset::ZERO`] when nothing has been persisted yet.
    async fn load(&self) -> Result<LineOffset, OffsetError>;

    /// Persist a new offset, replacing the previous one.
    async fn store(&self, offset: LineOffset) -> Result<(), OffsetError>;
}
