use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or persisting a line offset.
#[derive(Error, Debug)]
pub enum OffsetError {
    #[error("failed to read offset file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("offset file {} is corrupt: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write offset file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl OffsetError {
    /// True when the offset file exists but its content could not be decoded.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, OffsetError::Decode { .. })
    }
}
