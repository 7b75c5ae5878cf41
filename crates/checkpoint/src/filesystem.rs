//! Filesystem-based offset storage implementation.

use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::store::{LineOffset, OffsetStore, StoredOffset};
use crate::OffsetError;

/// Filesystem implementation of OffsetStore trait.
///
/// Stores the offset as a single JSON document. Writes go to a temporary
/// sibling file which is fsynced and then renamed over the target.
pub struct FilesystemStore {
    path: PathBuf,
}

impl FilesystemStore {
    /// Create a new FilesystemStore backed by the given file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the offset file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_err(&self, source: std::io::Error) -> OffsetError {
        OffsetError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl OffsetStore for FilesystemStore {
    async fn load(&self) -> Result<LineOffset, OffsetError> {
        let content = match std::fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(
                    "No offset file at {}, starting from line 1",
                    self.path.display()
                );
                return Ok(LineOffset::ZERO);
            }
            Err(source) => {
                return Err(OffsetError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let stored: StoredOffset =
            serde_json::from_slice(&content).map_err(|source| OffsetError::Decode {
                path: self.path.clone(),
                source,
            })?;

        tracing::debug!(
            "Loaded offset {} from {}",
            stored.last_line,
            self.path.display()
        );
        Ok(stored.offset())
    }

    async fn store(&self, offset: LineOffset) -> Result<(), OffsetError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|e| self.write_err(e))?;

        let stored = StoredOffset::new(offset);
        let body = serde_json::to_vec(&stored)
            .map_err(|e| self.write_err(std::io::Error::other(e)))?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| self.write_err(e))?;
        tmp.write_all(&body).map_err(|e| self.write_err(e))?;
        tmp.flush().map_err(|e| self.write_err(e))?;
        tmp.as_file().sync_all().map_err(|e| self.write_err(e))?;
        tmp.persist(&self.path).map_err(|e| self.write_err(e.error))?;

        tracing::info!("Stored offset {} to {}", offset, self.path.display());
        Ok(())
    }
}
