//! Append-only sink for lines that could not be delivered.

use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

/// Placeholder replaced by the current date in failure file paths.
pub const DATE_PLACEHOLDER: &str = "{date}";

/// Substitute [`DATE_PLACEHOLDER`] in `template` with `date` (`YYYY-MM-DD`).
///
/// Paths without the placeholder are returned unchanged.
pub fn resolve_failure_path(template: &Path, date: NaiveDate) -> PathBuf {
    let raw = template.to_string_lossy();
    if !raw.contains(DATE_PLACEHOLDER) {
        return template.to_path_buf();
    }
    PathBuf::from(raw.replace(DATE_PLACEHOLDER, &date.format("%Y-%m-%d").to_string()))
}

/// Append-only file of raw failed lines, one per entry.
///
/// The file is created when absent and never truncated. Every entry is
/// written with a single append and flushed before `record` returns.
pub struct FailureSink {
    file: File,
    path: PathBuf,
    written: u64,
}

impl FailureSink {
    /// Open (or create) the failure file for appending.
    pub async fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        tracing::debug!("Opened failure sink {}", path.display());
        Ok(Self {
            file,
            path,
            written: 0,
        })
    }

    /// Append `raw_line` followed by a line terminator.
    pub async fn record(&mut self, raw_line: &str) -> std::io::Result<()> {
        let mut entry = Vec::with_capacity(raw_line.len() + 1);
        entry.extend_from_slice(raw_line.as_bytes());
        entry.push(b'\n');

        self.file.write_all(&entry).await?;
        self.file.flush().await?;
        self.written += 1;
        Ok(())
    }

    /// Number of entries appended through this handle.
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush and sync the file, returning any error instead of dropping it.
    pub async fn close(mut self) -> std::io::Result<()> {
        self.file.flush().await?;
        self.file.sync_all().await?;
        if self.written > 0 {
            tracing::info!(
                "Wrote {} failed lines to {}",
                self.written,
                self.path.display()
            );
        }
        Ok(())
    }
}
