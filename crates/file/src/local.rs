//! Local filesystem log reader implementation

use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Reads a local file line by line with configurable buffering.
///
/// Lines are returned as raw bytes without their terminator (`\n` or
/// `\r\n`). A final line without a terminator is still returned. Invalid
/// UTF-8 is passed through untouched so callers decide how to handle it.
pub struct LineReader {
    reader: BufReader<File>,
    line: Vec<u8>,
    lines_read: u64,
}

impl LineReader {
    /// Open a local file for line-by-line reading
    ///
    /// # Arguments
    /// * `path` - Path to the file
    /// * `buffer_size` - Size of the read buffer in bytes
    pub async fn open(path: impl AsRef<Path>, buffer_size: usize) -> std::io::Result<Self> {
        let file = File::open(path).await?;
        Ok(Self {
            reader: BufReader::with_capacity(buffer_size, file),
            line: Vec::new(),
            lines_read: 0,
        })
    }

    /// Read the next line, or `None` at end of file.
    pub async fn next_line(&mut self) -> std::io::Result<Option<&[u8]>> {
        self.line.clear();
        let n = self.reader.read_until(b'\n', &mut self.line).await?;
        if n == 0 {
            return Ok(None);
        }

        if self.line.last() == Some(&b'\n') {
            self.line.pop();
            if self.line.last() == Some(&b'\r') {
                self.line.pop();
            }
        }

        self.lines_read += 1;
        Ok(Some(&self.line))
    }

    /// Number of lines returned so far.
    pub fn lines_read(&self) -> u64 {
        self.lines_read
    }
}
