use std::{
    io::{self, SeekFrom},
    path::Path,
};

use tokio::{
    fs::{File, OpenOptions},
    io::{AsyncSeekExt, AsyncWriteExt},
};

use crate::download::ByteRange;

/// Write access to one range of the output file.
///
/// Each writer opens its own handle, so concurrent writers never share a
/// cursor. Writes are accepted only inside `[range.start, range.end]`.
#[derive(Debug)]
pub struct RangeWriter {
    file: File,
    range: ByteRange,
    written: u64,
}

impl RangeWriter {
    /// Opens the already allocated file at `path` and positions it at the
    /// start of `range`. The file is never created or extended here.
    pub async fn open(path: &Path, range: ByteRange) -> io::Result<Self> {
        let mut file = OpenOptions::new().write(true).open(path).await?;
        file.seek(SeekFrom::Start(range.start)).await?;
        Ok(RangeWriter {
            file,
            range,
            written: 0,
        })
    }

    pub async fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        if bytes.len() as u64 > self.remaining() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "write of {} bytes overflows range {}-{} at offset {}",
                    bytes.len(),
                    self.range.start,
                    self.range.end,
                    self.range.start + self.written
                ),
            ));
        }
        self.file.write_all(bytes).await?;
        self.written += bytes.len() as u64;
        Ok(())
    }

    /// Bytes written into the range so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn remaining(&self) -> u64 {
        self.range.len() - self.written
    }

    /// Flushes pending writes and returns the number of bytes written.
    pub async fn finish(mut self) -> io::Result<u64> {
        self.file.flush().await?;
        Ok(self.written)
    }
}
