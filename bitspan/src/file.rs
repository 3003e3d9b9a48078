//! Read-only file windows backing immutable sequences.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use crate::error::{Error, Result};

/// A byte window into a file. Reads are positioned; the handle is closed
/// when the last sequence referencing the window is dropped.
#[derive(Debug)]
pub(crate) struct FileSource {
    file: Mutex<File>,
    byte_len: u64,
}

impl FileSource {
    /// Open `path` and capture its current length as the window size.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let byte_len = file.metadata()?.len();
        Ok(Self {
            file: Mutex::new(file),
            byte_len,
        })
    }

    /// Window length in bytes.
    pub fn byte_len(&self) -> u64 {
        self.byte_len
    }

    /// Read `buf.len()` bytes starting at `offset` bytes into the window.
    pub fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        if offset + buf.len() as u64 > self.byte_len {
            return Err(Error::out_of_range(format!(
                "byte range {}..{} outside file window of {} bytes",
                offset,
                offset + buf.len() as u64,
                self.byte_len
            )));
        }
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(buf)?;
        Ok(())
    }
}
