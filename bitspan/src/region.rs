//! Uniform read surface over memory- and file-backed bit regions.
//!
//! Every component that reads bits does so through a [`View`]: a borrowed
//! `(source, start, len)` triple addressing a contiguous bit region. Memory
//! sources are read in place; file sources are read through their window in
//! byte ranges. Views never mutate.

use bitspan_types::bytes;

use crate::error::{Error, Result};
use crate::file::FileSource;

/// Bits compared or scanned per chunk when a region cannot be processed in
/// one piece.
pub(crate) const CHUNK_BITS: u64 = 1 << 15;

#[derive(Clone, Copy)]
pub(crate) enum ViewSrc<'a> {
    Mem(&'a [u8]),
    File(&'a FileSource),
}

/// A borrowed read-only bit region.
#[derive(Clone, Copy)]
pub(crate) struct View<'a> {
    src: ViewSrc<'a>,
    start: u64,
    len: u64,
}

impl<'a> View<'a> {
    pub fn new(src: ViewSrc<'a>, start: u64, len: u64) -> Self {
        Self { src, start, len }
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    /// Narrow the view to `[pos, pos + len)` of itself.
    pub fn sub(&self, pos: u64, len: u64) -> Result<View<'a>> {
        self.check(pos, len)?;
        Ok(View {
            src: self.src,
            start: self.start + pos,
            len,
        })
    }

    fn check(&self, pos: u64, len: u64) -> Result<()> {
        if pos + len > self.len {
            return Err(Error::out_of_range(format!(
                "bit range {}..{} outside sequence of {} bits",
                pos,
                pos + len,
                self.len
            )));
        }
        Ok(())
    }

    /// Read the bit at `pos`.
    pub fn get(&self, pos: u64) -> Result<bool> {
        self.check(pos, 1)?;
        let abs = self.start + pos;
        match self.src {
            ViewSrc::Mem(data) => Ok(bytes::get_bit(data, abs)),
            ViewSrc::File(fs) => {
                let mut byte = [0u8];
                fs.read_at(abs / 8, &mut byte)?;
                Ok(bytes::get_bit(&byte, abs % 8))
            }
        }
    }

    /// Copy `[pos, pos + len)` into a fresh zero-offset buffer with padded
    /// tail bits zeroed.
    pub fn extract(&self, pos: u64, len: u64) -> Result<Vec<u8>> {
        self.check(pos, len)?;
        if len == 0 {
            return Ok(Vec::new());
        }
        let abs = self.start + pos;
        match self.src {
            ViewSrc::Mem(data) => Ok(bytes::extract_bits(data, abs, len)),
            ViewSrc::File(fs) => {
                let first = abs / 8;
                let offset = abs % 8;
                let mut raw = vec![0u8; bytes::byte_len(offset, len)];
                fs.read_at(first, &mut raw)?;
                Ok(bytes::extract_bits(&raw, offset, len))
            }
        }
    }

    /// Read `count` raw bytes of the referenced buffer range starting at
    /// byte `first`, without shifting out the sub-byte offset.
    pub fn raw_bytes(&self, first: u64, count: u64) -> Result<Vec<u8>> {
        let total = bytes::byte_len(self.start % 8, self.len) as u64;
        if first + count > total {
            return Err(Error::out_of_range(format!(
                "byte range {}..{} outside a region of {} bytes",
                first,
                first + count,
                total
            )));
        }
        let base = self.start / 8 + first;
        match self.src {
            ViewSrc::Mem(data) => {
                Ok(data[base as usize..(base + count) as usize].to_vec())
            }
            ViewSrc::File(fs) => {
                let mut raw = vec![0u8; count as usize];
                fs.read_at(base, &mut raw)?;
                Ok(raw)
            }
        }
    }

    /// Count consecutive zero bits from `pos`, stopping at the first one bit
    /// or the end of the region.
    pub fn count_zeros_from(&self, pos: u64) -> Result<u64> {
        self.check(pos, 0)?;
        match self.src {
            ViewSrc::Mem(data) => Ok(bytes::count_zeros_from(
                data,
                self.start + pos,
                self.start + self.len,
            )),
            ViewSrc::File(_) => {
                let mut total = 0;
                let mut at = pos;
                while at < self.len {
                    let step = CHUNK_BITS.min(self.len - at);
                    let chunk = self.extract(at, step)?;
                    let zeros = bytes::count_zeros_from(&chunk, 0, step);
                    total += zeros;
                    if zeros < step {
                        break;
                    }
                    at += step;
                }
                Ok(total)
            }
        }
    }

    /// Content equality against another view of the same length.
    pub fn eq_view(&self, other: &View<'_>) -> Result<bool> {
        if self.len != other.len {
            return Ok(false);
        }
        let mut at = 0;
        while at < self.len {
            let step = CHUNK_BITS.min(self.len - at);
            if self.extract(at, step)? != other.extract(at, step)? {
                return Ok(false);
            }
            at += step;
        }
        Ok(true)
    }
}
