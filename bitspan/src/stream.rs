//! Cursor-based reading over an immutable sequence.

use crate::codec::{self, Endian};
use crate::error::{Error, Result};
use crate::format;
use crate::search;
use crate::value::{Keywords, Value};
use crate::{unpack, Bits};

/// A bit cursor over a borrowed immutable sequence.
///
/// Positions are plain MSB0 offsets in `0..=len`; reads advance the cursor
/// and restore it on failure, peeks never move it. Several readers may
/// borrow the same sequence at once.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    bits: &'a Bits,
    pos: u64,
}

impl<'a> BitReader<'a> {
    /// A reader positioned at bit 0 of `bits`.
    pub fn new(bits: &'a Bits) -> Self {
        Self { bits, pos: 0 }
    }

    /// The current cursor position in bits.
    pub fn pos(&self) -> u64 {
        self.pos
    }

    /// Move the cursor to an absolute position.
    pub fn set_pos(&mut self, pos: u64) -> Result<()> {
        if pos > self.bits.len() {
            return Err(Error::out_of_range(format!(
                "position {pos} past the end of {} bits",
                self.bits.len()
            )));
        }
        self.pos = pos;
        Ok(())
    }

    /// Length of the underlying sequence in bits.
    pub fn len(&self) -> u64 {
        self.bits.len()
    }

    /// Whether the underlying sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Bits between the cursor and the end.
    pub fn remaining(&self) -> u64 {
        self.bits.len() - self.pos
    }

    /// Advance the cursor past `n` bits without interpreting them.
    pub fn skip(&mut self, n: u64) -> Result<()> {
        self.claim(n)?;
        self.pos += n;
        Ok(())
    }

    /// Advance to the next byte boundary, returning the bits skipped (0..8).
    pub fn byte_align(&mut self) -> Result<u64> {
        let skip = (8 - self.pos % 8) % 8;
        self.skip(skip)?;
        Ok(skip)
    }

    fn claim(&self, n: u64) -> Result<()> {
        if self.pos + n > self.bits.len() {
            return Err(Error::out_of_range(format!(
                "reading {n} bits at position {} past the end of {} bits",
                self.pos,
                self.bits.len()
            )));
        }
        Ok(())
    }

    /// Read a single bit.
    pub fn read_bool(&mut self) -> Result<bool> {
        self.claim(1)?;
        let value = codec::decode_bool(&self.bits.view(), self.pos)?;
        self.pos += 1;
        Ok(value)
    }

    /// Read an unsigned integer of `bits` bits, big-endian bit order.
    pub fn read_uint(&mut self, bits: u64) -> Result<u64> {
        self.claim(bits)?;
        let value = codec::decode_uint(&self.bits.view(), self.pos, bits)?;
        self.pos += bits;
        Ok(value)
    }

    /// Read a signed two's complement integer of `bits` bits.
    pub fn read_int(&mut self, bits: u64) -> Result<i64> {
        self.claim(bits)?;
        let value = codec::decode_int(&self.bits.view(), self.pos, bits)?;
        self.pos += bits;
        Ok(value)
    }

    /// Read an unsigned integer of whole little-endian bytes.
    pub fn read_uint_le(&mut self, bits: u64) -> Result<u64> {
        self.claim(bits)?;
        let value = codec::decode_uint_endian(&self.bits.view(), self.pos, bits, Endian::Little)?;
        self.pos += bits;
        Ok(value)
    }

    /// Read a signed integer of whole little-endian bytes.
    pub fn read_int_le(&mut self, bits: u64) -> Result<i64> {
        self.claim(bits)?;
        let value = codec::decode_int_endian(&self.bits.view(), self.pos, bits, Endian::Little)?;
        self.pos += bits;
        Ok(value)
    }

    /// Read an IEEE 754 float of 16, 32 or 64 bits, big-endian.
    pub fn read_float(&mut self, bits: u64) -> Result<f64> {
        self.claim(bits)?;
        let value = codec::decode_float(&self.bits.view(), self.pos, bits, Endian::Big)?;
        self.pos += bits;
        Ok(value)
    }

    /// Read `n` whole bytes.
    pub fn read_bytes(&mut self, n: u64) -> Result<Vec<u8>> {
        self.claim(n * 8)?;
        let value = codec::decode_bytes(&self.bits.view(), self.pos, n * 8)?;
        self.pos += n * 8;
        Ok(value)
    }

    /// Read `n` bits as a shared slice of the underlying sequence.
    pub fn read_bits(&mut self, n: u64) -> Result<Bits> {
        self.claim(n)?;
        let value = self.bits.slice(self.pos..self.pos + n)?;
        self.pos += n;
        Ok(value)
    }

    /// Read an unsigned exp-Golomb code.
    pub fn read_ue(&mut self) -> Result<u64> {
        let (value, used) = codec::decode_ue(&self.bits.view(), self.pos)?;
        self.pos += used;
        Ok(value)
    }

    /// Read a signed exp-Golomb code.
    pub fn read_se(&mut self) -> Result<i64> {
        let (value, used) = codec::decode_se(&self.bits.view(), self.pos)?;
        self.pos += used;
        Ok(value)
    }

    /// Read an unsigned interleaved exp-Golomb code.
    pub fn read_uie(&mut self) -> Result<u64> {
        let (value, used) = codec::decode_uie(&self.bits.view(), self.pos)?;
        self.pos += used;
        Ok(value)
    }

    /// Read a signed interleaved exp-Golomb code.
    pub fn read_sie(&mut self) -> Result<i64> {
        let (value, used) = codec::decode_sie(&self.bits.view(), self.pos)?;
        self.pos += used;
        Ok(value)
    }

    /// Read every token of `format` at the cursor, advancing past the
    /// consumed bits on success.
    pub fn read_fmt(&mut self, format: &str) -> Result<Vec<Value>> {
        self.read_fmt_with(format, &Keywords::new())
    }

    /// [`BitReader::read_fmt`] with keyword arguments.
    pub fn read_fmt_with(&mut self, format: &str, keywords: &Keywords) -> Result<Vec<Value>> {
        let tokens = format::compile(format)?;
        let resolved = format::resolve(&tokens, keywords)?;
        let mut pos = self.pos;
        let values = unpack::read_tokens(&self.bits.view(), &mut pos, &resolved)?;
        self.pos = pos;
        Ok(values)
    }

    /// Read a format without moving the cursor.
    pub fn peek_fmt(&mut self, format: &str) -> Result<Vec<Value>> {
        self.peek_fmt_with(format, &Keywords::new())
    }

    /// [`BitReader::peek_fmt`] with keyword arguments.
    pub fn peek_fmt_with(&mut self, format: &str, keywords: &Keywords) -> Result<Vec<Value>> {
        let tokens = format::compile(format)?;
        let resolved = format::resolve(&tokens, keywords)?;
        let mut pos = self.pos;
        unpack::read_tokens(&self.bits.view(), &mut pos, &resolved)
    }

    /// Read an unsigned integer without moving the cursor.
    pub fn peek_uint(&mut self, bits: u64) -> Result<u64> {
        self.claim(bits)?;
        codec::decode_uint(&self.bits.view(), self.pos, bits)
    }

    /// Read `n` bits without moving the cursor.
    pub fn peek_bits(&mut self, n: u64) -> Result<Bits> {
        self.claim(n)?;
        self.bits.slice(self.pos..self.pos + n)
    }

    /// Find `pattern` at or after the cursor. On success the cursor moves to
    /// the match position. Positions are MSB0 regardless of the process-wide
    /// numbering mode.
    pub fn find(&mut self, pattern: &Bits, byte_aligned: bool) -> Result<Option<u64>> {
        let pat = pattern.view().extract(0, pattern.len())?;
        let found = search::find_in(
            &self.bits.view(),
            &pat,
            pattern.len(),
            self.pos,
            self.bits.len(),
            byte_aligned,
        )?;
        if let Some(pos) = found {
            self.pos = pos;
        }
        Ok(found)
    }

    /// Advance through and including the next occurrence of `pattern`,
    /// returning the span from the old cursor through the end of the match.
    pub fn read_to(&mut self, pattern: &Bits, byte_aligned: bool) -> Result<Bits> {
        let start = self.pos;
        match self.find(pattern, byte_aligned)? {
            Some(pos) => {
                self.pos = pos + pattern.len();
                self.bits.slice(start..self.pos)
            }
            None => {
                self.pos = start;
                Err(Error::out_of_range("pattern not found before the end"))
            }
        }
    }
}
