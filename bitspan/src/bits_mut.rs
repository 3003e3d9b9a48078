//! The mutable bit sequence.

use std::ops::{BitAndAssign, BitOrAssign, BitXorAssign, RangeBounds};

use crate::bits::resolve_bounds;
use crate::codec::{self, Endian};
use crate::editor::{self, SwapPattern};
use crate::error::{Error, Result};
use crate::format;
use crate::order;
use crate::store::Store;
use crate::unpack;
use crate::value::{Keywords, Value};
use crate::Bits;

/// A mutable sequence of bits with an embedded read cursor.
///
/// A mutable sequence owns its buffer exclusively; it is never file backed
/// and never shares storage. Destructive edits are transactional per call
/// and reset the cursor to 0 whenever the length changes, except for
/// inserts and overwrites, which leave it just past the written bits.
/// Concurrent mutation is the caller's responsibility to synchronize.
#[derive(Debug, Clone, Default)]
pub struct BitsMut {
    store: Store,
    pos: u64,
}

impl BitsMut {
    /// The empty mutable sequence.
    pub fn new() -> Self {
        BitsMut::default()
    }

    /// A mutable sequence of `len` zero bits.
    pub fn zeros(len: u64) -> Self {
        BitsMut::from_store(Store::zeros(len))
    }

    /// A mutable sequence of `len` one bits.
    pub fn ones(len: u64) -> Self {
        BitsMut::from_store(Store::ones(len))
    }

    /// A mutable sequence over whole bytes.
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        BitsMut::from_store(Store::from_bytes(data.into()))
    }

    /// Build from a format string whose tokens all carry their values.
    pub fn parse(format: &str) -> Result<Self> {
        Bits::parse(format)?.to_mut()
    }

    pub(crate) fn from_store(store: Store) -> Self {
        BitsMut { store, pos: 0 }
    }

    /// Freeze into an immutable sequence without copying.
    pub fn freeze(self) -> Bits {
        Bits::from_store(self.store)
    }

    /// An immutable copy of the current contents.
    pub fn snapshot(&self) -> Bits {
        Bits::from_store(self.store.clone())
    }

    /// Length in bits.
    pub fn len(&self) -> u64 {
        self.store.len()
    }

    /// Whether the sequence has no bits.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    fn check_pos(&self, pos: u64) -> Result<u64> {
        if pos >= self.len() {
            return Err(Error::out_of_range(format!(
                "bit {pos} of a {} bit sequence",
                self.len()
            )));
        }
        Ok(order::pos_in(self.len(), pos))
    }

    /// The bit at `pos`, numbered in the process-wide bit order.
    pub fn get(&self, pos: u64) -> Result<bool> {
        let p = self.check_pos(pos)?;
        Ok(self.store.get(p))
    }

    /// Set the bit at `pos`.
    pub fn set(&mut self, pos: u64, value: bool) -> Result<()> {
        let p = self.check_pos(pos)?;
        self.store.set(p, value);
        Ok(())
    }

    /// Clear the bit at `pos`.
    pub fn clear(&mut self, pos: u64) -> Result<()> {
        self.set(pos, false)
    }

    /// Invert the bit at `pos`.
    pub fn flip(&mut self, pos: u64) -> Result<()> {
        let p = self.check_pos(pos)?;
        self.store.flip(p);
        Ok(())
    }

    /// Set or clear every listed position; fails before touching anything
    /// when a position is out of range.
    pub fn set_many(&mut self, positions: &[u64], value: bool) -> Result<()> {
        let translated: Vec<u64> = positions
            .iter()
            .map(|&pos| self.check_pos(pos))
            .collect::<Result<_>>()?;
        for p in translated {
            self.store.set(p, value);
        }
        Ok(())
    }

    /// Invert every listed position.
    pub fn flip_many(&mut self, positions: &[u64]) -> Result<()> {
        let translated: Vec<u64> = positions
            .iter()
            .map(|&pos| self.check_pos(pos))
            .collect::<Result<_>>()?;
        for p in translated {
            self.store.flip(p);
        }
        Ok(())
    }

    /// Fill the whole sequence with ones or zeros.
    pub fn set_all(&mut self, value: bool) {
        let len = self.len();
        self.store = if value { Store::ones(len) } else { Store::zeros(len) };
    }

    /// Invert every bit.
    pub fn invert_all(&mut self) {
        let len = self.len();
        if len == 0 {
            return;
        }
        let mut data = self.store.to_bytes();
        for b in &mut data {
            *b = !*b;
        }
        bitspan_types::bytes::mask_tail(&mut data, 0, len);
        self.store = Store::from_realigned(&data, 0, len, 0);
    }

    /// Invert the bits of an MSB0 range.
    pub fn invert_range(&mut self, range: impl RangeBounds<u64>) -> Result<()> {
        let (start, end) = resolve_bounds(&range, self.len())?;
        let mut seg = self.store.extract(start, end - start);
        for b in &mut seg {
            *b = !*b;
        }
        bitspan_types::bytes::mask_tail(&mut seg, 0, end - start);
        let piece = Store::from_realigned(&seg, 0, end - start, 0);
        self.store.splice(start, &piece);
        Ok(())
    }

    /// Append a single bit.
    pub fn push(&mut self, bit: bool) {
        let byte = [if bit { 0x80u8 } else { 0x00 }];
        self.store.append_bits(&byte, 0, 1);
        self.pos = 0;
    }

    /// Append a sequence.
    pub fn append(&mut self, other: &Bits) -> Result<()> {
        let data = other.to_bytes()?;
        self.store.append_bits(&data, 0, other.len());
        self.pos = 0;
        Ok(())
    }

    /// Prepend a sequence.
    pub fn prepend(&mut self, other: &Bits) -> Result<()> {
        let data = other.to_bytes()?;
        self.store.prepend_bits(&data, 0, other.len());
        self.pos = 0;
        Ok(())
    }

    /// Splice `piece` in at bit position `pos`; the cursor lands just past
    /// the inserted bits.
    pub fn insert(&mut self, piece: &Bits, pos: u64) -> Result<()> {
        let incoming = piece.to_store()?;
        editor::insert(&mut self.store, &incoming, pos)?;
        self.pos = pos + piece.len();
        Ok(())
    }

    /// Replace `piece.len()` bits starting at `pos`, extending with zero
    /// fill past the end; the cursor lands just past the written bits.
    pub fn overwrite(&mut self, piece: &Bits, pos: u64) -> Result<()> {
        let incoming = piece.to_store()?;
        editor::overwrite(&mut self.store, &incoming, pos)?;
        self.pos = pos + piece.len();
        Ok(())
    }

    /// Remove `n` bits at `pos`; the cursor resets to 0.
    pub fn delete(&mut self, n: u64, pos: u64) -> Result<()> {
        editor::delete(&mut self.store, n, pos)?;
        self.pos = 0;
        Ok(())
    }

    /// Rotate a range left by `n` bits; the whole sequence when unbounded.
    pub fn rotate_left(&mut self, n: u64, range: impl RangeBounds<u64>) -> Result<()> {
        let (start, end) = resolve_bounds(&range, self.len())?;
        editor::rotate_left(&mut self.store, n, start, end)
    }

    /// Rotate a range right by `n` bits.
    pub fn rotate_right(&mut self, n: u64, range: impl RangeBounds<u64>) -> Result<()> {
        let (start, end) = resolve_bounds(&range, self.len())?;
        editor::rotate_right(&mut self.store, n, start, end)
    }

    /// Reverse the bits of a range in place.
    pub fn reverse(&mut self, range: impl RangeBounds<u64>) -> Result<()> {
        let (start, end) = resolve_bounds(&range, self.len())?;
        editor::reverse(&mut self.store, start, end)
    }

    /// Reverse all bits.
    pub fn reverse_all(&mut self) -> Result<()> {
        self.reverse(..)
    }

    /// Reverse bytes within pattern-sized groups across a whole-byte range;
    /// returns the number of whole pattern applications.
    pub fn byteswap(
        &mut self,
        pattern: impl Into<SwapPattern>,
        range: impl RangeBounds<u64>,
        repeat: bool,
    ) -> Result<u64> {
        let (start, end) = resolve_bounds(&range, self.len())?;
        editor::byteswap(&mut self.store, &pattern.into(), start, end, repeat)
    }

    /// In-place bitwise AND with an equal-length sequence.
    pub fn and_with(&mut self, other: &Bits) -> Result<()> {
        editor::combine(&mut self.store, &other.to_store()?, editor::LogicalOp::And)
    }

    /// In-place bitwise OR with an equal-length sequence.
    pub fn or_with(&mut self, other: &Bits) -> Result<()> {
        editor::combine(&mut self.store, &other.to_store()?, editor::LogicalOp::Or)
    }

    /// In-place bitwise XOR with an equal-length sequence.
    pub fn xor_with(&mut self, other: &Bits) -> Result<()> {
        editor::combine(&mut self.store, &other.to_store()?, editor::LogicalOp::Xor)
    }

    /// Replace every non-overlapping occurrence of `old` with `new`,
    /// scanning left to right; returns the number of replacements. The
    /// cursor resets to 0 when anything changed.
    pub fn replace(&mut self, old: &Bits, new: &Bits, byte_aligned: bool) -> Result<u64> {
        let snapshot = self.snapshot();
        let mut matches = Vec::new();
        let mut from = 0;
        let pat = old.to_bytes()?;
        loop {
            let found = crate::search::find_in(
                &snapshot.view(),
                &pat,
                old.len(),
                from,
                snapshot.len(),
                byte_aligned,
            )?;
            match found {
                Some(p) => {
                    matches.push(p);
                    from = p + old.len();
                }
                None => break,
            }
        }
        let incoming = new.to_store()?;
        for &p in matches.iter().rev() {
            if old.len() == new.len() {
                editor::overwrite(&mut self.store, &incoming, p)?;
            } else {
                editor::delete(&mut self.store, old.len(), p)?;
                editor::insert(&mut self.store, &incoming, p)?;
            }
        }
        if !matches.is_empty() {
            self.pos = 0;
        }
        Ok(matches.len() as u64)
    }

    // --- cursor reads -------------------------------------------------------

    /// The embedded cursor position.
    pub fn pos(&self) -> u64 {
        self.pos
    }

    /// Move the embedded cursor.
    pub fn set_pos(&mut self, pos: u64) -> Result<()> {
        if pos > self.len() {
            return Err(Error::out_of_range(format!(
                "position {pos} past the end of {} bits",
                self.len()
            )));
        }
        self.pos = pos;
        Ok(())
    }

    /// Advance the cursor to the next byte boundary, returning the bits
    /// skipped.
    pub fn byte_align(&mut self) -> Result<u64> {
        let skip = (8 - self.pos % 8) % 8;
        if self.pos + skip > self.len() {
            return Err(Error::out_of_range("no byte boundary before the end"));
        }
        self.pos += skip;
        Ok(skip)
    }

    /// Read every token of `format` at the cursor, advancing on success.
    pub fn read_fmt(&mut self, fmt: &str) -> Result<Vec<Value>> {
        self.read_fmt_with(fmt, &Keywords::new())
    }

    /// [`BitsMut::read_fmt`] with keyword arguments.
    pub fn read_fmt_with(&mut self, fmt: &str, keywords: &Keywords) -> Result<Vec<Value>> {
        let tokens = format::compile(fmt)?;
        let resolved = format::resolve(&tokens, keywords)?;
        let mut pos = self.pos;
        let values = unpack::read_tokens(&self.store.view(), &mut pos, &resolved)?;
        self.pos = pos;
        Ok(values)
    }

    /// Read a format at the cursor without advancing it.
    pub fn peek_fmt(&mut self, fmt: &str) -> Result<Vec<Value>> {
        let tokens = format::compile(fmt)?;
        let resolved = format::resolve(&tokens, &Keywords::new())?;
        let mut pos = self.pos;
        unpack::read_tokens(&self.store.view(), &mut pos, &resolved)
    }

    /// Read an unsigned integer of `bits` bits at the cursor.
    pub fn read_uint(&mut self, bits: u64) -> Result<u64> {
        let value = codec::decode_uint(&self.store.view(), self.pos, bits)?;
        self.pos += bits;
        Ok(value)
    }

    /// Read a signed integer of `bits` bits at the cursor.
    pub fn read_int(&mut self, bits: u64) -> Result<i64> {
        let value = codec::decode_int(&self.store.view(), self.pos, bits)?;
        self.pos += bits;
        Ok(value)
    }

    /// Read a single bit at the cursor.
    pub fn read_bool(&mut self) -> Result<bool> {
        let value = codec::decode_bool(&self.store.view(), self.pos)?;
        self.pos += 1;
        Ok(value)
    }

    /// Read `n` bits at the cursor into an owned sequence.
    pub fn read_bits(&mut self, n: u64) -> Result<Bits> {
        let data = self.store.view().extract(self.pos, n)?;
        self.pos += n;
        Ok(Bits::from_store(Store::from_realigned(&data, 0, n, 0)))
    }

    // --- interpretation -----------------------------------------------------

    /// Interpret the whole sequence as an unsigned integer.
    pub fn to_uint(&self) -> Result<u64> {
        codec::decode_uint(&self.store.view(), 0, self.len())
    }

    /// Interpret the whole sequence as a signed integer.
    pub fn to_int(&self) -> Result<i64> {
        codec::decode_int(&self.store.view(), 0, self.len())
    }

    /// Interpret as an unsigned integer of little-endian bytes.
    pub fn to_uint_le(&self) -> Result<u64> {
        codec::decode_uint_endian(&self.store.view(), 0, self.len(), Endian::Little)
    }

    /// The sequence as hex digit text.
    pub fn to_hex(&self) -> Result<String> {
        codec::decode_hex(&self.store.view(), 0, self.len())
    }

    /// The sequence as binary digit text.
    pub fn to_bin(&self) -> Result<String> {
        codec::decode_bin(&self.store.view(), 0, self.len())
    }

    /// The sequence as octal digit text.
    pub fn to_oct(&self) -> Result<String> {
        codec::decode_oct(&self.store.view(), 0, self.len())
    }

    /// The sequence as whole bytes, the final byte zero padded.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.store.to_bytes()
    }

    /// Destructure with a format string from position 0.
    pub fn unpack(&self, fmt: &str) -> Result<Vec<Value>> {
        let tokens = format::compile(fmt)?;
        let resolved = format::resolve(&tokens, &Keywords::new())?;
        let mut pos = 0;
        unpack::read_tokens(&self.store.view(), &mut pos, &resolved)
    }
}

impl From<BitsMut> for Bits {
    fn from(value: BitsMut) -> Self {
        value.freeze()
    }
}

impl PartialEq for BitsMut {
    fn eq(&self, other: &Self) -> bool {
        self.store
            .view()
            .eq_view(&other.store.view())
            .unwrap_or(false)
    }
}

impl Eq for BitsMut {}

impl PartialEq<Bits> for BitsMut {
    fn eq(&self, other: &Bits) -> bool {
        self.store.view().eq_view(&other.view()).unwrap_or(false)
    }
}

impl PartialEq<BitsMut> for Bits {
    fn eq(&self, other: &BitsMut) -> bool {
        other == self
    }
}

impl core::fmt::Display for BitsMut {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.snapshot(), f)
    }
}

impl BitAndAssign<&Bits> for BitsMut {
    /// # Panics
    ///
    /// Panics on length mismatch; use [`BitsMut::and_with`] to handle the
    /// failure.
    fn bitand_assign(&mut self, rhs: &Bits) {
        self.and_with(rhs).expect("bitand failed");
    }
}

impl BitOrAssign<&Bits> for BitsMut {
    /// # Panics
    ///
    /// Panics on length mismatch; use [`BitsMut::or_with`] to handle the
    /// failure.
    fn bitor_assign(&mut self, rhs: &Bits) {
        self.or_with(rhs).expect("bitor failed");
    }
}

impl BitXorAssign<&Bits> for BitsMut {
    /// # Panics
    ///
    /// Panics on length mismatch; use [`BitsMut::xor_with`] to handle the
    /// failure.
    fn bitxor_assign(&mut self, rhs: &Bits) {
        self.xor_with(rhs).expect("bitxor failed");
    }
}
