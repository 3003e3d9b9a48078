//! The immutable bit sequence.

use std::hash::{Hash, Hasher};
use std::io::Write;
use std::ops::{Add, BitAnd, BitOr, BitXor, Bound, Not, RangeBounds, Shl, Shr};
use std::path::Path;
use std::sync::Arc;

use bitspan_types::bytes;
use tracing::debug;

use crate::codec::{self, Endian, NATIVE};
use crate::error::{Error, Result};
use crate::file::FileSource;
use crate::order;
use crate::region::{View, ViewSrc, CHUNK_BITS};
use crate::search::{self, FindAll};
use crate::store::Store;
use crate::stream::BitReader;
use crate::value::{Keywords, Value};
use crate::BitsMut;

#[derive(Debug)]
pub(crate) enum Source {
    Mem(Vec<u8>),
    File(FileSource),
}

/// An immutable sequence of bits.
///
/// Cloning and slicing share the backing buffer; any operation that needs a
/// private buffer materializes one first, so a `Bits` is cheap to pass
/// around and safe to share. A sequence is either memory backed or a
/// read-only window into a file.
#[derive(Clone)]
pub struct Bits {
    source: Arc<Source>,
    start: u64,
    len: u64,
}

impl Default for Bits {
    fn default() -> Self {
        Bits::new()
    }
}

impl Bits {
    /// The empty sequence.
    pub fn new() -> Self {
        Bits {
            source: Arc::new(Source::Mem(Vec::new())),
            start: 0,
            len: 0,
        }
    }

    /// A sequence of `len` zero bits.
    pub fn zeros(len: u64) -> Self {
        Bits::from_store(Store::zeros(len))
    }

    /// A sequence of `len` one bits.
    pub fn ones(len: u64) -> Self {
        Bits::from_store(Store::ones(len))
    }

    /// A sequence over whole bytes.
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        Bits::from_store(Store::from_bytes(data.into()))
    }

    /// A window of `len` bits into `data`, starting `offset` bits in.
    pub fn from_bytes_window(data: impl Into<Vec<u8>>, offset: u64, len: u64) -> Result<Self> {
        let data = data.into();
        let total = data.len() as u64 * 8;
        if offset + len > total {
            return Err(Error::construction(format!(
                "window {offset}+{len} bits past the end of {total} bits of data"
            )));
        }
        Ok(Bits {
            source: Arc::new(Source::Mem(data)),
            start: offset,
            len,
        })
    }

    /// Parse binary digit text, with an optional `0b` prefix.
    pub fn from_bin(digits: &str) -> Result<Self> {
        Ok(Bits::from_store(codec::encode_bin(digits)?))
    }

    /// Parse hex digit text, with an optional `0x` prefix.
    pub fn from_hex(digits: &str) -> Result<Self> {
        Ok(Bits::from_store(codec::encode_hex(digits)?))
    }

    /// Parse octal digit text, with an optional `0o` prefix.
    pub fn from_oct(digits: &str) -> Result<Self> {
        Ok(Bits::from_store(codec::encode_oct(digits)?))
    }

    /// An unsigned integer in `bits` bits, big-endian bit order.
    pub fn from_uint(value: u64, bits: u64) -> Result<Self> {
        Ok(Bits::from_store(codec::encode_uint(value, bits)?))
    }

    /// A signed two's complement integer in `bits` bits.
    pub fn from_int(value: i64, bits: u64) -> Result<Self> {
        Ok(Bits::from_store(codec::encode_int(value, bits)?))
    }

    /// An unsigned integer of whole big-endian bytes.
    pub fn from_uint_be(value: u64, bits: u64) -> Result<Self> {
        Ok(Bits::from_store(codec::encode_uint_endian(value, bits, Endian::Big)?))
    }

    /// A signed integer of whole big-endian bytes.
    pub fn from_int_be(value: i64, bits: u64) -> Result<Self> {
        Ok(Bits::from_store(codec::encode_int_endian(value, bits, Endian::Big)?))
    }

    /// An unsigned integer of whole little-endian bytes.
    pub fn from_uint_le(value: u64, bits: u64) -> Result<Self> {
        Ok(Bits::from_store(codec::encode_uint_endian(value, bits, Endian::Little)?))
    }

    /// A signed integer of whole little-endian bytes.
    pub fn from_int_le(value: i64, bits: u64) -> Result<Self> {
        Ok(Bits::from_store(codec::encode_int_endian(value, bits, Endian::Little)?))
    }

    /// An unsigned integer of whole native-endian bytes.
    pub fn from_uint_ne(value: u64, bits: u64) -> Result<Self> {
        Ok(Bits::from_store(codec::encode_uint_endian(value, bits, NATIVE)?))
    }

    /// A signed integer of whole native-endian bytes.
    pub fn from_int_ne(value: i64, bits: u64) -> Result<Self> {
        Ok(Bits::from_store(codec::encode_int_endian(value, bits, NATIVE)?))
    }

    /// An IEEE 754 float of 16, 32 or 64 bits, big-endian.
    pub fn from_float(value: f64, bits: u64) -> Result<Self> {
        Ok(Bits::from_store(codec::encode_float(value, bits, Endian::Big)?))
    }

    /// An IEEE 754 float of whole little-endian bytes.
    pub fn from_float_le(value: f64, bits: u64) -> Result<Self> {
        Ok(Bits::from_store(codec::encode_float(value, bits, Endian::Little)?))
    }

    /// An IEEE 754 float of whole native-endian bytes.
    pub fn from_float_ne(value: f64, bits: u64) -> Result<Self> {
        Ok(Bits::from_store(codec::encode_float(value, bits, NATIVE)?))
    }

    /// A 16 bit brain float, big-endian.
    pub fn from_bfloat(value: f64) -> Self {
        Bits::from_store(codec::encode_bfloat(value, Endian::Big))
    }

    /// A 16 bit brain float, little-endian.
    pub fn from_bfloat_le(value: f64) -> Self {
        Bits::from_store(codec::encode_bfloat(value, Endian::Little))
    }

    /// A 16 bit brain float, native-endian.
    pub fn from_bfloat_ne(value: f64) -> Self {
        Bits::from_store(codec::encode_bfloat(value, NATIVE))
    }

    /// A single bit.
    pub fn from_bool(value: bool) -> Self {
        let mut store = Store::zeros(1);
        store.set(0, value);
        Bits::from_store(store)
    }

    /// An unsigned exp-Golomb code.
    pub fn from_ue(value: u64) -> Result<Self> {
        Ok(Bits::from_store(codec::encode_ue(value)?))
    }

    /// A signed exp-Golomb code.
    pub fn from_se(value: i64) -> Result<Self> {
        Ok(Bits::from_store(codec::encode_se(value)?))
    }

    /// An unsigned interleaved exp-Golomb code.
    pub fn from_uie(value: u64) -> Self {
        Bits::from_store(codec::encode_uie(value))
    }

    /// A signed interleaved exp-Golomb code.
    pub fn from_sie(value: i64) -> Self {
        Bits::from_store(codec::encode_sie(value))
    }

    /// A read-only sequence over the whole of a file, without reading it.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Bits::from_file_window(path, 0, None)
    }

    /// A read-only window of a file: `offset` bits in, `len` bits long
    /// (to the end of the file when `None`).
    pub fn from_file_window(
        path: impl AsRef<Path>,
        offset: u64,
        len: Option<u64>,
    ) -> Result<Self> {
        let source = FileSource::open(path.as_ref())?;
        let total = source.byte_len() * 8;
        let len = match len {
            Some(len) => len,
            None => total.saturating_sub(offset),
        };
        if offset + len > total {
            return Err(Error::construction(format!(
                "window {offset}+{len} bits past the end of the {total} bit file"
            )));
        }
        Ok(Bits {
            source: Arc::new(Source::File(source)),
            start: offset,
            len,
        })
    }

    /// Build from a format string whose tokens all carry their values,
    /// such as `"0xff, uint:6=22"`.
    pub fn parse(format: &str) -> Result<Self> {
        crate::pack(format, &[])
    }

    /// [`Bits::parse`] with keyword arguments.
    pub fn parse_with(format: &str, keywords: &Keywords) -> Result<Self> {
        crate::pack_with(format, &[], keywords)
    }

    pub(crate) fn from_store(store: Store) -> Self {
        let (data, offset, len) = store.into_parts();
        Bits {
            source: Arc::new(Source::Mem(data)),
            start: offset,
            len,
        }
    }

    pub(crate) fn view(&self) -> View<'_> {
        let src = match self.source.as_ref() {
            Source::Mem(data) => ViewSrc::Mem(data),
            Source::File(file) => ViewSrc::File(file),
        };
        View::new(src, self.start, self.len)
    }

    /// Copy the sequence into an owned store at offset zero.
    pub(crate) fn to_store(&self) -> Result<Store> {
        let data = self.view().extract(0, self.len)?;
        Ok(Store::from_realigned(&data, 0, self.len, 0))
    }

    /// Length in bits.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether the sequence has no bits. The truthiness of a sequence is
    /// exactly its non-emptiness.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes spanned by the region: `ceil((offset + len) / 8)`.
    pub fn byte_len(&self) -> u64 {
        (self.start % 8 + self.len + 7) / 8
    }

    /// The bit at `pos`, numbered in the process-wide bit order.
    pub fn get(&self, pos: u64) -> Result<bool> {
        if pos >= self.len {
            return Err(Error::out_of_range(format!(
                "bit {pos} of a {} bit sequence",
                self.len
            )));
        }
        self.view().get(order::pos_in(self.len, pos))
    }

    /// A shared sub-sequence; no bits are copied.
    pub fn slice(&self, range: impl RangeBounds<u64>) -> Result<Self> {
        let (start, end) = resolve_bounds(&range, self.len)?;
        Ok(Bits {
            source: self.source.clone(),
            start: self.start + start,
            len: end - start,
        })
    }

    /// Scaled-endpoint slicing. Endpoints are multiplied by `|step|`;
    /// a negative step selects the mirrored scaled region and reverses it.
    /// Negative endpoints count from the end, as the missing-endpoint
    /// defaults run in the direction of travel.
    pub fn stride(&self, start: Option<i64>, stop: Option<i64>, step: i64) -> Result<Self> {
        if step == 0 {
            return Err(Error::construction("slice step cannot be zero"));
        }
        let scale = step.unsigned_abs();
        let units = (self.len / scale) as i64;
        let clamp = |raw: Option<i64>, default: i64| -> i64 {
            let v = match raw {
                Some(v) if v < 0 => v + units,
                Some(v) => v,
                None => default,
            };
            v.clamp(-1, units)
        };
        if step > 0 {
            let a = clamp(start, 0).max(0);
            let b = clamp(stop, units).max(0);
            if b <= a {
                return Ok(Bits::new());
            }
            self.slice(a as u64 * scale..b as u64 * scale)
        } else {
            let a = clamp(start, units - 1);
            let b = clamp(stop, -1);
            if a <= b || a < 0 {
                return Ok(Bits::new());
            }
            let lo = (b + 1) as u64 * scale;
            let hi = (a + 1) as u64 * scale;
            let window = self.slice(lo..hi)?;
            let mut store = window.to_store()?;
            crate::editor::reverse(&mut store, 0, hi - lo)?;
            Ok(Bits::from_store(store))
        }
    }

    /// The sequence as whole bytes, the final byte zero padded.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.view().extract(0, self.len)
    }

    /// Raw byte `k` of the referenced buffer range, without shifting out
    /// the sub-byte offset.
    pub fn byte_at(&self, k: u64) -> Result<u8> {
        let raw = self.view().raw_bytes(k, 1)?;
        Ok(raw[0])
    }

    /// Raw bytes `[a, b)` of the referenced buffer range, unshifted.
    pub fn byte_range(&self, a: u64, b: u64) -> Result<Vec<u8>> {
        if b < a {
            return Err(Error::out_of_range(format!("byte range {a}..{b} is inverted")));
        }
        self.view().raw_bytes(a, b - a)
    }

    /// Iterate the bits in index order, numbered in the process-wide bit
    /// order; items fail only for unreadable file windows.
    pub fn iter(&self) -> impl Iterator<Item = Result<bool>> + '_ {
        (0..self.len).map(move |i| self.get(i))
    }

    /// Stream the sequence into a byte sink in chunks; unused bits of the
    /// final byte are zero.
    pub fn write_to(&self, sink: &mut dyn Write) -> Result<u64> {
        let mut at = 0;
        let mut written = 0u64;
        while at < self.len {
            let take = (self.len - at).min(CHUNK_BITS);
            let chunk = self.view().extract(at, take)?;
            sink.write_all(&chunk)?;
            written += chunk.len() as u64;
            at += take;
        }
        Ok(written)
    }

    /// Interpret the whole sequence as an unsigned integer.
    pub fn to_uint(&self) -> Result<u64> {
        codec::decode_uint(&self.view(), 0, self.len)
    }

    /// Interpret the whole sequence as a signed integer.
    pub fn to_int(&self) -> Result<i64> {
        codec::decode_int(&self.view(), 0, self.len)
    }

    /// Interpret as an unsigned integer of little-endian bytes.
    pub fn to_uint_le(&self) -> Result<u64> {
        codec::decode_uint_endian(&self.view(), 0, self.len, Endian::Little)
    }

    /// Interpret as a signed integer of little-endian bytes.
    pub fn to_int_le(&self) -> Result<i64> {
        codec::decode_int_endian(&self.view(), 0, self.len, Endian::Little)
    }

    /// Interpret as an unsigned integer of native-endian bytes.
    pub fn to_uint_ne(&self) -> Result<u64> {
        codec::decode_uint_endian(&self.view(), 0, self.len, NATIVE)
    }

    /// Interpret as a signed integer of native-endian bytes.
    pub fn to_int_ne(&self) -> Result<i64> {
        codec::decode_int_endian(&self.view(), 0, self.len, NATIVE)
    }

    /// Interpret as a big-endian IEEE 754 float of 16, 32 or 64 bits.
    pub fn to_float(&self) -> Result<f64> {
        codec::decode_float(&self.view(), 0, self.len, Endian::Big)
    }

    /// Interpret as a little-endian IEEE 754 float.
    pub fn to_float_le(&self) -> Result<f64> {
        codec::decode_float(&self.view(), 0, self.len, Endian::Little)
    }

    /// Interpret as a big-endian 16 bit brain float.
    pub fn to_bfloat(&self) -> Result<f64> {
        self.require_bits(16, "bfloat")?;
        codec::decode_bfloat(&self.view(), 0, Endian::Big)
    }

    /// Interpret as a little-endian 16 bit brain float.
    pub fn to_bfloat_le(&self) -> Result<f64> {
        self.require_bits(16, "bfloat")?;
        codec::decode_bfloat(&self.view(), 0, Endian::Little)
    }

    fn require_bits(&self, bits: u64, what: &str) -> Result<()> {
        if self.len != bits {
            return Err(Error::interpretation(format!(
                "{what} needs exactly {bits} bits, sequence has {}",
                self.len
            )));
        }
        Ok(())
    }

    /// The sequence as hex digit text; the length must be whole nibbles.
    pub fn to_hex(&self) -> Result<String> {
        codec::decode_hex(&self.view(), 0, self.len)
    }

    /// The sequence as octal digit text; the length must divide by three.
    pub fn to_oct(&self) -> Result<String> {
        codec::decode_oct(&self.view(), 0, self.len)
    }

    /// The sequence as binary digit text.
    pub fn to_bin(&self) -> Result<String> {
        codec::decode_bin(&self.view(), 0, self.len)
    }

    /// The single bit of a one bit sequence.
    pub fn to_bool(&self) -> Result<bool> {
        self.require_bits(1, "bool")?;
        self.view().get(0)
    }

    /// Decode the whole sequence as one unsigned exp-Golomb code.
    pub fn to_ue(&self) -> Result<u64> {
        let (value, used) = codec::decode_ue(&self.view(), 0)?;
        self.require_consumed(used)?;
        Ok(value)
    }

    /// Decode the whole sequence as one signed exp-Golomb code.
    pub fn to_se(&self) -> Result<i64> {
        let (value, used) = codec::decode_se(&self.view(), 0)?;
        self.require_consumed(used)?;
        Ok(value)
    }

    /// Decode the whole sequence as one unsigned interleaved exp-Golomb code.
    pub fn to_uie(&self) -> Result<u64> {
        let (value, used) = codec::decode_uie(&self.view(), 0)?;
        self.require_consumed(used)?;
        Ok(value)
    }

    /// Decode the whole sequence as one signed interleaved exp-Golomb code.
    pub fn to_sie(&self) -> Result<i64> {
        let (value, used) = codec::decode_sie(&self.view(), 0)?;
        self.require_consumed(used)?;
        Ok(value)
    }

    fn require_consumed(&self, used: u64) -> Result<()> {
        if used != self.len {
            return Err(Error::interpretation(format!(
                "code ends after {used} of {} bits",
                self.len
            )));
        }
        Ok(())
    }

    /// Destructure with a format string; see [`crate::unpack`].
    pub fn unpack(&self, format: &str) -> Result<Vec<Value>> {
        crate::unpack(format, self)
    }

    /// [`Bits::unpack`] with keyword arguments.
    pub fn unpack_with(&self, format: &str, keywords: &Keywords) -> Result<Vec<Value>> {
        crate::unpack_with(format, self, keywords)
    }

    /// A cursor positioned at bit 0.
    pub fn reader(&self) -> BitReader<'_> {
        BitReader::new(self)
    }

    /// Lowest match position of `pattern`, honoring the process-wide bit
    /// order for coordinates.
    pub fn find(&self, pattern: &Bits, byte_aligned: bool) -> Result<Option<u64>> {
        self.find_in(pattern, 0, self.len, byte_aligned)
    }

    /// [`Bits::find`] restricted to the window `[start, end)`.
    pub fn find_in(
        &self,
        pattern: &Bits,
        start: u64,
        end: u64,
        byte_aligned: bool,
    ) -> Result<Option<u64>> {
        let (s, e) = self.search_window(start, end)?;
        let pat = pattern.view().extract(0, pattern.len())?;
        let found = match order::bit_order() {
            order::BitOrder::Msb0 => {
                search::find_in(&self.view(), &pat, pattern.len(), s, e, byte_aligned)?
            }
            order::BitOrder::Lsb0 => {
                search::rfind_in(&self.view(), &pat, pattern.len(), s, e, byte_aligned)?
            }
        };
        Ok(found.map(|p| order::find_pos_out(self.len, p, pattern.len())))
    }

    /// Highest match position of `pattern`.
    pub fn rfind(&self, pattern: &Bits, byte_aligned: bool) -> Result<Option<u64>> {
        self.rfind_in(pattern, 0, self.len, byte_aligned)
    }

    /// [`Bits::rfind`] restricted to the window `[start, end)`.
    pub fn rfind_in(
        &self,
        pattern: &Bits,
        start: u64,
        end: u64,
        byte_aligned: bool,
    ) -> Result<Option<u64>> {
        let (s, e) = self.search_window(start, end)?;
        let pat = pattern.view().extract(0, pattern.len())?;
        let found = match order::bit_order() {
            order::BitOrder::Msb0 => {
                search::rfind_in(&self.view(), &pat, pattern.len(), s, e, byte_aligned)?
            }
            order::BitOrder::Lsb0 => {
                search::find_in(&self.view(), &pat, pattern.len(), s, e, byte_aligned)?
            }
        };
        Ok(found.map(|p| order::find_pos_out(self.len, p, pattern.len())))
    }

    fn search_window(&self, start: u64, end: u64) -> Result<(u64, u64)> {
        let end = end.min(self.len);
        if start > end {
            return Err(Error::out_of_range(format!(
                "search window {start}..{end} is inverted"
            )));
        }
        Ok(order::range_in(self.len, start, end))
    }

    /// Lazily iterate match positions; `count` caps the yield.
    pub fn find_all<'a>(
        &'a self,
        pattern: &Bits,
        byte_aligned: bool,
        count: Option<u64>,
    ) -> Result<FindAll<'a>> {
        let (s, e) = self.search_window(0, self.len)?;
        FindAll::new(self, pattern, s, e, byte_aligned, count)
    }

    /// Bits set to one, scanning in bounded chunks.
    pub fn count_ones(&self) -> Result<u64> {
        let mut total = 0u64;
        let mut at = 0;
        while at < self.len {
            let take = (self.len - at).min(CHUNK_BITS);
            let chunk = self.view().extract(at, take)?;
            total += chunk.iter().map(|b| u64::from(b.count_ones())).sum::<u64>();
            at += take;
        }
        Ok(total)
    }

    /// Bits set to zero.
    pub fn count_zeros(&self) -> Result<u64> {
        Ok(self.len - self.count_ones()?)
    }

    /// Whether any bit is set.
    pub fn any_set(&self) -> Result<bool> {
        if self.is_empty() {
            return Ok(false);
        }
        Ok(self.view().count_zeros_from(0)? < self.len)
    }

    /// Whether every bit is set.
    pub fn all_set(&self) -> Result<bool> {
        Ok(self.count_ones()? == self.len)
    }

    /// Whether the sequence begins with `prefix`.
    pub fn starts_with(&self, prefix: &Bits) -> Result<bool> {
        if prefix.len > self.len {
            return Ok(false);
        }
        self.view().sub(0, prefix.len)?.eq_view(&prefix.view())
    }

    /// Whether the sequence ends with `suffix`.
    pub fn ends_with(&self, suffix: &Bits) -> Result<bool> {
        if suffix.len > self.len {
            return Ok(false);
        }
        self.view()
            .sub(self.len - suffix.len, suffix.len)?
            .eq_view(&suffix.view())
    }

    /// Iterate `n` bit chunks as shared slices; the final chunk may be
    /// shorter.
    pub fn chunks(&self, n: u64) -> Result<Chunks<'_>> {
        if n == 0 {
            return Err(Error::construction("chunk size cannot be zero"));
        }
        Ok(Chunks {
            bits: self,
            at: 0,
            size: n,
        })
    }

    /// The sequence repeated `n` times.
    pub fn repeat(&self, n: u64) -> Result<Bits> {
        let mut store = Store::zeros(0);
        let data = self.view().extract(0, self.len)?;
        for _ in 0..n {
            store.append_bits(&data, 0, self.len);
        }
        Ok(Bits::from_store(store))
    }

    /// Concatenation.
    pub fn concat(&self, other: &Bits) -> Result<Bits> {
        let mut store = self.to_store()?;
        let rhs = other.view().extract(0, other.len)?;
        store.append_bits(&rhs, 0, other.len);
        Ok(Bits::from_store(store))
    }

    /// Bitwise AND with an equal-length sequence.
    pub fn and(&self, other: &Bits) -> Result<Bits> {
        self.combine(other, crate::editor::LogicalOp::And)
    }

    /// Bitwise OR with an equal-length sequence.
    pub fn or(&self, other: &Bits) -> Result<Bits> {
        self.combine(other, crate::editor::LogicalOp::Or)
    }

    /// Bitwise XOR with an equal-length sequence.
    pub fn xor(&self, other: &Bits) -> Result<Bits> {
        self.combine(other, crate::editor::LogicalOp::Xor)
    }

    fn combine(&self, other: &Bits, op: crate::editor::LogicalOp) -> Result<Bits> {
        let mut store = self.to_store()?;
        crate::editor::combine(&mut store, &other.to_store()?, op)?;
        Ok(Bits::from_store(store))
    }

    /// Every bit inverted.
    pub fn invert(&self) -> Result<Bits> {
        let mut data = self.view().extract(0, self.len)?;
        for b in &mut data {
            *b = !*b;
        }
        bytes::mask_tail(&mut data, 0, self.len);
        Ok(Bits::from_store(Store::from_realigned(&data, 0, self.len, 0)))
    }

    /// Logical left shift by `n` with zero fill; the length is unchanged.
    pub fn shift_left(&self, n: u64) -> Result<Bits> {
        let n = n.min(self.len);
        let mut store = Store::zeros(0);
        let kept = self.view().extract(n, self.len - n)?;
        store.append_bits(&kept, 0, self.len - n);
        store.extend_zeros(self.len);
        Ok(Bits::from_store(store))
    }

    /// Logical right shift by `n` with zero fill; the length is unchanged.
    pub fn shift_right(&self, n: u64) -> Result<Bits> {
        let n = n.min(self.len);
        let mut store = Store::zeros(n);
        let kept = self.view().extract(0, self.len - n)?;
        store.append_bits(&kept, 0, self.len - n);
        Ok(Bits::from_store(store))
    }

    /// Copy into a mutable sequence; file-backed regions are read into
    /// memory here.
    pub fn to_mut(&self) -> Result<BitsMut> {
        debug!(bits = self.len, "materializing for mutation");
        Ok(BitsMut::from_store(self.to_store()?))
    }
}

/// Iterator of shared chunk slices, from [`Bits::chunks`].
pub struct Chunks<'a> {
    bits: &'a Bits,
    at: u64,
    size: u64,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Bits;

    fn next(&mut self) -> Option<Self::Item> {
        if self.at >= self.bits.len() {
            return None;
        }
        let take = (self.bits.len() - self.at).min(self.size);
        let chunk = self.bits.slice(self.at..self.at + take).ok()?;
        self.at += take;
        Some(chunk)
    }
}

pub(crate) fn resolve_bounds(range: &impl RangeBounds<u64>, len: u64) -> Result<(u64, u64)> {
    let start = match range.start_bound() {
        Bound::Included(&s) => s,
        Bound::Excluded(&s) => s + 1,
        Bound::Unbounded => 0,
    };
    let end = match range.end_bound() {
        Bound::Included(&e) => e + 1,
        Bound::Excluded(&e) => e,
        Bound::Unbounded => len,
    };
    if start > end || end > len {
        return Err(Error::out_of_range(format!(
            "range {start}..{end} invalid for {len} bits"
        )));
    }
    Ok((start, end))
}

impl FromIterator<bool> for Bits {
    fn from_iter<T: IntoIterator<Item = bool>>(iter: T) -> Self {
        let mut store = Store::zeros(0);
        let one = [0x80u8];
        let zero = [0x00u8];
        for bit in iter {
            store.append_bits(if bit { &one } else { &zero }, 0, 1);
        }
        Bits::from_store(store)
    }
}

impl PartialEq for Bits {
    fn eq(&self, other: &Self) -> bool {
        self.view().eq_view(&other.view()).unwrap_or(false)
    }
}

impl Eq for Bits {}

impl Hash for Bits {
    /// Hashes the content bytes; an unreadable file window degrades to
    /// hashing the length alone, since hashing cannot fail.
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len.hash(state);
        let mut at = 0;
        while at < self.len {
            let take = (self.len - at).min(CHUNK_BITS);
            match self.view().extract(at, take) {
                Ok(chunk) => chunk.hash(state),
                Err(_) => return,
            }
            at += take;
        }
    }
}

impl core::fmt::Debug for Bits {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Bits {{ len: {}, bits: ", self.len)?;
        let preview = (self.len).min(4 * 1024);
        match self.view().extract(0, preview) {
            Ok(data) if self.len % 4 == 0 => bitspan_types::fmt::fmt_truncated_hex::<64>(&data, f)?,
            Ok(data) => bitspan_types::fmt::fmt_truncated_bin::<64>(&data, preview, f)?,
            Err(_) => f.write_str("<unreadable>")?,
        }
        f.write_str(" }")
    }
}

impl core::fmt::Display for Bits {
    /// Hex with a `0x` prefix when the length is whole nibbles, binary with
    /// a `0b` prefix otherwise; empty sequences print nothing.
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.is_empty() {
            return Ok(());
        }
        if self.len % 4 == 0 {
            match self.to_hex() {
                Ok(text) => write!(f, "0x{text}"),
                Err(_) => f.write_str("<unreadable>"),
            }
        } else {
            match self.to_bin() {
                Ok(text) => write!(f, "0b{text}"),
                Err(_) => f.write_str("<unreadable>"),
            }
        }
    }
}

impl Not for &Bits {
    type Output = Bits;

    /// # Panics
    ///
    /// Panics if a file-backed region cannot be read; use [`Bits::invert`]
    /// to handle the failure.
    fn not(self) -> Bits {
        self.invert().expect("sequence read failed")
    }
}

impl BitAnd for &Bits {
    type Output = Bits;

    /// # Panics
    ///
    /// Panics on length mismatch or unreadable regions; use [`Bits::and`]
    /// to handle the failure.
    fn bitand(self, rhs: Self) -> Bits {
        self.and(rhs).expect("bitand failed")
    }
}

impl BitOr for &Bits {
    type Output = Bits;

    /// # Panics
    ///
    /// Panics on length mismatch or unreadable regions; use [`Bits::or`]
    /// to handle the failure.
    fn bitor(self, rhs: Self) -> Bits {
        self.or(rhs).expect("bitor failed")
    }
}

impl BitXor for &Bits {
    type Output = Bits;

    /// # Panics
    ///
    /// Panics on length mismatch or unreadable regions; use [`Bits::xor`]
    /// to handle the failure.
    fn bitxor(self, rhs: Self) -> Bits {
        self.xor(rhs).expect("bitxor failed")
    }
}

impl Shl<u64> for &Bits {
    type Output = Bits;

    /// # Panics
    ///
    /// Panics if a file-backed region cannot be read; use
    /// [`Bits::shift_left`] to handle the failure.
    fn shl(self, n: u64) -> Bits {
        self.shift_left(n).expect("shift failed")
    }
}

impl Shr<u64> for &Bits {
    type Output = Bits;

    /// # Panics
    ///
    /// Panics if a file-backed region cannot be read; use
    /// [`Bits::shift_right`] to handle the failure.
    fn shr(self, n: u64) -> Bits {
        self.shift_right(n).expect("shift failed")
    }
}

impl Add for &Bits {
    type Output = Bits;

    /// Concatenation.
    ///
    /// # Panics
    ///
    /// Panics if a file-backed region cannot be read; use [`Bits::concat`]
    /// to handle the failure.
    fn add(self, rhs: Self) -> Bits {
        self.concat(rhs).expect("concat failed")
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Bits {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::Error as _;
        let data = self.to_bytes().map_err(S::Error::custom)?;
        (self.len, data).serialize(serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Bits {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error as _;
        let (len, data): (u64, Vec<u8>) = serde::Deserialize::deserialize(deserializer)?;
        Bits::from_bytes_window(data, 0, len).map_err(D::Error::custom)
    }
}
