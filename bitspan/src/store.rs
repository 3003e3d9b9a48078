//! Owned backing buffer for mutable sequences.
//!
//! A [`Store`] is a byte buffer plus a sub-byte offset and a bit length.
//! Padding bits on both sides of the logical region are kept zero so that
//! buffers can be merged, compared and dumped bytewise. The buffer always
//! holds exactly `byte_len(offset, len)` bytes.

use bitspan_types::bytes;
use tracing::trace;

use crate::region::{View, ViewSrc};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Store {
    data: Vec<u8>,
    offset: u64,
    len: u64,
}

impl Store {
    pub fn zeros(len: u64) -> Self {
        Store {
            data: vec![0u8; bytes::byte_len(0, len)],
            offset: 0,
            len,
        }
    }

    pub fn ones(len: u64) -> Self {
        let mut s = Store {
            data: vec![0xffu8; bytes::byte_len(0, len)],
            offset: 0,
            len,
        };
        bytes::mask_tail(&mut s.data, 0, len);
        s
    }

    pub fn from_bytes(data: Vec<u8>) -> Self {
        let len = data.len() as u64 * 8;
        Store {
            data,
            offset: 0,
            len,
        }
    }

    /// Copy the window `[pos, pos + len)` of `src` into a fresh store placed
    /// at intra-byte offset `offset`.
    pub fn from_realigned(src: &[u8], pos: u64, len: u64, offset: u64) -> Self {
        Store {
            data: bytes::realign(src, pos, len, offset),
            offset,
            len,
        }
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn view(&self) -> View<'_> {
        View::new(ViewSrc::Mem(&self.data), self.offset, self.len)
    }

    pub fn get(&self, pos: u64) -> bool {
        debug_assert!(pos < self.len);
        bytes::get_bit(&self.data, self.offset + pos)
    }

    pub fn set(&mut self, pos: u64, value: bool) {
        debug_assert!(pos < self.len);
        bytes::set_bit(&mut self.data, self.offset + pos, value);
    }

    pub fn flip(&mut self, pos: u64) {
        debug_assert!(pos < self.len);
        bytes::flip_bit(&mut self.data, self.offset + pos);
    }

    /// Rebase the logical bit 0 to a new intra-byte offset, shifting the
    /// whole buffer by the delta.
    pub fn set_offset(&mut self, new_offset: u64) {
        debug_assert!(new_offset < 8);
        if self.offset == new_offset {
            return;
        }
        if self.len == 0 {
            self.offset = new_offset;
            self.data = vec![0u8; bytes::byte_len(new_offset, 0)];
            return;
        }
        trace!(from = self.offset, to = new_offset, bits = self.len, "rebasing store");
        self.data = bytes::realign(&self.data, self.offset, self.len, new_offset);
        self.offset = new_offset;
    }

    /// Copy `[pos, pos + len)` into a fresh zero-offset buffer.
    pub fn extract(&self, pos: u64, len: u64) -> Vec<u8> {
        debug_assert!(pos + len <= self.len);
        bytes::extract_bits(&self.data, self.offset + pos, len)
    }

    /// The whole region as zero-offset bytes, final byte zero padded.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.extract(0, self.len)
    }

    /// Shorten the region to its first `new_len` bits.
    pub fn truncate(&mut self, new_len: u64) {
        debug_assert!(new_len <= self.len);
        self.len = new_len;
        if new_len == 0 {
            self.data.clear();
            self.offset = 0;
            return;
        }
        self.data.truncate(bytes::byte_len(self.offset, new_len));
        bytes::mask_tail(&mut self.data, self.offset, new_len);
    }

    /// Drop the first `n` bits, adjusting the offset instead of shifting.
    pub fn drop_front(&mut self, n: u64) {
        debug_assert!(n <= self.len);
        if n == self.len {
            self.truncate(0);
            return;
        }
        let new_start = self.offset + n;
        self.data.drain(..(new_start / 8) as usize);
        self.offset = new_start % 8;
        self.len -= n;
        if let Some(first) = self.data.first_mut() {
            *first &= !bytes::high_mask(self.offset);
        }
    }

    /// Append `len` bits taken from `src` at `src_pos`. When the incoming
    /// phase matches the end of the region this is a byte splice merging at
    /// most one boundary byte; otherwise whichever side holds fewer bits is
    /// rebased to make the phases match.
    pub fn append_bits(&mut self, src: &[u8], src_pos: u64, len: u64) {
        if len == 0 {
            return;
        }
        if (self.offset + self.len) % 8 != src_pos % 8 && self.len < len {
            let new_offset = (src_pos % 8 + 8 - self.len % 8) % 8;
            self.set_offset(new_offset);
        }
        let end = self.offset + self.len;
        self.data.resize(bytes::byte_len(self.offset, self.len + len), 0);
        bytes::copy_bits(&mut self.data, end, src, src_pos, len);
        self.len += len;
    }

    /// Prepend `len` bits taken from `src` at `src_pos`; dual of
    /// [`Store::append_bits`], keeping the incoming phase and shifting the
    /// shorter side only when the boundary does not line up.
    pub fn prepend_bits(&mut self, src: &[u8], src_pos: u64, len: u64) {
        if len == 0 {
            return;
        }
        let mut front = Store::from_realigned(src, src_pos, len, src_pos % 8);
        front.append_bits(&self.data, self.offset, self.len);
        *self = front;
    }

    pub fn append_store(&mut self, other: &Store) {
        self.append_bits(&other.data, other.offset, other.len);
    }

    /// Grow to `new_len` bits with zero fill.
    pub fn extend_zeros(&mut self, new_len: u64) {
        debug_assert!(new_len >= self.len);
        self.data.resize(bytes::byte_len(self.offset, new_len), 0);
        self.len = new_len;
    }

    /// Overwrite `piece.len()` bits at `pos` with `piece`, which must fit
    /// inside the current length. Only the piece is rebased when the phases
    /// differ.
    pub fn splice(&mut self, pos: u64, piece: &Store) {
        debug_assert!(pos + piece.len() <= self.len);
        bytes::copy_bits(
            &mut self.data,
            self.offset + pos,
            piece.data(),
            piece.offset(),
            piece.len(),
        );
    }

    /// Take the buffer, offset and length out of the store.
    pub fn into_parts(self) -> (Vec<u8>, u64, u64) {
        (self.data, self.offset, self.len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_merges_the_boundary_byte() {
        let mut s = Store::zeros(0);
        s.append_bits(&[0b1010_0000], 0, 3);
        s.append_bits(&[0b1110_0000], 0, 3);
        assert_eq!(6, s.len());
        assert_eq!(vec![0b1011_1100], s.to_bytes());
    }

    #[test]
    fn set_offset_shifts_the_buffer() {
        let mut s = Store::from_bytes(vec![0xab, 0xcd]);
        s.set_offset(4);
        assert_eq!(4, s.offset());
        assert_eq!(16, s.len());
        assert_eq!(vec![0x0a, 0xbc, 0xd0], s.data().to_vec());
        assert_eq!(vec![0xab, 0xcd], s.to_bytes());
    }

    #[test]
    fn drop_front_keeps_padding_zeroed() {
        let mut s = Store::from_bytes(vec![0xff, 0xff]);
        s.drop_front(3);
        assert_eq!(13, s.len());
        assert_eq!(3, s.offset());
        assert_eq!(vec![0x1f, 0xff], s.data().to_vec());
        s.drop_front(13);
        assert!(s.is_empty());
        assert_eq!(0, s.offset());
    }

    #[test]
    fn append_rebases_the_shorter_side() {
        // a short store meeting a long unaligned source rebases itself
        let mut s = Store::zeros(0);
        s.append_bits(&[0xff], 0, 3);
        let long = vec![0xaa; 4];
        s.append_bits(&long, 1, 31);
        assert_eq!(34, s.len());
        let expect = {
            let mut e = Store::zeros(0);
            e.append_bits(&[0xff], 0, 3);
            let aligned = bitspan_types::bytes::extract_bits(&long, 1, 31);
            e.append_bits(&aligned, 0, 31);
            e.to_bytes()
        };
        assert_eq!(expect, s.to_bytes());
    }

    #[test]
    fn splice_overwrites_in_place() {
        let mut s = Store::from_bytes(vec![0x00, 0x00]);
        let mut piece = Store::zeros(5);
        piece.set(0, true);
        piece.set(4, true);
        s.splice(6, &piece);
        assert_eq!(vec![0b0000_0010, 0b0010_0000], s.data().to_vec());
        assert_eq!(16, s.len());
    }
}
