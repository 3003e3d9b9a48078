//! Destructive edits on a store: splices, rotations, reversals, byte
//! swaps and logical fills.
//!
//! Every function validates before touching the store, so a failed call
//! leaves the sequence unchanged. When an edit needs a sub-byte rebase of
//! the incoming piece the piece alone is shifted; the store keeps its
//! phase.

use bitspan_types::bytes;
use tracing::debug;

use crate::error::{Error, Result};
use crate::store::Store;

/// Byte grouping for [`byteswap`]: a single group size, an explicit list of
/// group sizes, or a compact struct-style code such as `"hhl"` or `"2h"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapPattern {
    /// Groups of a fixed byte count; zero means one group spanning the
    /// whole range.
    Size(u64),
    /// An ordered list of group byte counts.
    Sizes(Vec<u64>),
    /// Size letters from `bBhHlLqQefd` with optional repeat counts.
    Code(String),
}

impl From<u64> for SwapPattern {
    fn from(size: u64) -> Self {
        SwapPattern::Size(size)
    }
}

impl From<Vec<u64>> for SwapPattern {
    fn from(sizes: Vec<u64>) -> Self {
        SwapPattern::Sizes(sizes)
    }
}

impl From<&[u64]> for SwapPattern {
    fn from(sizes: &[u64]) -> Self {
        SwapPattern::Sizes(sizes.to_vec())
    }
}

impl From<&str> for SwapPattern {
    fn from(code: &str) -> Self {
        SwapPattern::Code(code.to_string())
    }
}

impl SwapPattern {
    /// Settle the pattern into a list of group byte counts for a range of
    /// `total` bytes.
    fn group_sizes(&self, total: u64) -> Result<Vec<u64>> {
        match self {
            SwapPattern::Size(0) => Ok(vec![total]),
            SwapPattern::Size(n) => Ok(vec![*n]),
            SwapPattern::Sizes(sizes) => {
                if sizes.is_empty() || sizes.contains(&0) {
                    return Err(Error::construction(
                        "byteswap group sizes must be positive",
                    ));
                }
                Ok(sizes.clone())
            }
            SwapPattern::Code(code) => {
                let mut sizes = Vec::new();
                let mut count: Option<u64> = None;
                for c in code.chars() {
                    if let Some(d) = c.to_digit(10) {
                        count = Some(count.unwrap_or(0) * 10 + u64::from(d));
                        continue;
                    }
                    let size = match c {
                        'b' | 'B' => 1,
                        'h' | 'H' | 'e' => 2,
                        'l' | 'L' | 'f' => 4,
                        'q' | 'Q' | 'd' => 8,
                        _ => {
                            return Err(Error::construction(format!(
                                "bad byteswap code character {c:?}"
                            )))
                        }
                    };
                    for _ in 0..count.take().unwrap_or(1) {
                        sizes.push(size);
                    }
                }
                if count.is_some() || sizes.is_empty() {
                    return Err(Error::construction(format!("bad byteswap code {code:?}")));
                }
                Ok(sizes)
            }
        }
    }
}

fn check_pos(len: u64, pos: u64) -> Result<()> {
    if pos > len {
        return Err(Error::out_of_range(format!(
            "position {pos} past the end of {len} bits"
        )));
    }
    Ok(())
}

fn check_range(len: u64, start: u64, end: u64) -> Result<()> {
    if start > end || end > len {
        return Err(Error::out_of_range(format!(
            "range {start}..{end} invalid for {len} bits"
        )));
    }
    Ok(())
}

/// Splice `piece` in at bit position `p`.
pub(crate) fn insert(store: &mut Store, piece: &Store, p: u64) -> Result<()> {
    check_pos(store.len(), p)?;
    let n = store.len();
    if p == n {
        store.append_store(piece);
    } else if p == 0 {
        store.prepend_bits(piece.data(), piece.offset(), piece.len());
    } else {
        let tail = store.extract(p, n - p);
        store.truncate(p);
        store.append_store(piece);
        store.append_bits(&tail, 0, n - p);
    }
    Ok(())
}

/// Replace `piece.len()` bits starting at `p`, growing the store with zero
/// fill when the write reaches past the end. A three-region mask write:
/// partial head byte, whole middle bytes, partial tail byte.
pub(crate) fn overwrite(store: &mut Store, piece: &Store, p: u64) -> Result<()> {
    check_pos(store.len(), p)?;
    if piece.is_empty() {
        return Ok(());
    }
    if p + piece.len() > store.len() {
        store.extend_zeros(p + piece.len());
    }
    store.splice(p, piece);
    Ok(())
}

/// Remove `n` bits at position `p`.
pub(crate) fn delete(store: &mut Store, n: u64, p: u64) -> Result<()> {
    if p + n > store.len() {
        return Err(Error::out_of_range(format!(
            "cannot delete {n} bits at {p} from {} bits",
            store.len()
        )));
    }
    if p == 0 {
        store.drop_front(n);
    } else if p + n == store.len() {
        store.truncate(p);
    } else {
        let tail = store.extract(p + n, store.len() - p - n);
        let tail_len = store.len() - p - n;
        store.truncate(p);
        store.append_bits(&tail, 0, tail_len);
    }
    Ok(())
}

/// Rotate `[start, end)` left by `n % (end - start)` bits in place.
pub(crate) fn rotate_left(store: &mut Store, n: u64, start: u64, end: u64) -> Result<()> {
    check_range(store.len(), start, end)?;
    let span = end - start;
    if span == 0 {
        return Ok(());
    }
    let n = n % span;
    if n == 0 {
        return Ok(());
    }
    let seg = store.extract(start, span);
    let mut rotated = vec![0u8; bytes::byte_len(0, span)];
    bytes::copy_bits(&mut rotated, 0, &seg, n, span - n);
    bytes::copy_bits(&mut rotated, span - n, &seg, 0, n);
    let piece = Store::from_realigned(&rotated, 0, span, 0);
    store.splice(start, &piece);
    Ok(())
}

/// Rotate `[start, end)` right by `n % (end - start)` bits in place.
pub(crate) fn rotate_right(store: &mut Store, n: u64, start: u64, end: u64) -> Result<()> {
    check_range(store.len(), start, end)?;
    let span = end - start;
    if span == 0 {
        return Ok(());
    }
    rotate_left(store, span - n % span, start, end)
}

/// Reverse the bits of `[start, end)` in place.
pub(crate) fn reverse(store: &mut Store, start: u64, end: u64) -> Result<()> {
    check_range(store.len(), start, end)?;
    let span = end - start;
    if span < 2 {
        return Ok(());
    }
    let seg = store.extract(start, span);
    let mut flipped = vec![0u8; bytes::byte_len(0, span)];
    if span % 8 == 0 {
        for (i, b) in seg.iter().rev().enumerate() {
            flipped[i] = b.reverse_bits();
        }
    } else {
        for i in 0..span {
            if bytes::get_bit(&seg, span - 1 - i) {
                bytes::set_bit(&mut flipped, i, true);
            }
        }
    }
    let piece = Store::from_realigned(&flipped, 0, span, 0);
    store.splice(start, &piece);
    Ok(())
}

/// Reverse bytes within pattern-sized groups across `[start, end)`, which
/// must be whole bytes. With `repeat` the pattern is applied again and
/// again while it fits; returns the number of whole applications.
pub(crate) fn byteswap(
    store: &mut Store,
    pattern: &SwapPattern,
    start: u64,
    end: u64,
    repeat: bool,
) -> Result<u64> {
    check_range(store.len(), start, end)?;
    if start % 8 != 0 || end % 8 != 0 {
        return Err(Error::alignment(format!(
            "byteswap range {start}..{end} is not whole bytes"
        )));
    }
    let total = (end - start) / 8;
    let sizes = pattern.group_sizes(total)?;
    let pattern_bytes: u64 = sizes.iter().sum();
    if pattern_bytes == 0 {
        return Ok(0);
    }
    if !repeat && pattern_bytes > total {
        return Err(Error::construction(format!(
            "byteswap pattern of {pattern_bytes} bytes does not fit in {total}"
        )));
    }
    let mut seg = store.extract(start, end - start);
    let mut offset = 0u64;
    let mut applied = 0u64;
    while offset + pattern_bytes <= total {
        for size in &sizes {
            let a = offset as usize;
            let b = (offset + size) as usize;
            seg[a..b].reverse();
            offset += size;
        }
        applied += 1;
        if !repeat {
            break;
        }
    }
    debug!(applied, pattern_bytes, "byteswap");
    let piece = Store::from_realigned(&seg, 0, end - start, 0);
    store.splice(start, &piece);
    Ok(applied)
}

/// Bytewise logical combination applied in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LogicalOp {
    And,
    Or,
    Xor,
}

/// Combine the whole store with an equal-length operand.
pub(crate) fn combine(store: &mut Store, other: &Store, op: LogicalOp) -> Result<()> {
    if store.len() != other.len() {
        return Err(Error::construction(format!(
            "logical operands differ in length: {} and {} bits",
            store.len(),
            other.len()
        )));
    }
    let mut data = store.to_bytes();
    let rhs = other.to_bytes();
    for (d, r) in data.iter_mut().zip(&rhs) {
        match op {
            LogicalOp::And => *d &= r,
            LogicalOp::Or => *d |= r,
            LogicalOp::Xor => *d ^= r,
        }
    }
    let len = store.len();
    *store = Store::from_realigned(&data, 0, len, 0);
    Ok(())
}
