//! Pattern search over bit regions.
//!
//! Both directions work over bounded overlapping windows so that callers
//! can stop iterating to abort long scans. Byte-aligned searches for
//! whole-byte patterns run on the byte level; everything else falls back to
//! bit comparison, stepping eight bits when byte alignment is demanded.

use bitspan_types::bytes;
use memchr::memmem;
use tracing::trace;

use crate::error::{Error, Result};
use crate::order::{self, BitOrder};
use crate::region::View;
use crate::Bits;

/// Smallest byte-level search window.
const BYTE_WINDOW: u64 = 1024;
/// Smallest bit-level search window.
const BIT_WINDOW: u64 = 16 * 1024;

fn round_up_8(pos: u64) -> u64 {
    (pos + 7) / 8 * 8
}

fn check_pattern(plen: u64) -> Result<()> {
    if plen == 0 {
        return Err(Error::construction("cannot search for an empty pattern"));
    }
    Ok(())
}

/// Lowest `p` in `[start, end - plen]` where the pattern matches, if any.
pub(crate) fn find_in(
    view: &View<'_>,
    pat: &[u8],
    plen: u64,
    start: u64,
    end: u64,
    aligned: bool,
) -> Result<Option<u64>> {
    check_pattern(plen)?;
    let end = end.min(view.len());
    if start >= end || end - start < plen {
        return Ok(None);
    }
    if aligned && plen % 8 == 0 {
        return find_bytes(view, pat, plen, start, end);
    }
    let step = if aligned { 8 } else { 1 };
    let mut from = if aligned { round_up_8(start) } else { start };
    let window = (10 * plen).max(BIT_WINDOW);
    while from + plen <= end {
        let take = (end - from).min(window);
        if take < plen {
            break;
        }
        trace!(from, take, "bit search window");
        let win = view.extract(from, take)?;
        let mut p = 0;
        while p + plen <= take {
            if bytes::bits_eq(&win, p, pat, 0, plen) {
                return Ok(Some(from + p));
            }
            p += step;
        }
        from += (take - plen) / step * step + step;
    }
    Ok(None)
}

fn find_bytes(view: &View<'_>, pat: &[u8], plen: u64, start: u64, end: u64) -> Result<Option<u64>> {
    let pb = (plen / 8) as usize;
    let window_bytes = (10 * pb as u64).max(BYTE_WINDOW);
    let mut from = round_up_8(start);
    while from + plen <= end {
        let usable = ((end - from).min(window_bytes * 8) / 8) as usize;
        if usable < pb {
            break;
        }
        trace!(from, usable, "byte search window");
        let win = view.extract(from, usable as u64 * 8)?;
        if let Some(i) = memmem::find(&win, pat) {
            return Ok(Some(from + i as u64 * 8));
        }
        from += (usable - pb + 1) as u64 * 8;
    }
    Ok(None)
}

/// Highest `p` in `[start, end - plen]` where the pattern matches, if any.
pub(crate) fn rfind_in(
    view: &View<'_>,
    pat: &[u8],
    plen: u64,
    start: u64,
    end: u64,
    aligned: bool,
) -> Result<Option<u64>> {
    check_pattern(plen)?;
    let end = end.min(view.len());
    if start >= end || end - start < plen {
        return Ok(None);
    }
    if aligned && plen % 8 == 0 {
        return rfind_bytes(view, pat, plen, start, end);
    }
    let step = if aligned { 8 } else { 1 };
    let lo = if aligned { round_up_8(start) } else { start };
    if end < plen || end - plen < lo {
        return Ok(None);
    }
    let mut cand_hi = if aligned {
        (end - plen) / 8 * 8
    } else {
        end - plen
    };
    let window = (10 * plen).max(BIT_WINDOW);
    loop {
        let reach = cand_hi.saturating_sub(window.saturating_sub(plen));
        let cand_lo = (if aligned { round_up_8(reach) } else { reach }).max(lo);
        let take = cand_hi + plen - cand_lo;
        let win = view.extract(cand_lo, take)?;
        let mut p = cand_hi - cand_lo;
        loop {
            if bytes::bits_eq(&win, p, pat, 0, plen) {
                return Ok(Some(cand_lo + p));
            }
            if p < step {
                break;
            }
            p -= step;
        }
        if cand_lo <= lo || cand_lo < step {
            return Ok(None);
        }
        cand_hi = cand_lo - step;
    }
}

fn rfind_bytes(view: &View<'_>, pat: &[u8], plen: u64, start: u64, end: u64) -> Result<Option<u64>> {
    let pb = plen / 8;
    let lo = round_up_8(start);
    if end < plen || end - plen < lo {
        return Ok(None);
    }
    let mut cand_hi = (end - plen) / 8 * 8;
    let window_bytes = (10 * pb).max(BYTE_WINDOW);
    loop {
        let reach = cand_hi.saturating_sub((window_bytes - pb) * 8);
        let cand_lo = round_up_8(reach).max(lo);
        let take = cand_hi + plen - cand_lo;
        let win = view.extract(cand_lo, take)?;
        if let Some(i) = memmem::rfind(&win, pat) {
            return Ok(Some(cand_lo + i as u64 * 8));
        }
        if cand_lo <= lo || cand_lo < 8 {
            return Ok(None);
        }
        cand_hi = cand_lo - 8;
    }
}

/// Lazy iterator over match positions, created by the find-all family.
///
/// Yields positions in the process-wide numbering mode captured per item;
/// matches are non-overlapping when byte aligned with a whole-byte pattern
/// and may overlap otherwise. A read failure ends the iteration after
/// surfacing the error.
pub struct FindAll<'a> {
    bits: &'a Bits,
    pat: Vec<u8>,
    plen: u64,
    aligned: bool,
    backward: bool,
    lo: u64,
    hi: u64,
    remaining: Option<u64>,
    done: bool,
}

impl<'a> FindAll<'a> {
    pub(crate) fn new(
        bits: &'a Bits,
        pattern: &Bits,
        start: u64,
        end: u64,
        aligned: bool,
        count: Option<u64>,
    ) -> Result<Self> {
        check_pattern(pattern.len())?;
        let pat = pattern.view().extract(0, pattern.len())?;
        Ok(FindAll {
            bits,
            pat,
            plen: pattern.len(),
            aligned,
            backward: order::bit_order() == BitOrder::Lsb0,
            lo: start,
            hi: end.min(bits.len()),
            remaining: count,
            done: false,
        })
    }

    fn advance(&self) -> u64 {
        if self.aligned && self.plen % 8 == 0 {
            self.plen
        } else if self.aligned {
            8
        } else {
            1
        }
    }
}

impl Iterator for FindAll<'_> {
    type Item = Result<u64>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.remaining == Some(0) {
            return None;
        }
        let found = if self.backward {
            rfind_in(&self.bits.view(), &self.pat, self.plen, self.lo, self.hi, self.aligned)
        } else {
            find_in(&self.bits.view(), &self.pat, self.plen, self.lo, self.hi, self.aligned)
        };
        match found {
            Ok(Some(pos)) => {
                let advance = self.advance();
                if self.backward {
                    // the next match must sit at least `advance` bits lower
                    match (pos + self.plen).checked_sub(advance) {
                        Some(hi) if hi > self.lo => self.hi = hi,
                        _ => self.done = true,
                    }
                } else {
                    self.lo = pos + advance;
                }
                if let Some(count) = &mut self.remaining {
                    *count -= 1;
                }
                Some(Ok(order::find_pos_out(self.bits.len(), pos, self.plen)))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
