//! Process-wide bit numbering mode.
//!
//! The engine stores bits MSB-first and all internal arithmetic uses MSB0
//! positions. The numbering mode only changes how positions are presented
//! at the public boundary: single-bit get/set/flip and the coordinates
//! accepted and returned by the find family. Byte order and wire-format
//! interpretations are unaffected.

use core::sync::atomic::{AtomicU8, Ordering};

/// How bit positions are numbered at the API boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BitOrder {
    /// Bit 0 is the most significant bit of the first byte.
    #[default]
    Msb0,
    /// Bit 0 is the least significant bit of the last byte.
    Lsb0,
}

static ORDER: AtomicU8 = AtomicU8::new(0);

/// Set the process-wide numbering mode.
///
/// Intended to be called once during start-up; flipping it while other
/// threads index sequences is not synchronized with their reads.
pub fn set_bit_order(order: BitOrder) {
    ORDER.store(order as u8, Ordering::Relaxed);
}

/// The current process-wide numbering mode.
pub fn bit_order() -> BitOrder {
    match ORDER.load(Ordering::Relaxed) {
        0 => BitOrder::Msb0,
        _ => BitOrder::Lsb0,
    }
}

/// Translate a caller-facing single-bit position into an MSB0 position.
pub(crate) fn pos_in(len: u64, pos: u64) -> u64 {
    match bit_order() {
        BitOrder::Msb0 => pos,
        BitOrder::Lsb0 => len - 1 - pos,
    }
}

/// Translate an MSB0 match position back into caller-facing coordinates.
pub(crate) fn find_pos_out(len: u64, pos: u64, pattern_len: u64) -> u64 {
    match bit_order() {
        BitOrder::Msb0 => pos,
        BitOrder::Lsb0 => len - pos - pattern_len,
    }
}

/// Translate a caller-facing `[start, end)` search window into MSB0.
pub(crate) fn range_in(len: u64, start: u64, end: u64) -> (u64, u64) {
    match bit_order() {
        BitOrder::Msb0 => (start, end),
        BitOrder::Lsb0 => (len - end, len - start),
    }
}
