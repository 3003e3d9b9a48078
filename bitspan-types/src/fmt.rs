//! Formatting helpers for byte buffers.

use core::fmt;
use core::fmt::Formatter;

/// Formatting utility to render a byte buffer as a hex string capped at `N`
/// characters, with a `...` suffix when truncated.
pub fn fmt_truncated_hex<const N: usize>(data: &[u8], f: &mut Formatter) -> fmt::Result {
    let formatted = if data.len() * 2 > N {
        let mut s = hex::encode(&data[0..N.saturating_sub(3) / 2]);
        s.push_str("...");
        s
    } else {
        hex::encode(data)
    };
    f.write_str(formatted.as_str())
}

/// Render a byte buffer as a binary digit string capped at `N` characters,
/// with a `...` suffix when truncated.
pub fn fmt_truncated_bin<const N: usize>(data: &[u8], len_bits: u64, f: &mut Formatter) -> fmt::Result {
    let take = (len_bits as usize).min(N);
    for i in 0..take {
        let bit = data[i / 8] & (0x80 >> (i % 8)) != 0;
        f.write_str(if bit { "1" } else { "0" })?;
    }
    if (len_bits as usize) > N {
        f.write_str("...")?;
    }
    Ok(())
}
