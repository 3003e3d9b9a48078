//! Pure codecs between typed values and bit regions.
//!
//! Encoders build a zero-offset [`Store`]; decoders read through a
//! [`View`] at an arbitrary bit position. None of them depend on the
//! alignment of the enclosing sequence.

use bitspan_types::bytes;
use half::{bf16, f16};

use crate::error::{Error, Result};
use crate::region::View;
use crate::store::Store;

/// Byte order of a multi-byte codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Endian {
    Big,
    Little,
}

/// Byte order of the host, fixed at build time.
pub(crate) const NATIVE: Endian = if cfg!(target_endian = "little") {
    Endian::Little
} else {
    Endian::Big
};

fn check_width(bits: u64, what: &str) -> Result<()> {
    if bits == 0 {
        return Err(Error::interpretation(format!("{what} needs at least one bit")));
    }
    if bits > 64 {
        return Err(Error::interpretation(format!(
            "{what} of {bits} bits exceeds the 64 bit limit"
        )));
    }
    Ok(())
}

/// Left-align `value`'s low `bits` bits into a fresh store. No range check.
fn store_from_u64(value: u64, bits: u64) -> Store {
    let shifted = if bits == 64 { value } else { value << (64 - bits) };
    let be = shifted.to_be_bytes();
    Store::from_realigned(&be, 0, bits, 0)
}

// --- unsigned / signed integers -------------------------------------------

pub(crate) fn encode_uint(value: u64, bits: u64) -> Result<Store> {
    check_width(bits, "uint").map_err(construction)?;
    if bits < 64 && value >> bits != 0 {
        return Err(Error::construction(format!(
            "{value} does not fit in {bits} bits"
        )));
    }
    Ok(store_from_u64(value, bits))
}

pub(crate) fn encode_int(value: i64, bits: u64) -> Result<Store> {
    check_width(bits, "int").map_err(construction)?;
    if bits < 64 {
        let lo = -(1i128 << (bits - 1));
        let hi = (1i128 << (bits - 1)) - 1;
        if (value as i128) < lo || (value as i128) > hi {
            return Err(Error::construction(format!(
                "{value} does not fit in {bits} signed bits"
            )));
        }
    }
    let mask = if bits == 64 { u64::MAX } else { (1u64 << bits) - 1 };
    Ok(store_from_u64(value as u64 & mask, bits))
}

pub(crate) fn encode_uint_endian(value: u64, bits: u64, endian: Endian) -> Result<Store> {
    check_byte_multiple(bits, "byte-endian uint").map_err(construction)?;
    let mut store = encode_uint(value, bits)?;
    if endian == Endian::Little {
        store = Store::from_bytes(reversed(store.to_bytes()));
    }
    Ok(store)
}

pub(crate) fn encode_int_endian(value: i64, bits: u64, endian: Endian) -> Result<Store> {
    check_byte_multiple(bits, "byte-endian int").map_err(construction)?;
    let mut store = encode_int(value, bits)?;
    if endian == Endian::Little {
        store = Store::from_bytes(reversed(store.to_bytes()));
    }
    Ok(store)
}

pub(crate) fn decode_uint(view: &View<'_>, pos: u64, bits: u64) -> Result<u64> {
    check_width(bits, "uint")?;
    let data = view.extract(pos, bits)?;
    let mut acc = 0u64;
    for b in &data {
        acc = acc << 8 | u64::from(*b);
    }
    Ok(acc >> (data.len() as u64 * 8 - bits))
}

pub(crate) fn decode_int(view: &View<'_>, pos: u64, bits: u64) -> Result<i64> {
    let u = decode_uint(view, pos, bits)?;
    Ok(sign_extend(u, bits))
}

pub(crate) fn decode_uint_endian(view: &View<'_>, pos: u64, bits: u64, endian: Endian) -> Result<u64> {
    check_byte_multiple(bits, "byte-endian uint")?;
    let data = match endian {
        Endian::Big => view.extract(pos, bits)?,
        Endian::Little => reversed(view.extract(pos, bits)?),
    };
    let mut acc = 0u64;
    for b in &data {
        acc = acc << 8 | u64::from(*b);
    }
    Ok(acc)
}

pub(crate) fn decode_int_endian(view: &View<'_>, pos: u64, bits: u64, endian: Endian) -> Result<i64> {
    let u = decode_uint_endian(view, pos, bits, endian)?;
    Ok(sign_extend(u, bits))
}

fn sign_extend(u: u64, bits: u64) -> i64 {
    if bits < 64 && u >> (bits - 1) & 1 == 1 {
        (u | !0u64 << bits) as i64
    } else {
        u as i64
    }
}

fn check_byte_multiple(bits: u64, what: &str) -> Result<()> {
    check_width(bits, what)?;
    if bits % 8 != 0 {
        return Err(Error::interpretation(format!(
            "{what} needs a multiple of eight bits, not {bits}"
        )));
    }
    Ok(())
}

fn reversed(mut data: Vec<u8>) -> Vec<u8> {
    data.reverse();
    data
}

// Encoding-side wrapper: the same length rules surface as construction
// failures when writing and interpretation failures when reading.
fn construction(e: Error) -> Error {
    e.into_construction()
}

// --- floats ----------------------------------------------------------------

pub(crate) fn encode_float(value: f64, bits: u64, endian: Endian) -> Result<Store> {
    let data = match (bits, endian) {
        (16, Endian::Big) => f16::from_f64(value).to_bits().to_be_bytes().to_vec(),
        (16, Endian::Little) => f16::from_f64(value).to_bits().to_le_bytes().to_vec(),
        (32, Endian::Big) => (value as f32).to_bits().to_be_bytes().to_vec(),
        (32, Endian::Little) => (value as f32).to_bits().to_le_bytes().to_vec(),
        (64, Endian::Big) => value.to_bits().to_be_bytes().to_vec(),
        (64, Endian::Little) => value.to_bits().to_le_bytes().to_vec(),
        _ => {
            return Err(Error::construction(format!(
                "float length must be 16, 32 or 64 bits, not {bits}"
            )))
        }
    };
    Ok(Store::from_bytes(data))
}

pub(crate) fn encode_bfloat(value: f64, endian: Endian) -> Store {
    let bits = bf16::from_f64(value).to_bits();
    let data = match endian {
        Endian::Big => bits.to_be_bytes(),
        Endian::Little => bits.to_le_bytes(),
    };
    Store::from_bytes(data.to_vec())
}

pub(crate) fn decode_float(view: &View<'_>, pos: u64, bits: u64, endian: Endian) -> Result<f64> {
    if !matches!(bits, 16 | 32 | 64) {
        return Err(Error::interpretation(format!(
            "float length must be 16, 32 or 64 bits, not {bits}"
        )));
    }
    let data = view.extract(pos, bits)?;
    let value = match (bits, endian) {
        (16, Endian::Big) => f16::from_bits(u16::from_be_bytes([data[0], data[1]])).to_f64(),
        (16, Endian::Little) => f16::from_bits(u16::from_le_bytes([data[0], data[1]])).to_f64(),
        (32, Endian::Big) => f64::from(f32::from_bits(u32::from_be_bytes(four(&data)))),
        (32, Endian::Little) => f64::from(f32::from_bits(u32::from_le_bytes(four(&data)))),
        (64, Endian::Big) => f64::from_bits(u64::from_be_bytes(eight(&data))),
        _ => f64::from_bits(u64::from_le_bytes(eight(&data))),
    };
    Ok(value)
}

pub(crate) fn decode_bfloat(view: &View<'_>, pos: u64, endian: Endian) -> Result<f64> {
    let data = view.extract(pos, 16)?;
    let raw = match endian {
        Endian::Big => u16::from_be_bytes([data[0], data[1]]),
        Endian::Little => u16::from_le_bytes([data[0], data[1]]),
    };
    Ok(bf16::from_bits(raw).to_f64())
}

fn four(data: &[u8]) -> [u8; 4] {
    [data[0], data[1], data[2], data[3]]
}

fn eight(data: &[u8]) -> [u8; 8] {
    [
        data[0], data[1], data[2], data[3], data[4], data[5], data[6], data[7],
    ]
}

// --- digit strings ---------------------------------------------------------

fn strip_prefix<'a>(digits: &'a str, prefixes: [&str; 2]) -> &'a str {
    digits
        .strip_prefix(prefixes[0])
        .or_else(|| digits.strip_prefix(prefixes[1]))
        .unwrap_or(digits)
}

pub(crate) fn encode_hex(digits: &str) -> Result<Store> {
    let digits = strip_prefix(digits, ["0x", "0X"]);
    let mut store = Store::zeros(digits.len() as u64 * 4);
    for (i, c) in digits.chars().enumerate() {
        let nibble = c
            .to_digit(16)
            .ok_or_else(|| Error::construction(format!("invalid hex digit {c:?}")))?;
        write_unit(&mut store, i as u64 * 4, nibble as u64, 4);
    }
    Ok(store)
}

pub(crate) fn encode_oct(digits: &str) -> Result<Store> {
    let digits = strip_prefix(digits, ["0o", "0O"]);
    let mut store = Store::zeros(digits.len() as u64 * 3);
    for (i, c) in digits.chars().enumerate() {
        let digit = c
            .to_digit(8)
            .ok_or_else(|| Error::construction(format!("invalid octal digit {c:?}")))?;
        write_unit(&mut store, i as u64 * 3, digit as u64, 3);
    }
    Ok(store)
}

pub(crate) fn encode_bin(digits: &str) -> Result<Store> {
    let digits = strip_prefix(digits, ["0b", "0B"]);
    let mut store = Store::zeros(digits.len() as u64);
    for (i, c) in digits.chars().enumerate() {
        match c {
            '0' => {}
            '1' => store.set(i as u64, true),
            _ => return Err(Error::construction(format!("invalid binary digit {c:?}"))),
        }
    }
    Ok(store)
}

fn write_unit(store: &mut Store, pos: u64, value: u64, width: u64) {
    for k in 0..width {
        if value >> (width - 1 - k) & 1 == 1 {
            store.set(pos + k, true);
        }
    }
}

pub(crate) fn decode_hex(view: &View<'_>, pos: u64, len: u64) -> Result<String> {
    if len % 4 != 0 {
        return Err(Error::interpretation(format!(
            "cannot interpret {len} bits as hex, not a multiple of four"
        )));
    }
    let data = view.extract(pos, len)?;
    let mut text = hex::encode(data);
    text.truncate((len / 4) as usize);
    Ok(text)
}

pub(crate) fn decode_oct(view: &View<'_>, pos: u64, len: u64) -> Result<String> {
    if len % 3 != 0 {
        return Err(Error::interpretation(format!(
            "cannot interpret {len} bits as octal, not a multiple of three"
        )));
    }
    let data = view.extract(pos, len)?;
    let mut text = String::with_capacity((len / 3) as usize);
    for i in 0..len / 3 {
        let digit = bytes::peek8(&data, i * 3, 3);
        text.push(char::from(b'0' + digit));
    }
    Ok(text)
}

pub(crate) fn decode_bin(view: &View<'_>, pos: u64, len: u64) -> Result<String> {
    let data = view.extract(pos, len)?;
    let mut text = String::with_capacity(len as usize);
    for i in 0..len {
        text.push(if bytes::get_bit(&data, i) { '1' } else { '0' });
    }
    Ok(text)
}

// --- bytes and bool --------------------------------------------------------

pub(crate) fn decode_bytes(view: &View<'_>, pos: u64, len: u64) -> Result<Vec<u8>> {
    if len % 8 != 0 {
        return Err(Error::interpretation(format!(
            "cannot interpret {len} bits as bytes, not a multiple of eight"
        )));
    }
    view.extract(pos, len)
}

pub(crate) fn decode_bool(view: &View<'_>, pos: u64) -> Result<bool> {
    view.get(pos)
}

// --- exponential-Golomb ----------------------------------------------------

/// Prefix code: `k` zeros, a one, then the low `k` bits of `n + 1` where
/// `k = floor(log2(n + 1))`.
pub(crate) fn encode_ue(n: u64) -> Result<Store> {
    if n == u64::MAX {
        return Err(Error::construction(
            "exp-Golomb cannot encode a value past 2^64 - 2",
        ));
    }
    let m = n as u128 + 1;
    let k = (127 - m.leading_zeros()) as u64;
    let mut store = Store::zeros(2 * k + 1);
    store.set(k, true);
    for i in 0..k {
        if m >> (k - 1 - i) & 1 == 1 {
            store.set(k + 1 + i, true);
        }
    }
    Ok(store)
}

pub(crate) fn encode_se(i: i64) -> Result<Store> {
    if i == i64::MIN {
        return Err(Error::construction(
            "signed exp-Golomb cannot encode the minimum 64 bit integer",
        ));
    }
    let m = if i > 0 {
        2 * i as u128 - 1
    } else {
        2 * (-(i as i128)) as u128
    };
    // i64::MIN excluded above, so the mapping fits in a u64
    encode_ue(m as u64)
}

pub(crate) fn decode_ue(view: &View<'_>, pos: u64) -> Result<(u64, u64)> {
    let zeros = view.count_zeros_from(pos)?;
    if pos + zeros >= view.len() {
        return Err(Error::out_of_range(
            "exp-Golomb code ran off the end of the sequence",
        ));
    }
    if zeros > 63 {
        return Err(Error::interpretation(
            "exp-Golomb value exceeds the 64 bit limit",
        ));
    }
    let tail = if zeros > 0 {
        decode_uint(view, pos + zeros + 1, zeros)?
    } else {
        0
    };
    let value = (1u128 << zeros) - 1 + u128::from(tail);
    Ok((value as u64, 2 * zeros + 1))
}

pub(crate) fn decode_se(view: &View<'_>, pos: u64) -> Result<(i64, u64)> {
    let (m, consumed) = decode_ue(view, pos)?;
    let value = if m % 2 == 0 {
        -((m / 2) as i64)
    } else {
        ((m - 1) / 2 + 1) as i64
    };
    Ok((value, consumed))
}

/// Interleaved variant: data bits alternate with zero separators and a one
/// bit terminates the code.
pub(crate) fn encode_uie(n: u64) -> Store {
    let m = n as u128 + 1;
    let k = 127 - m.leading_zeros();
    let mut store = Store::zeros(2 * k as u64 + 1);
    for i in 0..k {
        // separator zero is already in place; write the data bit after it
        if m >> (k - 1 - i) & 1 == 1 {
            store.set(2 * i as u64 + 1, true);
        }
    }
    store.set(2 * k as u64, true);
    store
}

pub(crate) fn encode_sie(i: i64) -> Store {
    let magnitude = i.unsigned_abs();
    let mut store = encode_uie(magnitude);
    if i != 0 {
        let sign = Store::from_bytes(vec![if i < 0 { 0x80 } else { 0x00 }]);
        store.append_bits(sign.data(), 0, 1);
    }
    store
}

pub(crate) fn decode_uie(view: &View<'_>, pos: u64) -> Result<(u64, u64)> {
    let mut m: u128 = 1;
    let mut consumed = 0;
    loop {
        let stop = view.get(pos + consumed)?;
        consumed += 1;
        if stop {
            break;
        }
        let data = view.get(pos + consumed)?;
        consumed += 1;
        m = m << 1 | u128::from(data);
        if m > u128::from(u64::MAX) + 1 {
            return Err(Error::interpretation(
                "interleaved exp-Golomb value exceeds the 64 bit limit",
            ));
        }
    }
    Ok(((m - 1) as u64, consumed))
}

pub(crate) fn decode_sie(view: &View<'_>, pos: u64) -> Result<(i64, u64)> {
    let (m, mut consumed) = decode_uie(view, pos)?;
    if m == 0 {
        return Ok((0, consumed));
    }
    let negative = view.get(pos + consumed)?;
    consumed += 1;
    let limit = if negative {
        i64::MIN.unsigned_abs()
    } else {
        i64::MAX as u64
    };
    if m > limit {
        return Err(Error::interpretation(
            "interleaved exp-Golomb value exceeds the signed 64 bit limit",
        ));
    }
    let value = if negative {
        (-(m as i128)) as i64
    } else {
        m as i64
    };
    Ok((value, consumed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uint_stores_left_align() {
        let s = encode_uint(0b101, 3).unwrap();
        assert_eq!(3, s.len());
        assert_eq!(vec![0b1010_0000], s.to_bytes());
        let s = encode_uint(u64::MAX, 64).unwrap();
        assert_eq!(vec![0xff; 8], s.to_bytes());
        assert!(encode_uint(8, 3).is_err());
    }

    #[test]
    fn sign_extension_covers_the_edges() {
        assert_eq!(-1, sign_extend(1, 1));
        assert_eq!(0, sign_extend(0, 1));
        assert_eq!(-1, sign_extend(u64::MAX, 64));
        assert_eq!(i64::MIN, sign_extend(1 << 63, 64));
        assert_eq!(3, sign_extend(3, 3));
        assert_eq!(-4, sign_extend(4, 3));
    }

    #[test]
    fn golomb_encoders_match_known_codes() {
        assert_eq!(1, encode_ue(0).unwrap().len());
        assert_eq!(vec![0b0100_0000], encode_ue(1).unwrap().to_bytes());
        assert_eq!(vec![0b0010_0000], encode_uie(1).to_bytes());
        assert!(encode_ue(u64::MAX).is_err());
        assert!(encode_se(i64::MIN).is_err());
    }
}
