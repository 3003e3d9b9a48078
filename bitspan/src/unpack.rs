//! Token-driven destructuring of bit sequences.

use crate::bits::Bits;
use crate::codec;
use crate::error::{Error, Result};
use crate::format::{self, Dtype, ResolvedToken};
use crate::region::View;
use crate::store::Store;
use crate::value::{Keywords, Value};

/// Read every token of `format` from the start of `bits`, returning the
/// produced values in order. A stretchy token absorbs whatever the fixed
/// tokens after it leave over; tokens carrying a literal value and pad
/// tokens are consumed without producing a value.
pub fn unpack(format: &str, bits: &Bits) -> Result<Vec<Value>> {
    unpack_with(format, bits, &Keywords::new())
}

/// [`unpack`] with keyword arguments resolving keyword-valued lengths.
pub fn unpack_with(format: &str, bits: &Bits, keywords: &Keywords) -> Result<Vec<Value>> {
    let tokens = format::compile(format)?;
    let resolved = format::resolve(&tokens, keywords)?;
    let mut pos = 0;
    read_tokens(&bits.view(), &mut pos, &resolved)
}

/// Read a resolved token list at `pos`, advancing it past the consumed
/// bits. On failure the position is left where the caller gave it.
pub(crate) fn read_tokens(
    view: &View<'_>,
    pos: &mut u64,
    tokens: &[ResolvedToken],
) -> Result<Vec<Value>> {
    let fixed_tail = stretch_tail(tokens);
    let mut at = *pos;
    let mut values = Vec::new();
    for token in tokens {
        let bits = match token.bits {
            Some(bits) => Some(bits),
            None if token.is_stretchy() => {
                let tail = fixed_tail.unwrap_or(0);
                let remaining = view.len().saturating_sub(at);
                if remaining < tail {
                    return Err(Error::out_of_range(format!(
                        "{} bits left cannot satisfy the {tail} fixed bits after the unbounded token",
                        remaining
                    )));
                }
                let stretch = remaining - tail;
                token.dtype.validate_bits(stretch)?;
                Some(stretch)
            }
            None => None,
        };
        let value = read_token(view, &mut at, token.dtype, bits)?;
        if token.value.is_none() && token.dtype != Dtype::Pad {
            if let Some(value) = value {
                values.push(value);
            }
        }
    }
    *pos = at;
    Ok(values)
}

/// Bits required by the fixed tokens following the stretchy one, or `None`
/// when the format has no stretchy token.
fn stretch_tail(tokens: &[ResolvedToken]) -> Option<u64> {
    let at = tokens.iter().position(ResolvedToken::is_stretchy)?;
    Some(tokens[at + 1..].iter().filter_map(|t| t.bits).sum())
}

/// Read a single token, advancing `pos` past it on success.
pub(crate) fn read_token(
    view: &View<'_>,
    pos: &mut u64,
    dtype: Dtype,
    bits: Option<u64>,
) -> Result<Option<Value>> {
    let value = match dtype {
        Dtype::Ue => {
            let (v, used) = codec::decode_ue(view, *pos)?;
            *pos += used;
            return Ok(Some(Value::Uint(v)));
        }
        Dtype::Se => {
            let (v, used) = codec::decode_se(view, *pos)?;
            *pos += used;
            return Ok(Some(Value::Int(v)));
        }
        Dtype::Uie => {
            let (v, used) = codec::decode_uie(view, *pos)?;
            *pos += used;
            return Ok(Some(Value::Uint(v)));
        }
        Dtype::Sie => {
            let (v, used) = codec::decode_sie(view, *pos)?;
            *pos += used;
            return Ok(Some(Value::Int(v)));
        }
        _ => {
            let bits = bits.ok_or_else(|| {
                Error::interpretation(format!("{dtype} needs a length to be read"))
            })?;
            if *pos + bits > view.len() {
                return Err(Error::out_of_range(format!(
                    "reading {bits} bits at position {pos} past the end of {} bits",
                    view.len()
                )));
            }
            let value = match dtype {
                Dtype::Uint => Some(Value::Uint(codec::decode_uint(view, *pos, bits)?)),
                Dtype::Int => Some(Value::Int(codec::decode_int(view, *pos, bits)?)),
                Dtype::UintBe | Dtype::UintLe | Dtype::UintNe => Some(Value::Uint(
                    codec::decode_uint_endian(view, *pos, bits, dtype.endian())?,
                )),
                Dtype::IntBe | Dtype::IntLe | Dtype::IntNe => Some(Value::Int(
                    codec::decode_int_endian(view, *pos, bits, dtype.endian())?,
                )),
                Dtype::Float | Dtype::FloatBe | Dtype::FloatLe | Dtype::FloatNe => Some(
                    Value::Float(codec::decode_float(view, *pos, bits, dtype.endian())?),
                ),
                Dtype::Bfloat | Dtype::BfloatBe | Dtype::BfloatLe | Dtype::BfloatNe => {
                    Some(Value::Float(codec::decode_bfloat(view, *pos, dtype.endian())?))
                }
                Dtype::Hex => Some(Value::Hex(codec::decode_hex(view, *pos, bits)?)),
                Dtype::Oct => Some(Value::Oct(codec::decode_oct(view, *pos, bits)?)),
                Dtype::Bin => Some(Value::Bin(codec::decode_bin(view, *pos, bits)?)),
                Dtype::Bytes => Some(Value::Bytes(codec::decode_bytes(view, *pos, bits)?)),
                Dtype::Bits => {
                    let data = view.extract(*pos, bits)?;
                    Some(Value::Bits(Bits::from_store(Store::from_realigned(
                        &data, 0, bits, 0,
                    ))))
                }
                Dtype::Bool => Some(Value::Bool(codec::decode_bool(view, *pos)?)),
                Dtype::Pad => None,
                _ => None,
            };
            *pos += bits;
            value
        }
    };
    Ok(value)
}
