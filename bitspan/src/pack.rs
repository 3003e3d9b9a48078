//! Token-driven construction of bit sequences.

use crate::bits::Bits;
use crate::codec;
use crate::error::{Error, Result};
use crate::format::{self, Dtype, ResolvedToken};
use crate::store::Store;
use crate::value::{Keywords, Value};

/// Build a sequence from a format string and positional values.
///
/// Tokens carrying a literal value and raw literals contribute their fixed
/// bits; every other value-bearing token draws the next positional value in
/// order. Surplus or missing values fail with a construction error.
pub fn pack(format: &str, values: &[Value]) -> Result<Bits> {
    pack_with(format, values, &Keywords::new())
}

/// [`pack`] with keyword arguments: token lengths and token values may
/// reference names in `keywords`.
pub fn pack_with(format: &str, values: &[Value], keywords: &Keywords) -> Result<Bits> {
    let tokens = format::compile(format)?;
    let resolved = format::resolve(&tokens, keywords).map_err(Error::into_construction)?;
    let mut queue = values.iter();
    let mut out = Store::zeros(0);
    for token in &resolved {
        let piece = if token.dtype == Dtype::Pad {
            Store::zeros(token.bits.unwrap_or(0))
        } else if let Some(text) = token.value.clone() {
            encode_text(token, &text, keywords)?
        } else {
            let value = queue.next().ok_or_else(|| {
                Error::construction(format!("not enough values for format {format:?}"))
            })?;
            encode_value(token, value)?
        };
        out.append_store(&piece);
    }
    if queue.next().is_some() {
        return Err(Error::construction(format!(
            "too many values for format {format:?}"
        )));
    }
    Ok(Bits::from_store(out))
}

/// Encode the textual value of a `name:length=value` token. Text that does
/// not parse as a literal of the dtype may name a keyword instead.
fn encode_text(token: &ResolvedToken, text: &str, keywords: &Keywords) -> Result<Store> {
    match literal_value(token.dtype, text) {
        Ok(value) => encode_value(token, &value),
        Err(e) => match keywords.get(text) {
            Some(value) => encode_value(token, value),
            None => Err(e),
        },
    }
}

fn literal_value(dtype: Dtype, text: &str) -> Result<Value> {
    match dtype {
        Dtype::Uint
        | Dtype::UintBe
        | Dtype::UintLe
        | Dtype::UintNe
        | Dtype::Ue
        | Dtype::Uie => Ok(Value::Uint(parse_u64(text)?)),
        Dtype::Int | Dtype::IntBe | Dtype::IntLe | Dtype::IntNe | Dtype::Se | Dtype::Sie => {
            Ok(Value::Int(parse_i64(text)?))
        }
        Dtype::Float
        | Dtype::FloatBe
        | Dtype::FloatLe
        | Dtype::FloatNe
        | Dtype::Bfloat
        | Dtype::BfloatBe
        | Dtype::BfloatLe
        | Dtype::BfloatNe => text
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| Error::construction(format!("bad float literal {text:?}"))),
        Dtype::Hex => Ok(Value::Hex(text.to_string())),
        Dtype::Oct => Ok(Value::Oct(text.to_string())),
        Dtype::Bin => Ok(Value::Bin(text.to_string())),
        Dtype::Bool => match text {
            "true" | "True" | "1" => Ok(Value::Bool(true)),
            "false" | "False" | "0" => Ok(Value::Bool(false)),
            _ => Err(Error::construction(format!("bad bool literal {text:?}"))),
        },
        Dtype::Bytes | Dtype::Bits => Err(Error::construction(format!(
            "{dtype} values cannot be written as format literals"
        ))),
        Dtype::Pad => Err(Error::construction("pad takes no value")),
    }
}

fn parse_u64(text: &str) -> Result<u64> {
    let (digits, radix) = radix_of(text);
    u64::from_str_radix(digits, radix)
        .map_err(|_| Error::construction(format!("bad integer literal {text:?}")))
}

fn parse_i64(text: &str) -> Result<i64> {
    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let magnitude = parse_u64(rest)? as i128;
    let value = if negative { -magnitude } else { magnitude };
    i64::try_from(value).map_err(|_| Error::construction(format!("bad integer literal {text:?}")))
}

fn radix_of(text: &str) -> (&str, u32) {
    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(rest) = text.strip_prefix(prefix) {
            return (rest, radix);
        }
    }
    (text, 10)
}

/// Encode one positional or keyword value according to its token.
pub(crate) fn encode_value(token: &ResolvedToken, value: &Value) -> Result<Store> {
    let dtype = token.dtype;
    let store = match dtype {
        Dtype::Uint => codec::encode_uint(as_u64(value)?, sized(token)?)?,
        Dtype::Int => codec::encode_int(as_i64(value)?, sized(token)?)?,
        Dtype::UintBe | Dtype::UintLe | Dtype::UintNe => {
            codec::encode_uint_endian(as_u64(value)?, sized(token)?, dtype.endian())?
        }
        Dtype::IntBe | Dtype::IntLe | Dtype::IntNe => {
            codec::encode_int_endian(as_i64(value)?, sized(token)?, dtype.endian())?
        }
        Dtype::Float | Dtype::FloatBe | Dtype::FloatLe | Dtype::FloatNe => {
            codec::encode_float(as_f64(value)?, sized(token)?, dtype.endian())?
        }
        Dtype::Bfloat | Dtype::BfloatBe | Dtype::BfloatLe | Dtype::BfloatNe => {
            codec::encode_bfloat(as_f64(value)?, dtype.endian())
        }
        Dtype::Hex => match value {
            Value::Hex(digits) => codec::encode_hex(digits)?,
            other => return Err(mismatch(dtype, other)),
        },
        Dtype::Oct => match value {
            Value::Oct(digits) => codec::encode_oct(digits)?,
            other => return Err(mismatch(dtype, other)),
        },
        Dtype::Bin => match value {
            Value::Bin(digits) => codec::encode_bin(digits)?,
            other => return Err(mismatch(dtype, other)),
        },
        Dtype::Bytes => match value {
            Value::Bytes(data) => Store::from_bytes(data.clone()),
            other => return Err(mismatch(dtype, other)),
        },
        Dtype::Bits => match value {
            Value::Bits(bits) => bits.to_store()?,
            other => return Err(mismatch(dtype, other)),
        },
        Dtype::Bool => match value {
            Value::Bool(b) => {
                let mut store = Store::zeros(1);
                store.set(0, *b);
                store
            }
            other => return Err(mismatch(dtype, other)),
        },
        Dtype::Ue => codec::encode_ue(as_u64(value)?)?,
        Dtype::Se => codec::encode_se(as_i64(value)?)?,
        Dtype::Uie => codec::encode_uie(as_u64(value)?),
        Dtype::Sie => codec::encode_sie(as_i64(value)?),
        Dtype::Pad => Store::zeros(token.bits.unwrap_or(0)),
    };
    if let Some(bits) = token.bits {
        if !dtype.self_delimiting() && store.len() != bits {
            return Err(Error::construction(format!(
                "{dtype} value {value} is {} bits, token declares {bits}",
                store.len()
            )));
        }
    }
    Ok(store)
}

fn sized(token: &ResolvedToken) -> Result<u64> {
    token.bits.ok_or_else(|| {
        Error::construction(format!("{} needs a length to pack a value", token.dtype))
    })
}

fn mismatch(dtype: Dtype, value: &Value) -> Error {
    Error::construction(format!(
        "cannot pack a {} value into a {dtype} token",
        value.kind()
    ))
}

fn as_u64(value: &Value) -> Result<u64> {
    match value {
        Value::Uint(v) => Ok(*v),
        Value::Int(v) if *v >= 0 => Ok(*v as u64),
        other => Err(Error::construction(format!(
            "expected an unsigned integer, got {}",
            other.kind()
        ))),
    }
}

fn as_i64(value: &Value) -> Result<i64> {
    match value {
        Value::Int(v) => Ok(*v),
        Value::Uint(v) if *v <= i64::MAX as u64 => Ok(*v as i64),
        other => Err(Error::construction(format!(
            "expected a signed integer, got {}",
            other.kind()
        ))),
    }
}

fn as_f64(value: &Value) -> Result<f64> {
    match value {
        Value::Float(v) => Ok(*v),
        Value::Int(v) => Ok(*v as f64),
        Value::Uint(v) => Ok(*v as f64),
        other => Err(Error::construction(format!(
            "expected a float, got {}",
            other.kind()
        ))),
    }
}
