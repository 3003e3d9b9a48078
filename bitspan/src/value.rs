//! Typed values exchanged with the packer and unpacker.

use core::fmt;
use std::collections::HashMap;

use crate::Bits;

/// Keyword arguments for packing and unpacking: token lengths and token
/// values referenced by name from a format string.
pub type Keywords = HashMap<String, Value>;

/// A typed value produced by unpacking a token or consumed when packing one.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// Unsigned integer, up to 64 bits.
    Uint(u64),
    /// Signed two's complement integer, up to 64 bits.
    Int(i64),
    /// IEEE 754 float (widened to f64 for 16 and 32 bit codecs).
    Float(f64),
    /// Hex digit string without a prefix.
    Hex(String),
    /// Octal digit string without a prefix.
    Oct(String),
    /// Binary digit string without a prefix.
    Bin(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// A bit sequence.
    Bits(Bits),
    /// A single bit.
    Bool(bool),
}

impl Value {
    /// Build a hex-digit value; digits are validated when packed.
    pub fn hex(digits: impl Into<String>) -> Self {
        Value::Hex(digits.into())
    }

    /// Build an octal-digit value; digits are validated when packed.
    pub fn oct(digits: impl Into<String>) -> Self {
        Value::Oct(digits.into())
    }

    /// Build a binary-digit value; digits are validated when packed.
    pub fn bin(digits: impl Into<String>) -> Self {
        Value::Bin(digits.into())
    }

    /// Short label used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Uint(_) => "uint",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Hex(_) => "hex",
            Value::Oct(_) => "oct",
            Value::Bin(_) => "bin",
            Value::Bytes(_) => "bytes",
            Value::Bits(_) => "bits",
            Value::Bool(_) => "bool",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Uint(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Hex(s) => write!(f, "0x{s}"),
            Value::Oct(s) => write!(f, "0o{s}"),
            Value::Bin(s) => write!(f, "0b{s}"),
            Value::Bytes(b) => write!(f, "{}", hex::encode(b)),
            Value::Bits(b) => write!(f, "{b}"),
            Value::Bool(v) => write!(f, "{v}"),
        }
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Uint(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Uint(v.into())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl From<Bits> for Value {
    fn from(v: Bits) -> Self {
        Value::Bits(v)
    }
}
