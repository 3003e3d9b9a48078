//! The declarative format mini-language.
//!
//! A format string is a comma-separated list of tokens: typed items such as
//! `uint:12` or `float:32=1.5`, raw literals such as `0xff`, repetition
//! factors such as `3*bool`, parenthesised groups such as `2*(uint:8, 0b1)`,
//! and compact struct codes such as `<4h`. Lengths may reference keyword
//! names resolved when packing or unpacking. Parsed token lists are memoized
//! in a bounded LRU cache keyed by the format text.

use std::num::NonZeroUsize;
use std::str::FromStr;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use itertools::Itertools;
use strum::IntoEnumIterator;

use crate::codec::Endian;
use crate::error::{Error, Result};
use crate::value::{Keywords, Value};

/// Parsed formats retained by the memo cache.
const CACHE_CAPACITY: usize = 512;

/// The interpretation a token applies to its bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "lowercase")]
pub enum Dtype {
    /// Unsigned integer, any width from 1 to 64 bits, big-endian bit order.
    Uint,
    /// Signed two's complement integer, 1 to 64 bits.
    Int,
    /// Unsigned integer of whole big-endian bytes.
    UintBe,
    /// Signed integer of whole big-endian bytes.
    IntBe,
    /// Unsigned integer of whole little-endian bytes.
    UintLe,
    /// Signed integer of whole little-endian bytes.
    IntLe,
    /// Unsigned integer of whole native-endian bytes.
    UintNe,
    /// Signed integer of whole native-endian bytes.
    IntNe,
    /// IEEE 754 float of 16, 32 or 64 bits, big-endian.
    Float,
    /// IEEE 754 float, big-endian.
    FloatBe,
    /// IEEE 754 float, little-endian.
    FloatLe,
    /// IEEE 754 float, native-endian.
    FloatNe,
    /// 16 bit brain float, big-endian.
    Bfloat,
    /// 16 bit brain float, big-endian.
    BfloatBe,
    /// 16 bit brain float, little-endian.
    BfloatLe,
    /// 16 bit brain float, native-endian.
    BfloatNe,
    /// Hex digit text, four bits per digit.
    Hex,
    /// Octal digit text, three bits per digit.
    Oct,
    /// Binary digit text, one bit per digit.
    Bin,
    /// Raw bytes; lengths count bytes, not bits.
    Bytes,
    /// A plain sub-sequence.
    Bits,
    /// A single bit.
    Bool,
    /// Unsigned exponential-Golomb code.
    Ue,
    /// Signed exponential-Golomb code.
    Se,
    /// Unsigned interleaved exponential-Golomb code.
    Uie,
    /// Signed interleaved exponential-Golomb code.
    Sie,
    /// Zero bits consumed and produced without a value.
    Pad,
}

impl Dtype {
    /// Bits per declared length unit: lengths count bytes for `bytes`
    /// tokens and bits everywhere else.
    pub fn unit_bits(self) -> u64 {
        match self {
            Dtype::Bytes => 8,
            _ => 1,
        }
    }

    /// Whether a lengthless token of this dtype absorbs all remaining bits.
    pub fn can_stretch(self) -> bool {
        matches!(
            self,
            Dtype::Uint
                | Dtype::Int
                | Dtype::UintBe
                | Dtype::IntBe
                | Dtype::UintLe
                | Dtype::IntLe
                | Dtype::UintNe
                | Dtype::IntNe
                | Dtype::Hex
                | Dtype::Oct
                | Dtype::Bin
                | Dtype::Bytes
                | Dtype::Bits
        )
    }

    /// Length implied by the dtype when none is declared.
    pub fn implicit_bits(self) -> Option<u64> {
        match self {
            Dtype::Bool => Some(1),
            Dtype::Bfloat | Dtype::BfloatBe | Dtype::BfloatLe | Dtype::BfloatNe => Some(16),
            _ => None,
        }
    }

    /// Whether the dtype determines its own extent while being read.
    pub fn self_delimiting(self) -> bool {
        matches!(self, Dtype::Ue | Dtype::Se | Dtype::Uie | Dtype::Sie)
    }

    /// Byte order for the multi-byte dtypes.
    pub(crate) fn endian(self) -> Endian {
        match self {
            Dtype::UintLe | Dtype::IntLe | Dtype::FloatLe | Dtype::BfloatLe => Endian::Little,
            Dtype::UintNe | Dtype::IntNe | Dtype::FloatNe | Dtype::BfloatNe => crate::codec::NATIVE,
            _ => Endian::Big,
        }
    }

    /// Check a resolved bit length against the dtype's constraints.
    pub(crate) fn validate_bits(self, bits: u64) -> Result<()> {
        let fail = |msg: String| Err(Error::interpretation(msg));
        match self {
            Dtype::Uint | Dtype::Int => {
                if bits == 0 || bits > 64 {
                    return fail(format!("{self} length must be 1 to 64 bits, not {bits}"));
                }
            }
            Dtype::UintBe
            | Dtype::IntBe
            | Dtype::UintLe
            | Dtype::IntLe
            | Dtype::UintNe
            | Dtype::IntNe => {
                if bits == 0 || bits > 64 || bits % 8 != 0 {
                    return fail(format!(
                        "{self} length must be a multiple of eight bits up to 64, not {bits}"
                    ));
                }
            }
            Dtype::Float | Dtype::FloatBe | Dtype::FloatLe | Dtype::FloatNe => {
                if !matches!(bits, 16 | 32 | 64) {
                    return fail(format!("{self} length must be 16, 32 or 64 bits, not {bits}"));
                }
            }
            Dtype::Bfloat | Dtype::BfloatBe | Dtype::BfloatLe | Dtype::BfloatNe => {
                if bits != 16 {
                    return fail(format!("{self} length must be 16 bits, not {bits}"));
                }
            }
            Dtype::Hex => {
                if bits % 4 != 0 {
                    return fail(format!("hex length must be a multiple of four bits, not {bits}"));
                }
            }
            Dtype::Oct => {
                if bits % 3 != 0 {
                    return fail(format!("oct length must be a multiple of three bits, not {bits}"));
                }
            }
            Dtype::Bytes => {
                if bits % 8 != 0 {
                    return fail(format!("bytes length must be whole bytes, not {bits} bits"));
                }
            }
            Dtype::Bool => {
                if bits != 1 {
                    return fail(format!("bool is a single bit, not {bits}"));
                }
            }
            Dtype::Bin | Dtype::Bits | Dtype::Pad => {}
            Dtype::Ue | Dtype::Se | Dtype::Uie | Dtype::Sie => {}
        }
        Ok(())
    }
}

/// A token's declared length: a number of dtype units or a keyword name
/// resolved at pack or unpack time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenLength {
    /// A literal count in the dtype's units.
    Units(u64),
    /// A name looked up in the caller's keyword map.
    Keyword(String),
}

/// One parsed element of a format string.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// Interpretation applied to the token's bits.
    pub dtype: Dtype,
    /// Declared length, or `None` for implicit, self-delimiting and
    /// stretchy tokens.
    pub length: Option<TokenLength>,
    /// Literal value text from `=value` or a raw literal.
    pub value: Option<String>,
}

/// A token with its length settled to bits. A `None` length marks the
/// stretchy token.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedToken {
    pub dtype: Dtype,
    pub bits: Option<u64>,
    pub value: Option<String>,
}

impl ResolvedToken {
    /// Whether this token absorbs the remaining bits when read.
    pub fn is_stretchy(&self) -> bool {
        self.bits.is_none() && self.dtype.can_stretch()
    }
}

/// Parse a format string into tokens, without consulting the memo cache.
pub fn parse(format: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    parse_into(format, &mut tokens)?;
    check_stretch(&tokens)?;
    Ok(tokens)
}

/// Parse through the process-wide memo cache.
pub(crate) fn compile(format: &str) -> Result<Arc<Vec<Token>>> {
    static CACHE: OnceLock<Mutex<lru::LruCache<String, Arc<Vec<Token>>>>> = OnceLock::new();
    let cache = CACHE.get_or_init(|| {
        let capacity = NonZeroUsize::new(CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        Mutex::new(lru::LruCache::new(capacity))
    });
    let mut guard = cache.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(hit) = guard.get(format) {
        return Ok(hit.clone());
    }
    drop(guard);
    let tokens = Arc::new(parse(format)?);
    let mut guard = cache.lock().unwrap_or_else(PoisonError::into_inner);
    guard.put(format.to_string(), tokens.clone());
    Ok(tokens)
}

fn parse_into(format: &str, out: &mut Vec<Token>) -> Result<()> {
    if format.trim().is_empty() {
        return Ok(());
    }
    for segment in split_top_level(format)? {
        parse_segment(segment, out)?;
    }
    Ok(())
}

fn split_top_level(format: &str) -> Result<Vec<&str>> {
    let mut parts = Vec::new();
    let mut depth = 0u32;
    let mut start = 0;
    for (i, c) in format.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| Error::syntax(format!("unbalanced parentheses in {format:?}")))?;
            }
            ',' if depth == 0 => {
                parts.push(&format[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(Error::syntax(format!("unbalanced parentheses in {format:?}")));
    }
    parts.push(&format[start..]);
    Ok(parts)
}

fn parse_segment(segment: &str, out: &mut Vec<Token>) -> Result<()> {
    let text = segment.trim();
    if text.is_empty() {
        return Err(Error::syntax("empty token in format string"));
    }
    let (repeat, rest) = parse_factor(text)?;
    if let Some(inner) = rest.strip_prefix('(') {
        let inner = inner
            .strip_suffix(')')
            .ok_or_else(|| Error::syntax(format!("unbalanced parentheses in {text:?}")))?;
        let mut group = Vec::new();
        parse_into(inner, &mut group)?;
        for _ in 0..repeat {
            out.extend(group.iter().cloned());
        }
        return Ok(());
    }
    let items = parse_item(rest)?;
    for _ in 0..repeat {
        out.extend(items.iter().cloned());
    }
    Ok(())
}

fn parse_factor(text: &str) -> Result<(u64, &str)> {
    let Some(star) = text.find('*') else {
        return Ok((1, text));
    };
    let head = text[..star].trim();
    if head.is_empty() || !head.bytes().all(|b| b.is_ascii_digit()) {
        // not a repetition factor; the '*' belongs to the token text
        return Ok((1, text));
    }
    let count = head
        .parse::<u64>()
        .map_err(|_| Error::syntax(format!("bad repetition factor in {text:?}")))?;
    let rest = text[star + 1..].trim();
    if rest.is_empty() {
        return Err(Error::syntax(format!("repetition factor without a token in {text:?}")));
    }
    Ok((count, rest))
}

fn parse_item(text: &str) -> Result<Vec<Token>> {
    if let Some(first) = text.chars().next() {
        if matches!(first, '<' | '>' | '@') || (first == '=' && text.len() > 1) {
            return parse_struct_code(text);
        }
    }
    if let Some(token) = parse_literal(text)? {
        return Ok(vec![token]);
    }
    Ok(vec![parse_typed(text)?])
}

fn parse_literal(text: &str) -> Result<Option<Token>> {
    let lower = text.get(..2).map(str::to_ascii_lowercase);
    let (dtype, digits, unit) = match lower.as_deref() {
        Some("0x") => (Dtype::Hex, &text[2..], 4),
        Some("0o") => (Dtype::Oct, &text[2..], 3),
        Some("0b") => (Dtype::Bin, &text[2..], 1),
        _ => return Ok(None),
    };
    if digits.is_empty() || digits.contains([':', '=']) {
        return Err(Error::syntax(format!("bad literal token {text:?}")));
    }
    Ok(Some(Token {
        dtype,
        length: Some(TokenLength::Units(digits.len() as u64 * unit)),
        value: Some(digits.to_string()),
    }))
}

fn parse_typed(text: &str) -> Result<Token> {
    let (head, value) = match text.find('=') {
        Some(eq) => (&text[..eq], Some(text[eq + 1..].trim().to_string())),
        None => (text, None),
    };
    let (name, length_text) = match head.find(':') {
        Some(colon) => (head[..colon].trim(), Some(head[colon + 1..].trim())),
        None => (head.trim(), None),
    };
    let dtype = if name.is_empty() {
        if length_text.is_none() {
            return Err(Error::syntax(format!("empty token name in {text:?}")));
        }
        Dtype::Uint
    } else {
        Dtype::from_str(name).map_err(|_| {
            let known = Dtype::iter().map(|d| d.to_string()).join(", ");
            Error::syntax(format!("unknown token name {name:?}; expected one of {known}"))
        })?
    };
    let length = match length_text {
        None => None,
        Some(t) if t.is_empty() => {
            return Err(Error::syntax(format!("missing length after ':' in {text:?}")))
        }
        Some(t) if t.bytes().all(|b| b.is_ascii_digit()) => Some(TokenLength::Units(
            t.parse::<u64>()
                .map_err(|_| Error::syntax(format!("bad length in {text:?}")))?,
        )),
        Some(t) if is_identifier(t) => Some(TokenLength::Keyword(t.to_string())),
        Some(t) => return Err(Error::syntax(format!("bad length {t:?} in {text:?}"))),
    };
    if dtype.self_delimiting() && length.is_some() {
        return Err(Error::syntax(format!(
            "{dtype} codes have no declared length, in {text:?}"
        )));
    }
    if dtype == Dtype::Pad && length.is_none() {
        return Err(Error::syntax(format!("pad needs a length, in {text:?}")));
    }
    if dtype == Dtype::Pad && value.is_some() {
        return Err(Error::syntax(format!("pad takes no value, in {text:?}")));
    }
    if length.is_none()
        && !dtype.can_stretch()
        && !dtype.self_delimiting()
        && dtype.implicit_bits().is_none()
        && dtype != Dtype::Pad
    {
        return Err(Error::syntax(format!("{dtype} needs a length, in {text:?}")));
    }
    Ok(Token {
        dtype,
        length,
        value,
    })
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn parse_struct_code(text: &str) -> Result<Vec<Token>> {
    let mut chars = text.chars();
    let endian = chars.next();
    let body = chars.as_str();
    let mut tokens = Vec::new();
    let mut count: Option<u64> = None;
    for c in body.chars() {
        if let Some(d) = c.to_digit(10) {
            count = Some(count.unwrap_or(0) * 10 + u64::from(d));
            continue;
        }
        let (signed, is_float, bytes) = match c {
            'b' => (true, false, 1u64),
            'B' => (false, false, 1),
            'h' => (true, false, 2),
            'H' => (false, false, 2),
            'l' => (true, false, 4),
            'L' => (false, false, 4),
            'q' => (true, false, 8),
            'Q' => (false, false, 8),
            'e' => (false, true, 2),
            'f' => (false, true, 4),
            'd' => (false, true, 8),
            _ => return Err(Error::syntax(format!("bad struct code character {c:?} in {text:?}"))),
        };
        let dtype = match (endian, signed, is_float) {
            (Some('<'), true, false) => Dtype::IntLe,
            (Some('<'), false, false) => Dtype::UintLe,
            (Some('<'), _, true) => Dtype::FloatLe,
            (Some('>'), true, false) => Dtype::IntBe,
            (Some('>'), false, false) => Dtype::UintBe,
            (Some('>'), _, true) => Dtype::FloatBe,
            (Some('=') | Some('@'), true, false) => Dtype::IntNe,
            (Some('=') | Some('@'), false, false) => Dtype::UintNe,
            (Some('=') | Some('@'), _, true) => Dtype::FloatNe,
            _ => return Err(Error::syntax(format!("bad struct code prefix in {text:?}"))),
        };
        let token = Token {
            dtype,
            length: Some(TokenLength::Units(bytes * 8)),
            value: None,
        };
        for _ in 0..count.take().unwrap_or(1) {
            tokens.push(token.clone());
        }
    }
    if count.is_some() {
        return Err(Error::syntax(format!("trailing count in struct code {text:?}")));
    }
    if tokens.is_empty() {
        return Err(Error::syntax(format!("empty struct code {text:?}")));
    }
    Ok(tokens)
}

/// Reject formats with more than one stretchy token, and variable-length
/// codes after the stretchy one (their tail length cannot be computed).
fn check_stretch(tokens: &[Token]) -> Result<()> {
    let mut seen = false;
    for token in tokens {
        if seen && token.dtype.self_delimiting() {
            return Err(Error::syntax(
                "a variable-length code cannot follow an unbounded token",
            ));
        }
        if token.length.is_none() && token.dtype.can_stretch() {
            if seen {
                return Err(Error::syntax(
                    "at most one token may leave its length unspecified",
                ));
            }
            seen = true;
        }
    }
    Ok(())
}

/// Settle token lengths to bit counts using the caller's keyword map. The
/// stretchy token keeps `bits: None`.
pub(crate) fn resolve(tokens: &[Token], keywords: &Keywords) -> Result<Vec<ResolvedToken>> {
    tokens
        .iter()
        .map(|token| {
            let bits = match &token.length {
                None => token.dtype.implicit_bits(),
                Some(TokenLength::Units(units)) => Some(units * token.dtype.unit_bits()),
                Some(TokenLength::Keyword(name)) => {
                    let value = keywords
                        .get(name)
                        .ok_or_else(|| Error::syntax(format!("unknown keyword {name:?}")))?;
                    match value {
                        Value::Uint(units) => Some(units * token.dtype.unit_bits()),
                        other => {
                            return Err(Error::construction(format!(
                                "keyword {name:?} used as a length must be a uint, got {}",
                                other.kind()
                            )))
                        }
                    }
                }
            };
            if let Some(bits) = bits {
                token.dtype.validate_bits(bits)?;
            }
            Ok(ResolvedToken {
                dtype: token.dtype,
                bits,
                value: token.value.clone(),
            })
        })
        .collect()
}
