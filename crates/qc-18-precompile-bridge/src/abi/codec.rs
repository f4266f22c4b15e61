//! # ABI Codec
//!
//! Head/tail encoding of call arguments, return values and revert payloads,
//! on top of `alloy-dyn-abi`. Calldata is decoded once, against the declared
//! parameter types, and converted into [`Value`] cases at this boundary.
//! Handlers never see raw calldata or `DynSolValue`.
//!
//! Data words carry negative integers in two's complement. Only topics use
//! the sign-magnitude form of [`crate::abi::word::encode_word`].

use crate::abi::word::{u256_word, BigInt, Value};
use crate::domain::value_objects::{Address, Hash, U256};
use crate::errors::AbiError;
use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Address as SolAddress, B256, I256, U256 as SolU256};

/// Solidity parameter type.
pub use alloy_dyn_abi::DynSolType as ParamType;

/// `Error(string)` selector.
pub const REVERT_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

// =============================================================================
// TYPE STRINGS
// =============================================================================

/// Parses a list of type strings.
pub fn parse_types(types: &[&str]) -> Result<Vec<ParamType>, AbiError> {
    types
        .iter()
        .map(|text| ParamType::parse(text).map_err(|e| AbiError::InvalidType(format!("{text}: {e}"))))
        .collect()
}

/// Canonical `name(type1,type2)` signature.
#[must_use]
pub fn canonical_signature(name: &str, inputs: &[ParamType]) -> String {
    let args: Vec<String> = inputs.iter().map(ToString::to_string).collect();
    format!("{name}({})", args.join(","))
}

/// Widths decoded into native integer cases rather than `BigInt`.
const fn is_native_width(bits: usize) -> bool {
    matches!(bits, 8 | 16 | 32 | 64)
}

fn fits_unsigned(magnitude: U256, bits: usize) -> bool {
    bits >= 256 || (magnitude >> bits).is_zero()
}

fn fits_signed(negative: bool, magnitude: U256, bits: usize) -> bool {
    let limit = U256::one() << (bits.clamp(1, 256) - 1);
    if negative {
        magnitude <= limit
    } else {
        magnitude < limit
    }
}

// =============================================================================
// CONVERSION
// =============================================================================

fn to_sol_u256(value: U256) -> SolU256 {
    SolU256::from_be_bytes(u256_word(value).0)
}

fn from_sol_u256(value: SolU256) -> U256 {
    U256::from_big_endian(&value.to_be_bytes::<32>())
}

fn to_sol_int(negative: bool, magnitude: U256) -> I256 {
    let raw = to_sol_u256(magnitude);
    I256::from_raw(if negative { raw.wrapping_neg() } else { raw })
}

fn native_int(value: i64, bits: usize) -> DynSolValue {
    DynSolValue::Int(to_sol_int(value < 0, U256::from(value.unsigned_abs())), bits)
}

fn native_uint(value: u64, bits: usize) -> DynSolValue {
    DynSolValue::Uint(SolU256::from(value), bits)
}

fn left_aligned(bytes: &[u8]) -> Result<B256, AbiError> {
    if bytes.len() > 32 {
        return Err(AbiError::InvalidType(format!("bytes{}", bytes.len())));
    }
    let mut word = [0u8; 32];
    word[..bytes.len()].copy_from_slice(bytes);
    Ok(B256::from(word))
}

/// Natural ABI form of an untyped value.
fn to_sol(value: &Value) -> Result<DynSolValue, AbiError> {
    Ok(match value {
        Value::Bool(flag) => DynSolValue::Bool(*flag),
        Value::Int8(v) => native_int(i64::from(*v), 8),
        Value::Int16(v) => native_int(i64::from(*v), 16),
        Value::Int32(v) => native_int(i64::from(*v), 32),
        Value::Int64(v) => native_int(*v, 64),
        Value::Uint8(v) => native_uint(u64::from(*v), 8),
        Value::Uint16(v) => native_uint(u64::from(*v), 16),
        Value::Uint32(v) => native_uint(u64::from(*v), 32),
        Value::Uint64(v) => native_uint(*v, 64),
        Value::BigInt(big) if big.is_negative() => {
            DynSolValue::Int(to_sol_int(true, big.magnitude()), 256)
        }
        Value::BigInt(big) => DynSolValue::Uint(to_sol_u256(big.magnitude()), 256),
        Value::Address(address) => DynSolValue::Address(SolAddress::new(address.0)),
        Value::Hash(hash) => DynSolValue::FixedBytes(B256::new(hash.0), 32),
        Value::FixedBytes(bytes) => DynSolValue::FixedBytes(left_aligned(bytes)?, bytes.len()),
        Value::Bytes(bytes) => DynSolValue::Bytes(bytes.clone()),
        Value::String(text) => DynSolValue::String(text.clone()),
        Value::Array(items) => DynSolValue::Array(items.iter().map(to_sol).collect::<Result<_, _>>()?),
        Value::Tuple(items) => DynSolValue::Tuple(items.iter().map(to_sol).collect::<Result<_, _>>()?),
    })
}

/// ABI form of `value` as an instance of `ty`.
///
/// Native widths take the matching native case; other integer widths take
/// `BigInt` within range.
fn to_sol_typed(ty: &ParamType, value: &Value) -> Result<DynSolValue, AbiError> {
    let typed = match (ty, value) {
        (ParamType::Address, Value::Address(_))
        | (ParamType::Bool, Value::Bool(_))
        | (ParamType::Bytes, Value::Bytes(_))
        | (ParamType::String, Value::String(_))
        | (ParamType::Uint(8), Value::Uint8(_))
        | (ParamType::Uint(16), Value::Uint16(_))
        | (ParamType::Uint(32), Value::Uint32(_))
        | (ParamType::Uint(64), Value::Uint64(_))
        | (ParamType::Int(8), Value::Int8(_))
        | (ParamType::Int(16), Value::Int16(_))
        | (ParamType::Int(32), Value::Int32(_))
        | (ParamType::Int(64), Value::Int64(_))
        | (ParamType::FixedBytes(32), Value::Hash(_)) => Some(to_sol(value)?),
        (ParamType::FixedBytes(n), Value::FixedBytes(bytes)) if bytes.len() == *n => {
            Some(to_sol(value)?)
        }
        (ParamType::Uint(bits), Value::BigInt(big))
            if !is_native_width(*bits)
                && !big.is_negative()
                && fits_unsigned(big.magnitude(), *bits) =>
        {
            Some(DynSolValue::Uint(to_sol_u256(big.magnitude()), *bits))
        }
        (ParamType::Int(bits), Value::BigInt(big))
            if !is_native_width(*bits)
                && fits_signed(big.is_negative(), big.magnitude(), *bits) =>
        {
            Some(DynSolValue::Int(
                to_sol_int(big.is_negative(), big.magnitude()),
                *bits,
            ))
        }
        (ParamType::Array(inner), Value::Array(items)) => Some(DynSolValue::Array(
            items
                .iter()
                .map(|item| to_sol_typed(inner, item))
                .collect::<Result<_, _>>()?,
        )),
        (ParamType::Tuple(types), Value::Tuple(items)) if types.len() == items.len() => {
            Some(DynSolValue::Tuple(
                types
                    .iter()
                    .zip(items)
                    .map(|(t, v)| to_sol_typed(t, v))
                    .collect::<Result<_, _>>()?,
            ))
        }
        _ => None,
    };
    typed.ok_or_else(|| AbiError::TypeMismatch {
        expected: ty.to_string(),
        actual: value.kind_name(),
    })
}

fn uint_value(value: U256, bits: usize) -> Result<Value, AbiError> {
    let out_of_range = || AbiError::OutOfRange(format!("uint{bits}"));
    if !fits_unsigned(value, bits) {
        return Err(out_of_range());
    }
    let low = value.low_u64();
    Ok(match bits {
        8 => Value::Uint8(u8::try_from(low).map_err(|_| out_of_range())?),
        16 => Value::Uint16(u16::try_from(low).map_err(|_| out_of_range())?),
        32 => Value::Uint32(u32::try_from(low).map_err(|_| out_of_range())?),
        64 => Value::Uint64(low),
        _ => Value::BigInt(BigInt::from_u256(value)),
    })
}

fn int_value(value: I256, bits: usize) -> Result<Value, AbiError> {
    let out_of_range = || AbiError::OutOfRange(format!("int{bits}"));
    let negative = value.is_negative();
    let magnitude = from_sol_u256(value.unsigned_abs());
    if !fits_signed(negative, magnitude, bits) {
        return Err(out_of_range());
    }
    if !is_native_width(bits) {
        return Ok(Value::BigInt(BigInt::from_parts(negative, magnitude)));
    }

    let narrow = i128::from(magnitude.low_u64());
    let narrow = if negative { -narrow } else { narrow };
    Ok(match bits {
        8 => Value::Int8(i8::try_from(narrow).map_err(|_| out_of_range())?),
        16 => Value::Int16(i16::try_from(narrow).map_err(|_| out_of_range())?),
        32 => Value::Int32(i32::try_from(narrow).map_err(|_| out_of_range())?),
        _ => Value::Int64(i64::try_from(narrow).map_err(|_| out_of_range())?),
    })
}

fn from_sol(value: DynSolValue) -> Result<Value, AbiError> {
    Ok(match value {
        DynSolValue::Bool(flag) => Value::Bool(flag),
        DynSolValue::Int(v, bits) => int_value(v, bits)?,
        DynSolValue::Uint(v, bits) => uint_value(from_sol_u256(v), bits)?,
        DynSolValue::Address(address) => Value::Address(Address::new(address.0 .0)),
        DynSolValue::FixedBytes(word, 32) => Value::Hash(Hash::new(word.0)),
        DynSolValue::FixedBytes(word, n) => Value::FixedBytes(word.0[..n.min(32)].to_vec()),
        DynSolValue::Bytes(bytes) => Value::Bytes(bytes),
        DynSolValue::String(text) => Value::String(text),
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) => {
            Value::Array(items.into_iter().map(from_sol).collect::<Result<_, _>>()?)
        }
        DynSolValue::Tuple(items) => {
            Value::Tuple(items.into_iter().map(from_sol).collect::<Result<_, _>>()?)
        }
        other => {
            let kind = other
                .as_type()
                .map_or_else(|| "unknown".to_string(), |ty| ty.to_string());
            return Err(AbiError::InvalidType(kind));
        }
    })
}

// =============================================================================
// ENCODING / DECODING
// =============================================================================

/// ABI-encodes a value sequence as a parameter list.
///
/// Integers take their natural width; `BigInt` encodes as 256 bits.
pub fn encode(values: &[Value]) -> Result<Vec<u8>, AbiError> {
    let items = values.iter().map(to_sol).collect::<Result<Vec<_>, _>>()?;
    Ok(DynSolValue::Tuple(items).abi_encode_params())
}

/// Encodes after checking each value against its declared type.
pub fn encode_typed(types: &[ParamType], values: &[Value]) -> Result<Vec<u8>, AbiError> {
    if types.len() != values.len() {
        return Err(AbiError::ArgumentCount {
            expected: types.len(),
            actual: values.len(),
        });
    }
    let items = types
        .iter()
        .zip(values)
        .map(|(ty, value)| to_sol_typed(ty, value))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(DynSolValue::Tuple(items).abi_encode_params())
}

/// Decodes a parameter list against the declared types.
///
/// Only the canonical encoding is accepted: dirty padding, trailing bytes
/// and out-of-width integers are rejected.
pub fn decode(types: &[ParamType], data: &[u8]) -> Result<Vec<Value>, AbiError> {
    let decoded = ParamType::Tuple(types.to_vec())
        .abi_decode_params(data)
        .map_err(|e| AbiError::Decode(e.to_string()))?;
    if decoded.abi_encode_params() != data {
        return Err(AbiError::NonCanonical);
    }
    match decoded {
        DynSolValue::Tuple(items) => items.into_iter().map(from_sol).collect(),
        other => from_sol(other).map(|value| vec![value]),
    }
}

// =============================================================================
// REVERT PAYLOAD
// =============================================================================

/// `Error(string)` payload, byte-identical to a native `revert(reason)`.
#[must_use]
pub fn revert_payload(reason: &str) -> Vec<u8> {
    let mut out = REVERT_SELECTOR.to_vec();
    out.extend(DynSolValue::Tuple(vec![DynSolValue::String(reason.to_string())]).abi_encode_params());
    out
}

/// Extracts the reason from an `Error(string)` payload.
#[must_use]
pub fn decode_revert_reason(data: &[u8]) -> Option<String> {
    let body = data.strip_prefix(&REVERT_SELECTOR[..])?;
    match decode(&[ParamType::String], body).ok()?.pop()? {
        Value::String(reason) => Some(reason),
        _ => None,
    }
}

// =============================================================================
// TESTS
// =============================================================================
