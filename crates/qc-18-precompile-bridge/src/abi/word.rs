//! # Word Encoder
//!
//! Turns typed values into the 32-byte word used for ABI return values and
//! indexed event topics.
//!
//! Two signed paths exist and must stay distinct:
//!
//! | Kind | Negative encoding |
//! |------|-------------------|
//! | `Int8..Int64` | two's complement, upper bytes `0xFF` |
//! | `BigInt` | magnitude of `|v|` only, never two's complement |

use crate::domain::services::keccak256;
use crate::domain::value_objects::{Address, Hash, Word, U256};
use crate::errors::EncodeError;

// =============================================================================
// VALUES
// =============================================================================

/// Arbitrary-precision integer in sign-magnitude form.
///
/// Zero is always non-negative.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct BigInt {
    negative: bool,
    magnitude: U256,
}

impl BigInt {
    /// Non-negative value.
    #[must_use]
    pub fn from_u256(magnitude: U256) -> Self {
        Self {
            negative: false,
            magnitude,
        }
    }

    /// Value with explicit sign. A zero magnitude drops the sign.
    #[must_use]
    pub fn from_parts(negative: bool, magnitude: U256) -> Self {
        Self {
            negative: negative && !magnitude.is_zero(),
            magnitude,
        }
    }

    /// Converts from a native signed integer.
    #[must_use]
    pub fn from_i128(value: i128) -> Self {
        Self::from_parts(value < 0, U256::from(value.unsigned_abs()))
    }

    /// True for values below zero.
    #[must_use]
    pub const fn is_negative(&self) -> bool {
        self.negative
    }

    /// Absolute value.
    #[must_use]
    pub const fn magnitude(&self) -> U256 {
        self.magnitude
    }
}

impl From<U256> for BigInt {
    fn from(value: U256) -> Self {
        Self::from_u256(value)
    }
}

/// A decoded ABI value.
///
/// Each accepted kind is its own case, decoded once at the ABI boundary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    /// `bool`.
    Bool(bool),
    /// `int8`.
    Int8(i8),
    /// `int16`.
    Int16(i16),
    /// `int32`.
    Int32(i32),
    /// `int64`.
    Int64(i64),
    /// `uint8`.
    Uint8(u8),
    /// `uint16`.
    Uint16(u16),
    /// `uint32`.
    Uint32(u32),
    /// `uint64`.
    Uint64(u64),
    /// `uintN` / `intN` wider than 64 bits.
    BigInt(BigInt),
    /// `address`.
    Address(Address),
    /// `bytes32` already in hash form.
    Hash(Hash),
    /// `bytesN` with `N <= 32`.
    FixedBytes(Vec<u8>),
    /// `bytes`.
    Bytes(Vec<u8>),
    /// `string`.
    String(String),
    /// `T[]`.
    Array(Vec<Value>),
    /// `(T1, T2, ...)`.
    Tuple(Vec<Value>),
}

impl Value {
    /// Short name of the value kind, for errors.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int8(_) => "int8",
            Self::Int16(_) => "int16",
            Self::Int32(_) => "int32",
            Self::Int64(_) => "int64",
            Self::Uint8(_) => "uint8",
            Self::Uint16(_) => "uint16",
            Self::Uint32(_) => "uint32",
            Self::Uint64(_) => "uint64",
            Self::BigInt(_) => "bigint",
            Self::Address(_) => "address",
            Self::Hash(_) => "hash",
            Self::FixedBytes(_) => "fixed bytes",
            Self::Bytes(_) => "bytes",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Tuple(_) => "tuple",
        }
    }

    /// Unsigned 256-bit value, from a non-negative integer kind.
    #[must_use]
    pub fn as_u256(&self) -> Option<U256> {
        match self {
            Self::Uint8(v) => Some(U256::from(*v)),
            Self::Uint16(v) => Some(U256::from(*v)),
            Self::Uint32(v) => Some(U256::from(*v)),
            Self::Uint64(v) => Some(U256::from(*v)),
            Self::BigInt(v) if !v.is_negative() => Some(v.magnitude()),
            _ => None,
        }
    }
}

// =============================================================================
// ENCODING
// =============================================================================

/// Two's-complement bytes of `value`, exactly `byte_width` bytes long.
///
/// Narrow widths truncate; wide widths sign-extend.
#[must_use]
pub fn pack_signed_magnitude(value: i64, byte_width: usize) -> Vec<u8> {
    let native = value.to_be_bytes();
    if byte_width <= native.len() {
        return native[native.len() - byte_width..].to_vec();
    }
    let fill = if value < 0 { 0xFF } else { 0x00 };
    let mut out = vec![fill; byte_width - native.len()];
    out.extend_from_slice(&native);
    out
}

fn encode_signed(value: i64, byte_width: usize) -> Word {
    let packed = pack_signed_magnitude(value, byte_width);
    let mut word = if value < 0 { [0xFF; 32] } else { [0u8; 32] };
    word[32 - packed.len()..].copy_from_slice(&packed);
    Hash::new(word)
}

fn encode_unsigned(value: u64) -> Word {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    Hash::new(word)
}

/// Encodes a U256 as a big-endian word.
#[must_use]
pub fn u256_word(value: U256) -> Word {
    let mut word = [0u8; 32];
    value.to_big_endian(&mut word);
    Hash::new(word)
}

/// Encodes one value into a single 32-byte word.
pub fn encode_word(value: &Value) -> Result<Word, EncodeError> {
    let word = match value {
        Value::Hash(hash) => *hash,
        Value::Address(address) => {
            let mut word = [0u8; 32];
            word[12..].copy_from_slice(address.as_bytes());
            Hash::new(word)
        }
        // Sign-magnitude: only |v| is written.
        Value::BigInt(big) => u256_word(big.magnitude()),
        Value::Bool(flag) => {
            let mut word = [0u8; 32];
            word[31] = u8::from(*flag);
            Hash::new(word)
        }
        Value::Int8(v) => encode_signed(i64::from(*v), 1),
        Value::Int16(v) => encode_signed(i64::from(*v), 2),
        Value::Int32(v) => encode_signed(i64::from(*v), 4),
        Value::Int64(v) => encode_signed(*v, 8),
        Value::Uint8(v) => encode_unsigned(u64::from(*v)),
        Value::Uint16(v) => encode_unsigned(u64::from(*v)),
        Value::Uint32(v) => encode_unsigned(u64::from(*v)),
        Value::Uint64(v) => encode_unsigned(*v),
        Value::FixedBytes(bytes) => {
            if bytes.len() > 32 {
                return Err(EncodeError::FixedBytesTooLong(bytes.len()));
            }
            let mut word = [0u8; 32];
            word[..bytes.len()].copy_from_slice(bytes);
            Hash::new(word)
        }
        Value::Bytes(bytes) => keccak256(bytes),
        Value::String(text) => keccak256(text.as_bytes()),
        Value::Array(_) | Value::Tuple(_) => {
            return Err(EncodeError::UnsupportedType(value.kind_name()))
        }
    };
    Ok(word)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn word_hex(value: &Value) -> String {
        hex::encode(encode_word(value).unwrap().0)
    }

    #[test]
    fn test_bool_words() {
        let mut expected = [0u8; 32];
        expected[31] = 1;
        assert_eq!(encode_word(&Value::Bool(true)).unwrap(), Hash::new(expected));
        assert_eq!(encode_word(&Value::Bool(false)).unwrap(), Hash::ZERO);
    }

    #[test]
    fn test_zero_in_all_forms() {
        for value in [
            Value::Int8(0),
            Value::Int16(0),
            Value::Int32(0),
            Value::Int64(0),
            Value::Uint8(0),
            Value::Uint16(0),
            Value::Uint32(0),
            Value::Uint64(0),
            Value::BigInt(BigInt::default()),
            Value::BigInt(BigInt::from_parts(true, U256::zero())),
            Value::Address(Address::ZERO),
            Value::Hash(Hash::ZERO),
            Value::FixedBytes(Vec::new()),
        ] {
            assert_eq!(encode_word(&value).unwrap(), Hash::ZERO, "{}", value.kind_name());
        }
    }

    #[test]
    fn test_minus_one_fills_word() {
        for value in [Value::Int8(-1), Value::Int16(-1), Value::Int32(-1), Value::Int64(-1)] {
            assert_eq!(encode_word(&value).unwrap(), Hash::new([0xFF; 32]));
        }
    }

    #[test]
    fn test_fixed_width_extremes() {
        assert_eq!(
            word_hex(&Value::Int8(i8::MIN)),
            format!("{}80", "ff".repeat(31))
        );
        assert_eq!(
            word_hex(&Value::Int8(i8::MAX)),
            format!("{}7f", "00".repeat(31))
        );
        assert_eq!(
            word_hex(&Value::Int64(i64::MIN)),
            format!("{}8000000000000000", "ff".repeat(24))
        );
        assert_eq!(
            word_hex(&Value::Uint64(u64::MAX)),
            format!("{}ffffffffffffffff", "00".repeat(24))
        );
        assert_eq!(
            word_hex(&Value::Uint16(u16::MAX)),
            format!("{}ffff", "00".repeat(30))
        );
    }

    #[test]
    fn test_bigint_negative_is_magnitude_only() {
        let negative = Value::BigInt(BigInt::from_i128(-1));
        let mut expected = [0u8; 32];
        expected[31] = 1;
        assert_eq!(encode_word(&negative).unwrap(), Hash::new(expected));

        // Same value through the fixed-width path is all 0xFF.
        assert_ne!(encode_word(&negative).unwrap(), encode_word(&Value::Int64(-1)).unwrap());
    }

    #[test]
    fn test_address_low_bytes() {
        let address = Address::new([0xAB; 20]);
        let word = encode_word(&Value::Address(address)).unwrap();
        assert_eq!(&word.0[..12], &[0u8; 12]);
        assert_eq!(Address::from_slice(&word.0[12..]).unwrap(), address);
    }

    #[test]
    fn test_fixed_bytes_left_aligned() {
        let word = encode_word(&Value::FixedBytes(vec![0xde, 0xad])).unwrap();
        assert_eq!(&word.0[..2], &[0xde, 0xad]);
        assert!(word.0[2..].iter().all(|&b| b == 0));

        assert_eq!(
            encode_word(&Value::FixedBytes(vec![0u8; 33])),
            Err(EncodeError::FixedBytesTooLong(33))
        );
    }

    #[test]
    fn test_dynamic_values_are_hashed() {
        assert_eq!(
            encode_word(&Value::String("hello".into())).unwrap(),
            keccak256(b"hello")
        );
        assert_eq!(encode_word(&Value::Bytes(vec![])).unwrap(), keccak256(&[]));
    }

    #[test]
    fn test_composites_rejected() {
        assert_eq!(
            encode_word(&Value::Array(vec![])),
            Err(EncodeError::UnsupportedType("array"))
        );
        assert_eq!(
            encode_word(&Value::Tuple(vec![])),
            Err(EncodeError::UnsupportedType("tuple"))
        );
    }

    #[test]
    fn test_pack_signed_magnitude_widths() {
        assert_eq!(pack_signed_magnitude(-2, 1), vec![0xFE]);
        assert_eq!(pack_signed_magnitude(258, 1), vec![0x02]);
        assert_eq!(pack_signed_magnitude(-1, 10), vec![0xFF; 10]);
        assert_eq!(pack_signed_magnitude(1, 10)[9], 1);
        assert_eq!(pack_signed_magnitude(1, 10).len(), 10);
    }

    proptest! {
        #[test]
        fn prop_int64_sign_extension(v in any::<i64>()) {
            let word = encode_word(&Value::Int64(v)).unwrap();
            prop_assert_eq!(&word.0[24..], &v.to_be_bytes()[..]);
            let fill = if v < 0 { 0xFF } else { 0x00 };
            prop_assert!(word.0[..24].iter().all(|&b| b == fill));
        }

        #[test]
        fn prop_int8_matches_twos_complement(v in any::<i8>()) {
            let word = encode_word(&Value::Int8(v)).unwrap();
            let fill = if v < 0 { 0xFF } else { 0x00 };
            prop_assert!(word.0[..31].iter().all(|&b| b == fill));
            prop_assert_eq!(word.0[31], v.to_be_bytes()[0]);
        }

        #[test]
        fn prop_bigint_uses_magnitude(v in any::<i64>()) {
            let word = encode_word(&Value::BigInt(BigInt::from_i128(i128::from(v)))).unwrap();
            prop_assert_eq!(word.to_u256(), U256::from(v.unsigned_abs()));
        }

        #[test]
        fn prop_address_roundtrip(raw in any::<[u8; 20]>()) {
            let address = Address::new(raw);
            let word = encode_word(&Value::Address(address)).unwrap();
            prop_assert_eq!(Address::from_slice(&word.0[12..]).unwrap(), address);
        }
    }
}
