//! # Value Objects
//!
//! Immutable domain primitives shared by the encoder, the interceptor and the
//! kernel. These types represent concepts that are defined by their value, not
//! identity.

use crate::errors::GasError;
use serde::{Deserialize, Serialize};
use std::fmt;

// Re-export U256 from primitive-types for 256-bit arithmetic
pub use primitive_types::U256;

// =============================================================================
// ADDRESS (20 bytes)
// =============================================================================

/// A 20-byte account address, shared by both ledgers.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The zero address (0x0000...0000).
    pub const ZERO: Self = Self([0u8; 20]);

    /// Length in bytes.
    pub const LEN: usize = 20;

    /// Creates an address from a 20-byte array.
    #[must_use]
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Creates an address from a slice. Returns None if wrong length.
    #[must_use]
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        if slice.len() == 20 {
            let mut bytes = [0u8; 20];
            bytes.copy_from_slice(slice);
            Some(Self(bytes))
        } else {
            None
        }
    }

    /// Returns the underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Returns true if this is the zero address.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Lowercase `0x`-prefixed hex form.
    #[must_use]
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl From<Address> for [u8; 20] {
    fn from(addr: Address) -> Self {
        addr.0
    }
}

// =============================================================================
// HASH / WORD (32 bytes)
// =============================================================================

/// A 32-byte hash (e.g., Keccak-256).
///
/// Also serves as the ABI word and the event-log topic.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Hash(pub [u8; 32]);

/// The fixed 32-byte big-endian encoding unit.
pub type Word = Hash;

impl Hash {
    /// The zero hash.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Creates a hash from a 32-byte array.
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Creates a hash from a slice. Returns None if wrong length.
    #[must_use]
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        if slice.len() == 32 {
            let mut bytes = [0u8; 32];
            bytes.copy_from_slice(slice);
            Some(Self(bytes))
        } else {
            None
        }
    }

    /// Returns the underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Returns true if this is the zero hash.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Interprets the word as an unsigned big-endian integer.
    #[must_use]
    pub fn to_u256(&self) -> U256 {
        U256::from_big_endian(&self.0)
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for byte in &self.0[..4] {
            write!(f, "{byte:02x}")?;
        }
        write!(f, "...")?;
        for byte in &self.0[28..] {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl From<[u8; 32]> for Hash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl From<Hash> for [u8; 32] {
    fn from(hash: Hash) -> Self {
        hash.0
    }
}

// =============================================================================
// BYTES (variable length)
// =============================================================================

/// Variable-length byte vector for call input, return data and log data.
#[derive(Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Bytes(pub Vec<u8>);

impl Bytes {
    /// Creates an empty Bytes.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Creates Bytes from a vector.
    #[must_use]
    pub fn from_vec(vec: Vec<u8>) -> Self {
        Self(vec)
    }

    /// Creates Bytes from a slice.
    #[must_use]
    pub fn from_slice(slice: &[u8]) -> Self {
        Self(slice.to_vec())
    }

    /// Returns the underlying vector.
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }

    /// Returns a reference to the underlying slice.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Returns the length.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Empties the buffer in place.
    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl fmt::Debug for Bytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.len() <= 8 {
            write!(f, "0x{}", hex::encode(&self.0))
        } else {
            write!(f, "0x{}..({} bytes)", hex::encode(&self.0[..4]), self.0.len())
        }
    }
}

impl From<Vec<u8>> for Bytes {
    fn from(vec: Vec<u8>) -> Self {
        Self(vec)
    }
}

impl From<&[u8]> for Bytes {
    fn from(slice: &[u8]) -> Self {
        Self(slice.to_vec())
    }
}

impl AsRef<[u8]> for Bytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

// =============================================================================
// GAS METER
// =============================================================================

/// Module-side gas meter shared by every frame of one transaction.
///
/// ## Invariants
/// - `consumed` only grows while a transaction executes
/// - `consumed <= limit` after every successful `consume`
#[derive(Clone, Copy, Debug)]
pub struct GasMeter {
    limit: u64,
    consumed: u64,
}

impl GasMeter {
    /// Creates a meter with the given transaction-wide limit.
    #[must_use]
    pub const fn new(limit: u64) -> Self {
        Self { limit, consumed: 0 }
    }

    /// Meter without a practical ceiling.
    #[must_use]
    pub const fn infinite() -> Self {
        Self::new(u64::MAX)
    }

    /// Returns the gas limit.
    #[must_use]
    pub const fn limit(&self) -> u64 {
        self.limit
    }

    /// Returns gas consumed so far.
    #[must_use]
    pub const fn consumed(&self) -> u64 {
        self.consumed
    }

    /// Returns remaining gas.
    #[must_use]
    pub const fn remaining(&self) -> u64 {
        self.limit.saturating_sub(self.consumed)
    }

    /// Consumes gas for the named operation.
    ///
    /// On failure the meter is pinned at its limit, matching a module
    /// store that panics once the limit is crossed.
    pub fn consume(&mut self, amount: u64, descriptor: &'static str) -> Result<(), GasError> {
        match self.consumed.checked_add(amount) {
            Some(total) if total <= self.limit => {
                self.consumed = total;
                Ok(())
            }
            _ => {
                self.consumed = self.limit;
                Err(GasError::OutOfGas {
                    descriptor,
                    limit: self.limit,
                })
            }
        }
    }
}

impl Default for GasMeter {
    fn default() -> Self {
        Self::infinite()
    }
}

// =============================================================================
// COINS
// =============================================================================

/// Integer coin amount in a module denomination.
///
/// Amounts are magnitudes. Direction travels separately.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    /// Denomination, e.g. `uqc`.
    pub denom: String,
    /// Integer amount.
    pub amount: U256,
}

impl Coin {
    /// Creates a coin.
    #[must_use]
    pub fn new(denom: impl Into<String>, amount: impl Into<U256>) -> Self {
        Self {
            denom: denom.into(),
            amount: amount.into(),
        }
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// Fixed-precision decimal magnitude.
///
/// `value / 10^precision` is the represented number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dec {
    /// Scaled integer value.
    pub value: U256,
    /// Number of fractional digits.
    pub precision: u8,
}

impl Dec {
    /// Creates a decimal from an already-scaled value.
    #[must_use]
    pub const fn new(value: U256, precision: u8) -> Self {
        Self { value, precision }
    }

    /// Integer part, truncating fractional digits.
    #[must_use]
    pub fn truncate(&self) -> U256 {
        self.value / U256::exp10(usize::from(self.precision))
    }
}

/// Decimal coin: a denomination with a fixed-precision amount.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DecCoin {
    /// Denomination.
    pub denom: String,
    /// Scaled amount.
    pub amount: U256,
    /// Number of fractional digits in `amount`.
    pub precision: u8,
}

impl DecCoin {
    /// Decimal view of the amount.
    #[must_use]
    pub fn as_dec(&self) -> Dec {
        Dec::new(self.amount, self.precision)
    }

    /// Integer coin, dropping the fractional part.
    #[must_use]
    pub fn truncate(&self) -> Coin {
        Coin::new(self.denom.clone(), self.as_dec().truncate())
    }
}

// =============================================================================
// TESTS
// =============================================================================
