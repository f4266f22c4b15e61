//! # Error Types
//!
//! All error types for precompile execution and ledger reconciliation.

use crate::domain::value_objects::{Address, Bytes, U256};
use thiserror::Error;

// =============================================================================
// ENCODER ERRORS
// =============================================================================

/// Errors from the word/topic encoder.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// The value kind has no single-word encoding.
    #[error("unsupported type for word encoding: {0}")]
    UnsupportedType(&'static str),

    /// Fixed byte array wider than one word.
    #[error("fixed bytes too long: {0} > 32")]
    FixedBytesTooLong(usize),

    /// Too many indexed arguments for one log.
    #[error("too many indexed arguments: {0} > 3")]
    TooManyTopics(usize),

    /// Non-indexed event data failed to encode.
    #[error(transparent)]
    Data(#[from] AbiError),
}

// =============================================================================
// ABI ERRORS
// =============================================================================

/// Errors from ABI decoding and encoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AbiError {
    /// The decoder rejected the input (short data, bad offsets, bad UTF-8).
    #[error("abi decoding failed: {0}")]
    Decode(String),

    /// Input decodes but is not the canonical encoding of its values.
    #[error("non-canonical abi encoding")]
    NonCanonical,

    /// Decoded integer does not fit its declared width.
    #[error("value out of range for {0}")]
    OutOfRange(String),

    /// Value does not match the declared parameter type.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: String,
        actual: &'static str,
    },

    /// Wrong number of values for the declared types.
    #[error("argument count mismatch: expected {expected}, got {actual}")]
    ArgumentCount { expected: usize, actual: usize },

    /// Unsupported or malformed type string.
    #[error("invalid parameter type: {0}")]
    InvalidType(String),
}

// =============================================================================
// GAS ERRORS
// =============================================================================

/// Errors from the module gas meter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GasError {
    /// Consumption crossed the meter limit.
    #[error("out of gas in {descriptor}: limit {limit}")]
    OutOfGas {
        descriptor: &'static str,
        limit: u64,
    },
}

// =============================================================================
// LEDGER ERRORS
// =============================================================================

/// Errors from the EVM balance ledger.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Subtraction would take the balance below zero.
    #[error("insufficient balance for {address}: required {required}, available {available}")]
    InsufficientBalance {
        address: Address,
        required: U256,
        available: U256,
    },

    /// Addition would overflow 256 bits.
    #[error("balance overflow for {0}")]
    BalanceOverflow(Address),

    /// Snapshot id was never issued or was already reverted past.
    #[error("unknown snapshot: {0}")]
    UnknownSnapshot(usize),
}

// =============================================================================
// INTERCEPTOR ERRORS
// =============================================================================

/// Ledger reconciliation failures raised while closing an interception scope.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InterceptError {
    /// A recognised notification lacks a required attribute.
    #[error("notification {kind} missing attribute {attribute}")]
    MissingAttribute {
        kind: &'static str,
        attribute: &'static str,
    },

    /// Address attribute could not be parsed.
    #[error("invalid address {value:?}: {reason}")]
    InvalidAddress { value: String, reason: String },

    /// Amount attribute could not be parsed.
    #[error("invalid amount {value:?}: {reason}")]
    InvalidAmount { value: String, reason: String },

    /// Scaling to EVM precision overflowed 256 bits.
    #[error("amount overflow scaling {0} to evm precision")]
    AmountOverflow(U256),

    /// Applying a delta was rejected by the ledger.
    #[error("ledger rejected delta: {0}")]
    Ledger(#[from] LedgerError),

    /// Scope closed out of stack order.
    #[error("scope order violation: closing depth {closing}, open depth {open}")]
    ScopeOrderViolation { closing: usize, open: usize },
}

// =============================================================================
// KEEPER ERRORS
// =============================================================================

/// Rejections raised by module keepers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeeperError {
    /// Referenced object does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// Sender cannot cover the transfer.
    #[error("insufficient funds: {available} < {required}")]
    InsufficientFunds { required: String, available: String },

    /// Request violates module rules.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

// =============================================================================
// HANDLER ERRORS
// =============================================================================

/// Business errors returned by module handlers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// Wrong count or type of decoded arguments.
    #[error("invalid arguments: {0}")]
    Argument(String),

    /// Caller is not the account the operation acts for.
    #[error("unauthorized: caller {caller} does not match {expected}")]
    Unauthorized { caller: Address, expected: Address },

    /// The module rejected the operation.
    #[error("{0}")]
    Module(String),

    /// State mutation attempted from a read-only call.
    #[error("write protection")]
    WriteProtection,

    /// Module gas meter exhausted.
    #[error(transparent)]
    OutOfGas(#[from] GasError),
}

impl From<AbiError> for HandlerError {
    fn from(err: AbiError) -> Self {
        Self::Argument(err.to_string())
    }
}

impl From<KeeperError> for HandlerError {
    fn from(err: KeeperError) -> Self {
        Self::Module(err.to_string())
    }
}

impl From<EncodeError> for HandlerError {
    fn from(err: EncodeError) -> Self {
        Self::Module(err.to_string())
    }
}

// =============================================================================
// PRECOMPILE ERRORS
// =============================================================================

/// Outcome of a failed precompile call, as seen by the interpreter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PrecompileError {
    /// Input too short or selector unknown. No gas, no effects.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// Business revert with an ABI-encoded `Error(string)` payload.
    #[error("execution reverted: {reason}")]
    Reverted {
        /// Human-readable reason.
        reason: String,
        /// `Error(string)` payload, also written to the return-data buffer.
        data: Bytes,
    },

    /// Gas budget exceeded. Consumes the whole budget.
    #[error("out of gas")]
    OutOfGas,
}

impl PrecompileError {
    /// Returns true if this outcome carries a decodable revert reason.
    #[must_use]
    pub fn is_revert(&self) -> bool {
        matches!(self, Self::Reverted { .. })
    }

    /// Returns true if this outcome consumes all supplied gas.
    #[must_use]
    pub fn consumes_all_gas(&self) -> bool {
        matches!(self, Self::OutOfGas)
    }
}

// =============================================================================
// CONFIG ERRORS
// =============================================================================

/// Errors from bridge configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Denomination fails coin-denom syntax.
    #[error("invalid denom: {0:?}")]
    InvalidDenom(String),

    /// Module decimals exceed EVM precision.
    #[error("invalid decimals: {0} > 18")]
    InvalidDecimals(u8),

    /// Bech32 prefix empty or not lowercase.
    #[error("invalid bech32 prefix: {0:?}")]
    InvalidPrefix(String),

    /// Source could not be parsed.
    #[error("config parse error: {0}")]
    Parse(String),
}

// =============================================================================
// TESTS
// =============================================================================
