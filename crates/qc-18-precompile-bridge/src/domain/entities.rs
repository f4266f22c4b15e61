//! # Core Domain Entities
//!
//! Records that live for one precompile call, plus the journal entries that
//! outlive it until the enclosing transaction settles.

use crate::domain::value_objects::{Address, Bytes, Hash, U256};
use serde::{Deserialize, Serialize};

// =============================================================================
// CALL CONTEXT
// =============================================================================

/// Inputs of one precompile invocation.
///
/// Owned by the kernel for the duration of `run` and dropped afterwards.
#[derive(Clone, Debug, Default)]
pub struct CallContext {
    /// Immediate caller of the precompile.
    pub caller: Address,
    /// Precompile address being called.
    pub target: Address,
    /// Selector followed by ABI-encoded arguments.
    pub input: Bytes,
    /// Gas available to the call after the interpreter's base charge.
    pub gas_budget: u64,
    /// Static call: state mutation is forbidden.
    pub read_only: bool,
}

impl CallContext {
    /// Creates a state-mutating call context.
    #[must_use]
    pub fn new(caller: Address, target: Address, input: Vec<u8>, gas_budget: u64) -> Self {
        Self {
            caller,
            target,
            input: Bytes::from_vec(input),
            gas_budget,
            read_only: false,
        }
    }

    /// Same call, marked read-only.
    #[must_use]
    pub fn into_static(mut self) -> Self {
        self.read_only = true;
        self
    }
}

/// Successful precompile result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrecompileOutput {
    /// Gas charged against the call budget.
    pub gas_used: u64,
    /// ABI-encoded return data.
    pub output: Bytes,
}

/// Lifecycle phase of a kernel call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallPhase {
    /// Selector resolution.
    Dispatch,
    /// Argument decoding and handler invocation.
    Execute,
    /// Balance replay from module notifications.
    Reconcile,
    /// Gas settlement.
    Finalize,
}

// =============================================================================
// MODULE NOTIFICATIONS
// =============================================================================

/// Notification kinds the interceptor understands.
pub mod notification_kinds {
    /// Coins left an account.
    pub const COIN_SPENT: &str = "coin_spent";
    /// Coins arrived in an account.
    pub const COIN_RECEIVED: &str = "coin_received";
}

/// Attribute keys carried by bank notifications.
pub mod notification_attrs {
    /// Debited account.
    pub const SPENDER: &str = "spender";
    /// Credited account.
    pub const RECEIVER: &str = "receiver";
    /// Comma-separated coin list.
    pub const AMOUNT: &str = "amount";
}

/// Typed record emitted by the module layer as a side channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Event kind, e.g. `coin_spent`.
    pub kind: String,
    /// Ordered key/value attributes.
    pub attributes: Vec<(String, String)>,
}

impl Notification {
    /// Creates a notification.
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            attributes: Vec::new(),
        }
    }

    /// Appends an attribute.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    /// First value stored under `key`.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

// =============================================================================
// LEDGER DELTA & JOURNAL
// =============================================================================

/// Direction of a ledger delta.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeltaDirection {
    /// Balance increases.
    Credit,
    /// Balance decreases.
    Debit,
}

/// Signed balance change replayed onto the EVM ledger.
///
/// `amount` is already scaled to EVM precision.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerDelta {
    /// Affected account.
    pub address: Address,
    /// Magnitude in EVM units.
    pub amount: U256,
    /// Sign of the change.
    pub direction: DeltaDirection,
    /// Module denomination the delta came from.
    pub denom: String,
}

/// Why the EVM ledger changed. Informational only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalanceChangeReason {
    /// Ordinary value transfer.
    Transfer,
    /// Replayed from a precompiled module call.
    Precompile,
}

/// Undo record for one EVM ledger write.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum JournalEntry {
    /// Balance was raised; undo subtracts.
    BalanceIncrease {
        /// Account.
        address: Address,
        /// Balance before the write.
        previous: U256,
        /// Tracing tag.
        reason: BalanceChangeReason,
    },
    /// Balance was lowered; undo adds back.
    BalanceDecrease {
        /// Account.
        address: Address,
        /// Balance before the write.
        previous: U256,
        /// Tracing tag.
        reason: BalanceChangeReason,
    },
}

impl JournalEntry {
    /// Account touched by this entry.
    #[must_use]
    pub fn address(&self) -> Address {
        match self {
            Self::BalanceIncrease { address, .. } | Self::BalanceDecrease { address, .. } => {
                *address
            }
        }
    }

    /// Balance to restore on undo.
    #[must_use]
    pub fn previous(&self) -> U256 {
        match self {
            Self::BalanceIncrease { previous, .. } | Self::BalanceDecrease { previous, .. } => {
                *previous
            }
        }
    }
}

// =============================================================================
// EVENT LOG
// =============================================================================

/// Log record emitted by a successful precompile call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLog {
    /// Precompile address that emitted the log.
    pub address: Address,
    /// Event signature hash followed by indexed arguments.
    pub topics: Vec<Hash>,
    /// ABI-encoded non-indexed arguments.
    pub data: Bytes,
    /// Height of the block being executed.
    pub block_height: u64,
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_attribute_lookup() {
        let n = Notification::new(notification_kinds::COIN_SPENT)
            .with_attribute(notification_attrs::SPENDER, "qc1abc")
            .with_attribute(notification_attrs::AMOUNT, "5uqc");

        assert_eq!(n.attribute("spender"), Some("qc1abc"));
        assert_eq!(n.attribute("amount"), Some("5uqc"));
        assert_eq!(n.attribute("receiver"), None);
    }

    #[test]
    fn test_call_context_static() {
        let ctx = CallContext::new(Address::ZERO, Address::new([9u8; 20]), vec![1, 2, 3, 4], 100)
            .into_static();
        assert!(ctx.read_only);
        assert_eq!(ctx.input.len(), 4);
    }

    #[test]
    fn test_journal_entry_accessors() {
        let entry = JournalEntry::BalanceDecrease {
            address: Address::new([1u8; 20]),
            previous: U256::from(7u64),
            reason: BalanceChangeReason::Precompile,
        };
        assert_eq!(entry.address(), Address::new([1u8; 20]));
        assert_eq!(entry.previous(), U256::from(7u64));
    }
}
