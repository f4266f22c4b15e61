//! # Driven Ports (SPI - Outbound)
//!
//! Interfaces the precompile kernel depends on. Adapters implement them
//! to provide:
//! - The EVM-visible balance ledger (interpreter state)
//! - The module notification log and its transactional store
//! - Per-module keepers and business-logic handlers
//!
//! All calls are synchronous. One call chain runs to completion before the
//! next begins, so none of these traits need interior locking.

use crate::abi::word::Value;
use crate::domain::entities::{BalanceChangeReason, JournalEntry, Notification};
use crate::domain::value_objects::{Address, Coin, Hash, U256};
use crate::errors::{HandlerError, KeeperError, LedgerError};
use crate::kernel::env::HandlerContext;
use crate::kernel::method::MethodDescriptor;

// =============================================================================
// EVM LEDGER (Interpreter state)
// =============================================================================

/// Account-balance ledger seen by contract execution.
///
/// Every successful write appends a [`JournalEntry`] so the interpreter can
/// undo it if the enclosing call reverts.
pub trait EvmLedger {
    /// Current balance. Unknown accounts hold zero.
    fn balance(&self, address: &Address) -> U256;

    /// Raises a balance.
    fn add_balance(
        &mut self,
        address: Address,
        amount: U256,
        reason: BalanceChangeReason,
    ) -> Result<(), LedgerError>;

    /// Lowers a balance. Fails rather than going negative.
    fn sub_balance(
        &mut self,
        address: Address,
        amount: U256,
        reason: BalanceChangeReason,
    ) -> Result<(), LedgerError>;

    /// Marks the current journal position.
    fn snapshot(&mut self) -> usize;

    /// Undoes every write after the snapshot, newest first.
    fn revert_to_snapshot(&mut self, id: usize) -> Result<(), LedgerError>;

    /// Closes the snapshot and every later one, keeping their writes.
    fn discard_snapshot(&mut self, id: usize) -> Result<(), LedgerError>;

    /// Undo records appended so far.
    fn journal(&self) -> &[JournalEntry];
}

// =============================================================================
// NOTIFICATION LOG (Module layer)
// =============================================================================

/// Append-only, ordered log of module notifications.
///
/// Append order is causal order; the interceptor depends on it.
pub trait NotificationLog {
    /// Number of records emitted so far.
    fn len(&self) -> usize;

    /// Returns true when nothing has been emitted.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All records at positions `offset..`.
    fn records_since(&self, offset: usize) -> &[Notification];

    /// Appends a record.
    fn emit(&mut self, notification: Notification);
}

/// Transactional module state.
///
/// Reverting a snapshot also truncates the notification log to its length
/// at snapshot time.
pub trait ModuleStore: NotificationLog {
    /// Marks the current state.
    fn snapshot(&mut self) -> usize;

    /// Restores the state captured by `snapshot`.
    fn revert_to_snapshot(&mut self, id: usize);

    /// Drops the snapshot and every later one, keeping the current state.
    fn discard_snapshot(&mut self, id: usize);
}

// =============================================================================
// KEEPERS (Module layer)
// =============================================================================

/// Coin ledger operations.
pub trait BankKeeper {
    /// Balance of one denomination.
    fn balance(&self, address: &Address, denom: &str) -> U256;

    /// Non-zero balances, sorted by denomination.
    fn all_balances(&self, address: &Address) -> Vec<Coin>;

    /// Total supply of one denomination.
    fn supply_of(&self, denom: &str) -> U256;

    /// Moves coins, emitting `coin_spent` and `coin_received`.
    fn send_coins(&mut self, from: Address, to: Address, coins: &[Coin])
        -> Result<(), KeeperError>;
}

/// Governance vote options.
pub mod vote_options {
    /// Yes.
    pub const YES: u8 = 1;
    /// Abstain.
    pub const ABSTAIN: u8 = 2;
    /// No.
    pub const NO: u8 = 3;
    /// No with veto.
    pub const NO_WITH_VETO: u8 = 4;
}

/// Proposal voting.
pub trait GovKeeper {
    /// Records or replaces a vote.
    fn vote(
        &mut self,
        proposal_id: u64,
        voter: Address,
        option: u8,
        metadata: &str,
    ) -> Result<(), KeeperError>;

    /// Vote cast by `voter`, if any.
    fn get_vote(&self, proposal_id: u64, voter: &Address) -> Result<Option<u8>, KeeperError>;
}

/// Validator jailing.
pub trait SlashingKeeper {
    /// Returns true if the validator is jailed.
    fn is_jailed(&self, validator: &Address) -> Result<bool, KeeperError>;

    /// Releases a jailed validator.
    fn unjail(&mut self, validator: Address) -> Result<(), KeeperError>;
}

/// Misbehaviour evidence.
pub trait EvidenceKeeper {
    /// Stores evidence and returns its hash.
    fn submit_evidence(&mut self, submitter: Address, evidence: &[u8])
        -> Result<Hash, KeeperError>;

    /// Evidence by hash.
    fn evidence(&self, hash: &Hash) -> Option<Vec<u8>>;
}

// =============================================================================
// MODULE HANDLER
// =============================================================================

/// Per-module business-logic translator behind one precompile address.
///
/// Handlers receive arguments already decoded against the method's input
/// types and return values that the kernel encodes against its outputs.
pub trait ModuleHandler<M: ModuleStore>: Send + Sync {
    /// Methods exposed through the precompile.
    fn methods(&self) -> Vec<MethodDescriptor>;

    /// True for state-mutating operations (transaction gas schedule).
    fn is_mutating(&self, method: &str) -> bool;

    /// Executes one decoded call.
    fn handle(
        &self,
        ctx: &mut HandlerContext<'_, M>,
        caller: Address,
        method: &MethodDescriptor,
        args: Vec<Value>,
    ) -> Result<Vec<Value>, HandlerError>;
}
