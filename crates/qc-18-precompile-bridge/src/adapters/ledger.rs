//! # EVM Ledger Adapter
//!
//! In-memory balance ledger with an undo journal.
//! Production would delegate to the interpreter's state database.

use crate::domain::entities::{BalanceChangeReason, JournalEntry};
use crate::domain::value_objects::{Address, U256};
use crate::errors::LedgerError;
use crate::ports::outbound::EvmLedger;
use std::collections::HashMap;

/// In-memory EVM balance ledger.
#[derive(Debug, Default, Clone)]
pub struct InMemoryLedger {
    /// Account balances.
    balances: HashMap<Address, U256>,
    /// Undo records, oldest first.
    journal: Vec<JournalEntry>,
    /// Journal length at each open snapshot.
    snapshots: Vec<usize>,
}

impl InMemoryLedger {
    /// Create a new empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a balance directly, bypassing the journal (genesis/test setup).
    pub fn set_balance(&mut self, address: Address, balance: U256) {
        self.balances.insert(address, balance);
    }

    /// Snapshots not yet reverted or discarded.
    #[must_use]
    pub fn open_snapshots(&self) -> usize {
        self.snapshots.len()
    }

    fn undo(&mut self, entry: &JournalEntry) {
        let previous = entry.previous();
        if previous.is_zero() {
            self.balances.remove(&entry.address());
        } else {
            self.balances.insert(entry.address(), previous);
        }
    }
}

impl EvmLedger for InMemoryLedger {
    fn balance(&self, address: &Address) -> U256 {
        self.balances.get(address).copied().unwrap_or_default()
    }

    fn add_balance(
        &mut self,
        address: Address,
        amount: U256,
        reason: BalanceChangeReason,
    ) -> Result<(), LedgerError> {
        let previous = self.balance(&address);
        let updated = previous
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow(address))?;
        self.balances.insert(address, updated);
        self.journal.push(JournalEntry::BalanceIncrease {
            address,
            previous,
            reason,
        });
        Ok(())
    }

    fn sub_balance(
        &mut self,
        address: Address,
        amount: U256,
        reason: BalanceChangeReason,
    ) -> Result<(), LedgerError> {
        let previous = self.balance(&address);
        let updated = previous
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientBalance {
                address,
                required: amount,
                available: previous,
            })?;
        self.balances.insert(address, updated);
        self.journal.push(JournalEntry::BalanceDecrease {
            address,
            previous,
            reason,
        });
        Ok(())
    }

    fn snapshot(&mut self) -> usize {
        self.snapshots.push(self.journal.len());
        self.snapshots.len() - 1
    }

    fn revert_to_snapshot(&mut self, id: usize) -> Result<(), LedgerError> {
        let mark = *self
            .snapshots
            .get(id)
            .ok_or(LedgerError::UnknownSnapshot(id))?;
        self.snapshots.truncate(id);

        let undone: Vec<JournalEntry> = self.journal.drain(mark..).collect();
        for entry in undone.iter().rev() {
            self.undo(entry);
        }
        Ok(())
    }

    fn discard_snapshot(&mut self, id: usize) -> Result<(), LedgerError> {
        if id >= self.snapshots.len() {
            return Err(LedgerError::UnknownSnapshot(id));
        }
        self.snapshots.truncate(id);
        Ok(())
    }

    fn journal(&self) -> &[JournalEntry] {
        &self.journal
    }
}

// =============================================================================
// TESTS
// =============================================================================
