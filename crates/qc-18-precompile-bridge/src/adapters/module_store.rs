//! # Module Store Adapter
//!
//! In-memory module layer: bank, governance, slashing and evidence keepers
//! over one transactional state, plus the notification log they append to.
//!
//! Snapshots are whole-state copies. Reverting one restores balances, votes,
//! jail flags, evidence and the notification log together.

use crate::config::BridgeConfig;
use crate::domain::entities::{notification_attrs, notification_kinds, Notification};
use crate::domain::services::{keccak256, to_bech32};
use crate::domain::value_objects::{Address, Coin, Hash, U256};
use crate::errors::KeeperError;
use crate::ports::outbound::{
    vote_options, BankKeeper, EvidenceKeeper, GovKeeper, ModuleStore, NotificationLog,
    SlashingKeeper,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

/// Notification kinds emitted besides the bank balance records.
pub mod extra_kinds {
    /// Bank transfer summary.
    pub const TRANSFER: &str = "transfer";
    /// Governance vote.
    pub const PROPOSAL_VOTE: &str = "proposal_vote";
    /// Validator released from jail.
    pub const UNJAIL: &str = "unjail";
    /// Evidence stored.
    pub const SUBMIT_EVIDENCE: &str = "submit_evidence";
}

#[derive(Debug, Default, Clone)]
struct ModuleState {
    balances: HashMap<Address, BTreeMap<String, U256>>,
    supply: HashMap<String, U256>,
    notifications: Vec<Notification>,
    proposals: HashSet<u64>,
    votes: HashMap<(u64, Address), u8>,
    validators: HashMap<Address, bool>,
    evidence: HashMap<Hash, Vec<u8>>,
}

/// In-memory module store.
#[derive(Debug, Clone)]
pub struct InMemoryModuleStore {
    config: BridgeConfig,
    state: ModuleState,
    snapshots: Vec<ModuleState>,
}

impl InMemoryModuleStore {
    /// Create an empty store rendering addresses with `config`'s prefix.
    #[must_use]
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            config,
            state: ModuleState::default(),
            snapshots: Vec::new(),
        }
    }

    /// Snapshots not yet reverted or discarded.
    #[must_use]
    pub fn open_snapshots(&self) -> usize {
        self.snapshots.len()
    }

    /// Set a balance directly, adjusting supply, without notifications.
    pub fn set_balance(&mut self, address: Address, coin: Coin) {
        let held = self
            .state
            .balances
            .entry(address)
            .or_default()
            .entry(coin.denom.clone())
            .or_default();
        let supply = self.state.supply.entry(coin.denom).or_default();
        *supply = supply.saturating_sub(*held).saturating_add(coin.amount);
        *held = coin.amount;
    }

    /// Opens a proposal for voting.
    pub fn add_proposal(&mut self, proposal_id: u64) {
        self.state.proposals.insert(proposal_id);
    }

    /// Registers a validator.
    pub fn add_validator(&mut self, validator: Address, jailed: bool) {
        self.state.validators.insert(validator, jailed);
    }

    fn bech32(&self, address: &Address) -> Result<String, KeeperError> {
        to_bech32(address, &self.config).map_err(|e| KeeperError::InvalidRequest(e.to_string()))
    }
}

fn format_coins(coins: &[Coin]) -> String {
    coins
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

// =============================================================================
// NOTIFICATION LOG / STORE
// =============================================================================

impl NotificationLog for InMemoryModuleStore {
    fn len(&self) -> usize {
        self.state.notifications.len()
    }

    fn records_since(&self, offset: usize) -> &[Notification] {
        self.state.notifications.get(offset..).unwrap_or(&[])
    }

    fn emit(&mut self, notification: Notification) {
        self.state.notifications.push(notification);
    }
}

impl ModuleStore for InMemoryModuleStore {
    fn snapshot(&mut self) -> usize {
        self.snapshots.push(self.state.clone());
        self.snapshots.len() - 1
    }

    fn revert_to_snapshot(&mut self, id: usize) {
        if id < self.snapshots.len() {
            self.snapshots.truncate(id + 1);
            if let Some(state) = self.snapshots.pop() {
                self.state = state;
            }
        }
    }

    fn discard_snapshot(&mut self, id: usize) {
        self.snapshots.truncate(id);
    }
}

// =============================================================================
// KEEPERS
// =============================================================================

impl BankKeeper for InMemoryModuleStore {
    fn balance(&self, address: &Address, denom: &str) -> U256 {
        self.state
            .balances
            .get(address)
            .and_then(|coins| coins.get(denom))
            .copied()
            .unwrap_or_default()
    }

    fn all_balances(&self, address: &Address) -> Vec<Coin> {
        self.state
            .balances
            .get(address)
            .map(|coins| {
                coins
                    .iter()
                    .filter(|(_, amount)| !amount.is_zero())
                    .map(|(denom, amount)| Coin::new(denom.clone(), *amount))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn supply_of(&self, denom: &str) -> U256 {
        self.state.supply.get(denom).copied().unwrap_or_default()
    }

    fn send_coins(
        &mut self,
        from: Address,
        to: Address,
        coins: &[Coin],
    ) -> Result<(), KeeperError> {
        for coin in coins {
            let available = BankKeeper::balance(self, &from, &coin.denom);
            if available < coin.amount {
                return Err(KeeperError::InsufficientFunds {
                    required: coin.to_string(),
                    available: Coin::new(coin.denom.clone(), available).to_string(),
                });
            }
        }

        let spender = self.bech32(&from)?;
        let receiver = self.bech32(&to)?;

        for coin in coins {
            let from_balance = self
                .state
                .balances
                .entry(from)
                .or_default()
                .entry(coin.denom.clone())
                .or_default();
            *from_balance = from_balance.saturating_sub(coin.amount);

            let to_balance = self
                .state
                .balances
                .entry(to)
                .or_default()
                .entry(coin.denom.clone())
                .or_default();
            *to_balance = to_balance.saturating_add(coin.amount);
        }

        let amount = format_coins(coins);
        self.emit(
            Notification::new(notification_kinds::COIN_SPENT)
                .with_attribute(notification_attrs::SPENDER, spender.clone())
                .with_attribute(notification_attrs::AMOUNT, amount.clone()),
        );
        self.emit(
            Notification::new(notification_kinds::COIN_RECEIVED)
                .with_attribute(notification_attrs::RECEIVER, receiver.clone())
                .with_attribute(notification_attrs::AMOUNT, amount.clone()),
        );
        self.emit(
            Notification::new(extra_kinds::TRANSFER)
                .with_attribute("recipient", receiver)
                .with_attribute("sender", spender)
                .with_attribute(notification_attrs::AMOUNT, amount),
        );

        debug!(%from, %to, coins = coins.len(), "Coins sent");
        Ok(())
    }
}

impl GovKeeper for InMemoryModuleStore {
    fn vote(
        &mut self,
        proposal_id: u64,
        voter: Address,
        option: u8,
        metadata: &str,
    ) -> Result<(), KeeperError> {
        if !self.state.proposals.contains(&proposal_id) {
            return Err(KeeperError::NotFound(format!("proposal {proposal_id}")));
        }
        if !(vote_options::YES..=vote_options::NO_WITH_VETO).contains(&option) {
            return Err(KeeperError::InvalidRequest(format!(
                "invalid vote option {option}"
            )));
        }

        self.state.votes.insert((proposal_id, voter), option);
        let voter = self.bech32(&voter)?;
        self.emit(
            Notification::new(extra_kinds::PROPOSAL_VOTE)
                .with_attribute("proposal_id", proposal_id.to_string())
                .with_attribute("voter", voter)
                .with_attribute("option", option.to_string())
                .with_attribute("metadata", metadata),
        );
        Ok(())
    }

    fn get_vote(&self, proposal_id: u64, voter: &Address) -> Result<Option<u8>, KeeperError> {
        if !self.state.proposals.contains(&proposal_id) {
            return Err(KeeperError::NotFound(format!("proposal {proposal_id}")));
        }
        Ok(self.state.votes.get(&(proposal_id, *voter)).copied())
    }
}

impl SlashingKeeper for InMemoryModuleStore {
    fn is_jailed(&self, validator: &Address) -> Result<bool, KeeperError> {
        self.state
            .validators
            .get(validator)
            .copied()
            .ok_or_else(|| KeeperError::NotFound(format!("validator {validator}")))
    }

    fn unjail(&mut self, validator: Address) -> Result<(), KeeperError> {
        if !self.is_jailed(&validator)? {
            return Err(KeeperError::InvalidRequest("validator not jailed".to_string()));
        }
        self.state.validators.insert(validator, false);
        let address = self.bech32(&validator)?;
        self.emit(Notification::new(extra_kinds::UNJAIL).with_attribute("address", address));
        Ok(())
    }
}

impl EvidenceKeeper for InMemoryModuleStore {
    fn submit_evidence(
        &mut self,
        submitter: Address,
        evidence: &[u8],
    ) -> Result<Hash, KeeperError> {
        if evidence.is_empty() {
            return Err(KeeperError::InvalidRequest("empty evidence".to_string()));
        }
        let hash = keccak256(evidence);
        if self.state.evidence.contains_key(&hash) {
            return Err(KeeperError::InvalidRequest(format!(
                "evidence {hash} already submitted"
            )));
        }

        self.state.evidence.insert(hash, evidence.to_vec());
        let submitter = self.bech32(&submitter)?;
        self.emit(
            Notification::new(extra_kinds::SUBMIT_EVIDENCE)
                .with_attribute("evidence_hash", hex::encode(hash.0))
                .with_attribute("submitter", submitter),
        );
        Ok(hash)
    }

    fn evidence(&self, hash: &Hash) -> Option<Vec<u8>> {
        self.state.evidence.get(hash).cloned()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        Address::new([n; 20])
    }

    fn store() -> InMemoryModuleStore {
        InMemoryModuleStore::new(BridgeConfig::default())
    }

    #[test]
    fn test_send_coins_emits_notifications() {
        let mut store = store();
        store.set_balance(addr(1), Coin::new("uqc", 10u64));

        store
            .send_coins(addr(1), addr(2), &[Coin::new("uqc", 4u64)])
            .unwrap();

        assert_eq!(BankKeeper::balance(&store, &addr(1), "uqc"), U256::from(6));
        assert_eq!(BankKeeper::balance(&store, &addr(2), "uqc"), U256::from(4));
        assert_eq!(store.len(), 3);

        let kinds: Vec<&str> = store
            .records_since(0)
            .iter()
            .map(|n| n.kind.as_str())
            .collect();
        assert_eq!(kinds, vec!["coin_spent", "coin_received", "transfer"]);
        assert_eq!(store.records_since(0)[0].attribute("amount"), Some("4uqc"));
    }

    #[test]
    fn test_send_coins_insufficient() {
        let mut store = store();
        store.set_balance(addr(1), Coin::new("uqc", 1u64));

        let err = store
            .send_coins(addr(1), addr(2), &[Coin::new("uqc", 2u64)])
            .unwrap_err();

        assert!(matches!(err, KeeperError::InsufficientFunds { .. }));
        assert!(store.is_empty());
    }

    #[test]
    fn test_supply_tracks_set_balance() {
        let mut store = store();
        store.set_balance(addr(1), Coin::new("uqc", 10u64));
        store.set_balance(addr(2), Coin::new("uqc", 5u64));
        store.set_balance(addr(1), Coin::new("uqc", 3u64));
        assert_eq!(store.supply_of("uqc"), U256::from(8));
    }

    #[test]
    fn test_all_balances_sorted_non_zero() {
        let mut store = store();
        store.set_balance(addr(1), Coin::new("zeta", 1u64));
        store.set_balance(addr(1), Coin::new("alpha", 2u64));
        store.set_balance(addr(1), Coin::new("empty", 0u64));

        let coins = store.all_balances(&addr(1));
        assert_eq!(
            coins,
            vec![Coin::new("alpha", 2u64), Coin::new("zeta", 1u64)]
        );
    }

    #[test]
    fn test_snapshot_restores_state_and_log() {
        let mut store = store();
        store.set_balance(addr(1), Coin::new("uqc", 10u64));

        let snap = store.snapshot();
        store
            .send_coins(addr(1), addr(2), &[Coin::new("uqc", 10u64)])
            .unwrap();
        assert_eq!(store.len(), 3);

        ModuleStore::revert_to_snapshot(&mut store, snap);
        assert!(store.is_empty());
        assert_eq!(BankKeeper::balance(&store, &addr(1), "uqc"), U256::from(10));
    }

    #[test]
    fn test_discard_snapshot_keeps_state() {
        let mut store = store();
        store.set_balance(addr(1), Coin::new("uqc", 10u64));

        let outer = store.snapshot();
        let inner = store.snapshot();
        store
            .send_coins(addr(1), addr(2), &[Coin::new("uqc", 4u64)])
            .unwrap();

        store.discard_snapshot(inner);
        assert_eq!(store.open_snapshots(), 1);
        assert_eq!(store.len(), 3);

        store.discard_snapshot(outer);
        assert_eq!(store.open_snapshots(), 0);
        assert_eq!(BankKeeper::balance(&store, &addr(2), "uqc"), U256::from(4));
    }

    #[test]
    fn test_vote_rules() {
        let mut store = store();
        assert!(matches!(
            store.vote(1, addr(1), vote_options::YES, ""),
            Err(KeeperError::NotFound(_))
        ));

        store.add_proposal(1);
        assert!(store.vote(1, addr(1), 9, "").is_err());
        store.vote(1, addr(1), vote_options::NO, "meta").unwrap();
        assert_eq!(store.get_vote(1, &addr(1)).unwrap(), Some(vote_options::NO));
        assert_eq!(store.get_vote(1, &addr(2)).unwrap(), None);
    }

    #[test]
    fn test_unjail() {
        let mut store = store();
        store.add_validator(addr(1), true);
        store.add_validator(addr(2), false);

        store.unjail(addr(1)).unwrap();
        assert!(!store.is_jailed(&addr(1)).unwrap());
        assert!(store.unjail(addr(2)).is_err());
        assert!(store.unjail(addr(3)).is_err());
    }

    #[test]
    fn test_evidence() {
        let mut store = store();
        let hash = store.submit_evidence(addr(1), b"double sign").unwrap();
        assert_eq!(store.evidence(&hash), Some(b"double sign".to_vec()));
        assert!(store.submit_evidence(addr(1), b"double sign").is_err());
        assert!(store.submit_evidence(addr(1), b"").is_err());
    }
}
