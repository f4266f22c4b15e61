//! # Frame Guard
//!
//! Explicit commit/rollback around one precompile frame, and the fault
//! barrier that keeps handler panics from crossing the call boundary.
//!
//! A [`FrameGuard`] is opened before any frame effect and must be closed
//! with exactly one of [`FrameGuard::commit`] or [`FrameGuard::rollback`].

use crate::kernel::env::ExecutionEnv;
use crate::ports::outbound::ModuleStore;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, error};

/// Restore point for one frame.
#[derive(Debug)]
#[must_use = "a frame must be committed or rolled back"]
pub struct FrameGuard {
    ledger_snapshot: usize,
    module_snapshot: usize,
    logs_len: usize,
    initial_gas: u64,
    scope_depth: usize,
}

impl FrameGuard {
    /// Snapshots the ledgers, the log buffer and the gas counter.
    pub fn open<M: ModuleStore>(env: &mut ExecutionEnv<M>) -> Self {
        Self {
            ledger_snapshot: env.ledger.snapshot(),
            module_snapshot: env.module.snapshot(),
            logs_len: env.logs.len(),
            initial_gas: env.gas_meter.consumed(),
            scope_depth: env.interceptor.depth(),
        }
    }

    /// Gas consumed on the shared meter when the frame opened.
    #[must_use]
    pub fn initial_gas(&self) -> u64 {
        self.initial_gas
    }

    /// Keeps every effect of the frame and releases its snapshots.
    pub fn commit<M: ModuleStore>(self, env: &mut ExecutionEnv<M>) {
        if let Err(err) = env.ledger.discard_snapshot(self.ledger_snapshot) {
            error!(%err, "EVM ledger snapshot release failed");
        }
        env.module.discard_snapshot(self.module_snapshot);
        debug!(initial_gas = self.initial_gas, "Frame committed");
    }

    /// Undoes every effect of the frame.
    ///
    /// Ledger and module state, logs and interception scopes return to
    /// where they were at `open`. Consumed gas is not refunded.
    pub fn rollback<M: ModuleStore>(self, env: &mut ExecutionEnv<M>) {
        if let Err(err) = env.ledger.revert_to_snapshot(self.ledger_snapshot) {
            error!(%err, "EVM ledger rollback failed");
        }
        env.module.revert_to_snapshot(self.module_snapshot);
        env.logs.truncate(self.logs_len);
        env.interceptor.unwind_to(self.scope_depth);
        env.interceptor.truncate_log(env.module.len());
        debug!(initial_gas = self.initial_gas, "Frame rolled back");
    }
}

/// Runs `f`, turning a panic into `Err(message)`.
pub fn catch_fault<T>(f: impl FnOnce() -> T) -> Result<T, String> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(panic_message)
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "<unknown panic>".to_string()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryLedger, InMemoryModuleStore};
    use crate::config::BridgeConfig;
    use crate::domain::entities::{BalanceChangeReason, EventLog, Notification};
    use crate::domain::value_objects::{Address, Bytes, GasMeter, U256};
    use crate::ports::outbound::NotificationLog;

    fn env() -> ExecutionEnv<InMemoryModuleStore> {
        ExecutionEnv::new(
            InMemoryLedger::new(),
            InMemoryModuleStore::new(BridgeConfig::default()),
            GasMeter::new(100_000),
        )
    }

    #[test]
    fn test_catch_fault_passes_value() {
        assert_eq!(catch_fault(|| 7), Ok(7));
    }

    #[test]
    fn test_catch_fault_captures_panic() {
        let result: Result<(), String> = catch_fault(|| panic!("boom"));
        assert_eq!(result, Err("boom".to_string()));

        let result: Result<(), String> = catch_fault(|| panic!("{}", String::from("owned")));
        assert_eq!(result, Err("owned".to_string()));
    }

    #[test]
    fn test_rollback_restores_everything() {
        let mut env = env();
        let guard = FrameGuard::open(&mut env);

        env.ledger
            .add_balance(Address::new([1u8; 20]), U256::from(5), BalanceChangeReason::Precompile)
            .unwrap();
        env.module.emit(Notification::new("anything"));
        env.logs.push(EventLog {
            address: Address::ZERO,
            topics: Vec::new(),
            data: Bytes::new(),
            block_height: 0,
        });
        let _scope = env.interceptor.begin_scope(0);
        env.gas_meter.consume(500, "test").unwrap();

        guard.rollback(&mut env);

        assert_eq!(env.ledger.balance(&Address::new([1u8; 20])), U256::zero());
        assert!(env.module.is_empty());
        assert!(env.logs.is_empty());
        assert_eq!(env.interceptor.depth(), 0);
        assert_eq!(env.gas_meter.consumed(), 500);
    }

    #[test]
    fn test_commit_keeps_effects() {
        let mut env = env();
        let guard = FrameGuard::open(&mut env);
        assert_eq!(guard.initial_gas(), 0);

        env.ledger
            .add_balance(Address::new([1u8; 20]), U256::from(5), BalanceChangeReason::Precompile)
            .unwrap();
        guard.commit(&mut env);

        assert_eq!(env.ledger.balance(&Address::new([1u8; 20])), U256::from(5));
        assert_eq!(env.ledger.journal().len(), 1);
        assert_eq!(env.module.open_snapshots(), 0);
        assert_eq!(
            env.ledger.discard_snapshot(0),
            Err(crate::errors::LedgerError::UnknownSnapshot(0))
        );
    }

    #[test]
    fn test_nested_commit_leaves_outer_frame_open() {
        let mut env = env();
        let outer = FrameGuard::open(&mut env);
        let inner = FrameGuard::open(&mut env);

        env.ledger
            .add_balance(Address::new([2u8; 20]), U256::from(9), BalanceChangeReason::Precompile)
            .unwrap();
        inner.commit(&mut env);
        assert_eq!(env.module.open_snapshots(), 1);

        outer.rollback(&mut env);
        assert_eq!(env.ledger.balance(&Address::new([2u8; 20])), U256::zero());
        assert_eq!(env.module.open_snapshots(), 0);
    }
}
