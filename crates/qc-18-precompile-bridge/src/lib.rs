//! # QC-18 Precompile Bridge - Native Module Precompiles Subsystem
//!
//! **Subsystem ID:** 18
//! **Status:** Production-Ready (Phase 1)
//!
//! ## Purpose
//!
//! Lets contract bytecode call native chain modules (bank transfers,
//! governance votes, validator unjailing, evidence submission) as ordinary
//! contract calls, while keeping the EVM account-balance ledger and the
//! module coin ledger numerically consistent.
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement Location |
//! |-----------|---------------------|
//! | Fixed-width ints sign-extend, big ints are sign-magnitude | `abi/word.rs` - `encode_word()` |
//! | A scope applies all of its deltas or none | `interceptor.rs` - `end_scope()` |
//! | Nested scopes never double-count notifications | `interceptor.rs` - consumed ranges |
//! | Malformed input costs zero gas and touches nothing | `kernel/runner.rs` - dispatch |
//! | Cost over budget is `OutOfGas`, never success | `kernel/runner.rs` - finalize |
//! | Handler faults never cross the call boundary | `kernel/guard.rs` - `catch_fault()` |
//!
//! ## Call Lifecycle
//!
//! ```text
//! run(call)
//!   Dispatch   selector -> MethodDescriptor        (MalformedInput)
//!   Execute    FrameGuard::open, begin_scope, handler
//!   Reconcile  end_scope: notifications -> ledger deltas
//!   Finalize   cost = consumed - initial_gas <= budget
//!   commit | rollback + revert payload | rollback + OutOfGas
//! ```
//!
//! ## Outbound Dependencies
//!
//! | Collaborator | Trait | Purpose |
//! |--------------|-------|---------|
//! | Interpreter state | `EvmLedger` | EVM balances + undo journal |
//! | Module layer | `ModuleStore` | Notification log + transactional state |
//! | Module keepers | `BankKeeper`, `GovKeeper`, `SlashingKeeper`, `EvidenceKeeper` | Business logic |
//!
//! ## Components
//!
//! | Component | Location | Purpose |
//! |-----------|----------|---------|
//! | Word encoder | `abi/word.rs` | Values -> 32-byte words and topics |
//! | ABI codec | `abi/codec.rs` | Head/tail codec, revert payloads |
//! | Event logs | `abi/topics.rs` | Event ids and log records |
//! | Interceptor | `interceptor.rs` | Balance replay across ledgers |
//! | Kernel | `kernel/` | Call lifecycle, gas, rollback |
//! | Handlers | `modules/` | bank, gov, slashing, evidence |
//!
//! ## Usage Example
//!
//! ```ignore
//! use qc_18_precompile_bridge::prelude::*;
//!
//! let config = BridgeConfig::from_env()?;
//! let precompiles = install_all::<InMemoryModuleStore>(&config)?;
//! let mut env = ExecutionEnv::new(
//!     InMemoryLedger::new(),
//!     InMemoryModuleStore::new(config.clone()),
//!     GasMeter::new(10_000_000),
//! );
//!
//! let call = CallContext::new(caller, addresses::BANK, input, 100_000);
//! match precompiles.execute(&mut env, call) {
//!     Some(Ok(out)) => println!("Gas used: {}", out.gas_used),
//!     Some(Err(err)) => println!("Failed: {err}"),
//!     None => println!("Not a precompile"),
//! }
//! ```

// Crate-level lints
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]

// =============================================================================
// MODULES
// =============================================================================

pub mod abi;
pub mod adapters;
pub mod config;
pub mod domain;
pub mod errors;
pub mod interceptor;
pub mod kernel;
pub mod modules;
pub mod ports;

// =============================================================================
// PRELUDE
// =============================================================================

/// Convenient re-exports for common usage.
pub mod prelude {
    // Configuration
    pub use crate::config::{BridgeConfig, KvGasConfig, EVM_DECIMALS};

    // Domain entities
    pub use crate::domain::entities::{
        BalanceChangeReason, CallContext, CallPhase, DeltaDirection, EventLog, JournalEntry,
        LedgerDelta, Notification, PrecompileOutput,
    };

    // Value objects
    pub use crate::domain::value_objects::{
        Address, Bytes, Coin, Dec, DecCoin, GasMeter, Hash, Word, U256,
    };

    // Domain services
    pub use crate::domain::services::{keccak256, parse_address, selector, to_bech32};

    // Encoder
    pub use crate::abi::{
        decode, decode_revert_reason, encode, encode_word, pack_signed_magnitude,
        revert_payload, BigInt, EventDescriptor, ParamType, Value,
    };

    // Interceptor
    pub use crate::interceptor::{BalanceInterceptor, ScopeHandle};

    // Kernel
    pub use crate::kernel::{
        ExecutionEnv, HandlerContext, MethodDescriptor, PrecompileKernel, PrecompileSet,
    };

    // Ports
    pub use crate::ports::inbound::PrecompiledContract;
    pub use crate::ports::outbound::{
        BankKeeper, EvidenceKeeper, EvmLedger, GovKeeper, ModuleHandler, ModuleStore,
        NotificationLog, SlashingKeeper,
    };

    // Errors
    pub use crate::errors::{
        AbiError, ConfigError, EncodeError, HandlerError, InterceptError, KeeperError,
        LedgerError, PrecompileError,
    };

    // Adapters
    pub use crate::adapters::{InMemoryLedger, InMemoryModuleStore};

    // Module handlers
    pub use crate::modules::{
        addresses, install_all, BankHandler, EvidenceHandler, GovHandler, SlashingHandler,
    };
}

// =============================================================================
// CRATE INFO
// =============================================================================

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Subsystem ID.
pub const SUBSYSTEM_ID: u8 = 18;

/// Subsystem name.
pub const SUBSYSTEM_NAME: &str = "Native Module Precompiles";

// =============================================================================
// TESTS
// =============================================================================
