//! # Adapters Layer (Outer Hexagon)
//!
//! In-memory implementations of the driven ports, used by tests and by
//! embedders without a persistent state backend.

pub mod ledger;
pub mod module_store;

pub use ledger::InMemoryLedger;
pub use module_store::InMemoryModuleStore;
