//! # Precompile Set
//!
//! Address-keyed dispatch used by the interpreter to decide whether a call
//! target is a precompile.

use crate::domain::entities::{CallContext, PrecompileOutput};
use crate::domain::value_objects::Address;
use crate::errors::PrecompileError;
use crate::kernel::env::ExecutionEnv;
use crate::ports::inbound::PrecompiledContract;
use crate::ports::outbound::ModuleStore;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Installed precompiles.
pub struct PrecompileSet<M: ModuleStore> {
    contracts: BTreeMap<Address, Arc<dyn PrecompiledContract<M> + Send + Sync>>,
}

impl<M: ModuleStore> Default for PrecompileSet<M> {
    fn default() -> Self {
        Self {
            contracts: BTreeMap::new(),
        }
    }
}

impl<M: ModuleStore> PrecompileSet<M> {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a contract at its own address, replacing any previous one.
    pub fn register(&mut self, contract: Arc<dyn PrecompiledContract<M> + Send + Sync>) {
        self.contracts.insert(contract.address(), contract);
    }

    /// Returns true if `address` hosts a precompile.
    #[must_use]
    pub fn is_precompile(&self, address: &Address) -> bool {
        self.contracts.contains_key(address)
    }

    /// Contract installed at `address`.
    #[must_use]
    pub fn get(&self, address: &Address) -> Option<Arc<dyn PrecompiledContract<M> + Send + Sync>> {
        self.contracts.get(address).cloned()
    }

    /// Installed addresses, ascending.
    pub fn addresses(&self) -> impl Iterator<Item = &Address> {
        self.contracts.keys()
    }

    /// Base gas for a call to `address`, if it is a precompile.
    #[must_use]
    pub fn required_gas(&self, address: &Address, input: &[u8]) -> Option<u64> {
        self.contracts.get(address).map(|c| c.required_gas(input))
    }

    /// Runs `call` if its target is a precompile.
    pub fn execute(
        &self,
        env: &mut ExecutionEnv<M>,
        call: CallContext,
    ) -> Option<Result<PrecompileOutput, PrecompileError>> {
        let contract = self.contracts.get(&call.target)?;
        Some(contract.run(env, call))
    }
}
