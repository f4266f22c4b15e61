//! # Driving Ports (API - Inbound)
//!
//! The entry points the interpreter uses to reach a precompile.

use crate::domain::entities::{CallContext, PrecompileOutput};
use crate::domain::value_objects::Address;
use crate::errors::PrecompileError;
use crate::kernel::env::ExecutionEnv;
use crate::ports::outbound::ModuleStore;

/// A natively implemented contract reachable through the call convention.
///
/// ## Contract
///
/// - `required_gas` never fails; unparseable input costs 0
/// - `run` never panics past its boundary; faults become `OutOfGas`
/// - `MalformedInput` leaves every ledger untouched
pub trait PrecompiledContract<M: ModuleStore> {
    /// Address the contract is installed at.
    fn address(&self) -> Address;

    /// Base gas for fee estimation, charged by the interpreter before `run`.
    fn required_gas(&self, input: &[u8]) -> u64;

    /// Executes one call.
    ///
    /// # Returns
    ///
    /// * `Ok(PrecompileOutput)` - Gas used and ABI-encoded output
    /// * `Err(PrecompileError::Reverted)` - Business failure with reason payload
    /// * `Err(PrecompileError::OutOfGas)` - Budget exhausted
    /// * `Err(PrecompileError::MalformedInput)` - Rejected before execution
    fn run(
        &self,
        env: &mut ExecutionEnv<M>,
        call: CallContext,
    ) -> Result<PrecompileOutput, PrecompileError>;
}
