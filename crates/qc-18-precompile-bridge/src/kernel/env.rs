//! # Execution Environment
//!
//! Call-chain-wide resources shared by every precompile frame of one
//! transaction, and the per-frame view handed to module handlers.

use crate::abi::topics::{build_log, EventDescriptor};
use crate::abi::word::Value;
use crate::config::BridgeConfig;
use crate::domain::entities::EventLog;
use crate::domain::value_objects::{Address, Bytes, GasMeter};
use crate::errors::HandlerError;
use crate::interceptor::BalanceInterceptor;
use crate::kernel::gas::{descriptors, kv_read_cost, kv_write_cost};
use crate::ports::outbound::{EvmLedger, ModuleStore};

/// Resources shared across nested frames.
///
/// Later frames observe everything earlier frames appended. Nested kernels
/// receive the same environment.
pub struct ExecutionEnv<M: ModuleStore> {
    /// EVM-visible balance ledger.
    pub ledger: Box<dyn EvmLedger>,
    /// Module state and notification log.
    pub module: M,
    /// Transaction-wide module gas meter.
    pub gas_meter: GasMeter,
    /// Interception scope arena.
    pub interceptor: BalanceInterceptor,
    /// Logs emitted by successful frames.
    pub logs: Vec<EventLog>,
    /// Interpreter return-data buffer.
    pub return_data: Bytes,
    /// Height of the block being executed.
    pub block_height: u64,
}

impl<M: ModuleStore> ExecutionEnv<M> {
    /// Creates an environment over the given ledgers.
    pub fn new(ledger: impl EvmLedger + 'static, module: M, gas_meter: GasMeter) -> Self {
        Self {
            ledger: Box::new(ledger),
            module,
            gas_meter,
            interceptor: BalanceInterceptor::new(),
            logs: Vec::new(),
            return_data: Bytes::new(),
            block_height: 0,
        }
    }

    /// Sets the block height stamped on emitted logs.
    #[must_use]
    pub fn with_block_height(mut self, block_height: u64) -> Self {
        self.block_height = block_height;
        self
    }
}

/// A handler's view of one frame.
pub struct HandlerContext<'a, M: ModuleStore> {
    env: &'a mut ExecutionEnv<M>,
    contract: Address,
    read_only: bool,
    config: &'a BridgeConfig,
}

impl<'a, M: ModuleStore> HandlerContext<'a, M> {
    /// Creates the frame view for the precompile at `contract`.
    pub fn new(
        env: &'a mut ExecutionEnv<M>,
        contract: Address,
        read_only: bool,
        config: &'a BridgeConfig,
    ) -> Self {
        Self {
            env,
            contract,
            read_only,
            config,
        }
    }

    /// Bridge configuration.
    #[must_use]
    pub fn config(&self) -> &BridgeConfig {
        self.config
    }

    /// Address of the executing precompile.
    #[must_use]
    pub fn contract(&self) -> Address {
        self.contract
    }

    /// True for static calls.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Module state for queries.
    #[must_use]
    pub fn store(&self) -> &M {
        &self.env.module
    }

    /// Module state for mutation. Fails in static calls.
    pub fn store_mut(&mut self) -> Result<&mut M, HandlerError> {
        if self.read_only {
            return Err(HandlerError::WriteProtection);
        }
        Ok(&mut self.env.module)
    }

    /// Charges a key-value read of `len` bytes.
    pub fn charge_read(&mut self, len: usize) -> Result<(), HandlerError> {
        let cost = kv_read_cost(&self.config.gas, len);
        self.env.gas_meter.consume(cost, descriptors::READ)?;
        Ok(())
    }

    /// Charges a key-value write of `len` bytes.
    pub fn charge_write(&mut self, len: usize) -> Result<(), HandlerError> {
        if self.read_only {
            return Err(HandlerError::WriteProtection);
        }
        let cost = kv_write_cost(&self.config.gas, len);
        self.env.gas_meter.consume(cost, descriptors::WRITE)?;
        Ok(())
    }

    /// Appends an event log for this precompile.
    ///
    /// The log is dropped again if the frame reverts.
    pub fn emit(&mut self, event: &EventDescriptor, args: Vec<Value>) -> Result<(), HandlerError> {
        if self.read_only {
            return Err(HandlerError::WriteProtection);
        }
        let log = build_log(event, self.contract, args, self.env.block_height)?;
        self.env.logs.push(log);
        Ok(())
    }

    /// Fails unless `caller` is the account the operation acts for.
    pub fn require_caller(&self, caller: Address, expected: Address) -> Result<(), HandlerError> {
        if caller == expected {
            Ok(())
        } else {
            Err(HandlerError::Unauthorized { caller, expected })
        }
    }

    /// Shared environment, for calling into nested frames.
    pub fn env_mut(&mut self) -> &mut ExecutionEnv<M> {
        &mut *self.env
    }
}
