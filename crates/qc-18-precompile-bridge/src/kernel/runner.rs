//! # Precompile Kernel
//!
//! Per-call lifecycle controller: `Dispatch -> Execute -> Reconcile ->
//! Finalize`, terminating in success, revert or out-of-gas.
//!
//! ## Outcome mapping
//!
//! | Failure | Outcome |
//! |---------|---------|
//! | input < 4 bytes, unknown selector | `MalformedInput` (zero gas, no effects) |
//! | static call to mutating method | `Reverted("write protection")` |
//! | bad arguments, unauthorized, module error | `Reverted(reason)` |
//! | notification replay failure | `Reverted(reason)` |
//! | module gas meter exhausted, cost > budget | `OutOfGas` |
//! | handler panic | `OutOfGas` |

use crate::abi::codec::{decode, encode_typed, revert_payload};
use crate::config::BridgeConfig;
use crate::domain::entities::{CallContext, CallPhase, PrecompileOutput};
use crate::domain::value_objects::{Address, Bytes};
use crate::errors::{HandlerError, PrecompileError};
use crate::kernel::env::{ExecutionEnv, HandlerContext};
use crate::kernel::gas::base_cost;
use crate::kernel::guard::{catch_fault, FrameGuard};
use crate::kernel::method::{MethodDescriptor, MethodRegistry};
use crate::ports::inbound::PrecompiledContract;
use crate::ports::outbound::{ModuleHandler, ModuleStore};
use tracing::{debug, instrument, warn};

/// Why a frame did not succeed.
enum Failure {
    Revert(String),
    OutOfGas,
}

impl From<HandlerError> for Failure {
    fn from(err: HandlerError) -> Self {
        match err {
            HandlerError::OutOfGas(_) => Self::OutOfGas,
            other => Self::Revert(other.to_string()),
        }
    }
}

/// Precompile bound to one module handler.
pub struct PrecompileKernel<M: ModuleStore> {
    address: Address,
    config: BridgeConfig,
    handler: Box<dyn ModuleHandler<M>>,
    methods: MethodRegistry,
}

impl<M: ModuleStore> PrecompileKernel<M> {
    /// Installs `handler` at `address`.
    pub fn new(
        address: Address,
        config: BridgeConfig,
        handler: impl ModuleHandler<M> + 'static,
    ) -> Self {
        let methods = MethodRegistry::new(handler.methods());
        Self {
            address,
            config,
            handler: Box::new(handler),
            methods,
        }
    }

    /// Precompile address.
    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    /// Bridge configuration.
    #[must_use]
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Registered methods.
    #[must_use]
    pub fn methods(&self) -> &MethodRegistry {
        &self.methods
    }

    /// Base gas for fee estimation. Zero when no method can be resolved.
    #[must_use]
    pub fn required_gas(&self, input: &[u8]) -> u64 {
        match self.methods.resolve(input) {
            Some(method) => base_cost(
                &self.config.gas,
                self.handler.is_mutating(&method.name),
                input.len().saturating_sub(4),
            ),
            None => 0,
        }
    }

    /// Executes one call against `env`.
    #[instrument(
        name = "precompile_run",
        skip_all,
        fields(precompile = %self.address, caller = %call.caller, selector = tracing::field::Empty)
    )]
    pub fn run(
        &self,
        env: &mut ExecutionEnv<M>,
        call: CallContext,
    ) -> Result<PrecompileOutput, PrecompileError> {
        debug!(phase = ?CallPhase::Dispatch, input_len = call.input.len());
        let Some(method) = self.methods.resolve(call.input.as_slice()) else {
            warn!(input_len = call.input.len(), "Rejecting malformed precompile input");
            return Err(PrecompileError::MalformedInput(if call.input.len() < 4 {
                format!("input too short: {} bytes", call.input.len())
            } else {
                format!("unknown selector 0x{}", hex::encode(&call.input.as_slice()[..4]))
            }));
        };
        tracing::Span::current().record("selector", method.signature().as_str());

        env.return_data.clear();
        let frame = FrameGuard::open(env);
        let initial_gas = frame.initial_gas();

        let outcome = catch_fault(|| self.execute(env, &call, method, initial_gas));

        match outcome {
            Ok(Ok((gas_used, output))) => {
                frame.commit(env);
                env.return_data = Bytes::from_slice(&output);
                debug!(gas_used, "Precompile call succeeded");
                Ok(PrecompileOutput {
                    gas_used,
                    output: Bytes::from_vec(output),
                })
            }
            Ok(Err(Failure::Revert(reason))) => {
                frame.rollback(env);
                warn!(%reason, "Precompile call reverted");
                let data = Bytes::from_vec(revert_payload(&reason));
                env.return_data = data.clone();
                Err(PrecompileError::Reverted { reason, data })
            }
            Ok(Err(Failure::OutOfGas)) => {
                frame.rollback(env);
                env.return_data.clear();
                warn!(budget = call.gas_budget, "Precompile call ran out of gas");
                Err(PrecompileError::OutOfGas)
            }
            Err(fault) => {
                frame.rollback(env);
                env.return_data.clear();
                warn!(%fault, "Precompile handler faulted");
                Err(PrecompileError::OutOfGas)
            }
        }
    }

    /// Execute, Reconcile and Finalize. Returns gas used and output bytes.
    fn execute(
        &self,
        env: &mut ExecutionEnv<M>,
        call: &CallContext,
        method: &MethodDescriptor,
        initial_gas: u64,
    ) -> Result<(u64, Vec<u8>), Failure> {
        debug!(phase = ?CallPhase::Execute, method = %method.name);
        if call.read_only && self.handler.is_mutating(&method.name) {
            return Err(HandlerError::WriteProtection.into());
        }
        let args = decode(&method.inputs, &call.input.as_slice()[4..])
            .map_err(|e| Failure::from(HandlerError::from(e)))?;

        let scope = env.interceptor.begin_scope(env.module.len());
        let handled = {
            let mut ctx = HandlerContext::new(env, self.address, call.read_only, &self.config);
            self.handler.handle(&mut ctx, call.caller, method, args)
        };
        let values = match handled {
            Ok(values) => values,
            Err(err) => {
                if let Err(scope_err) = env.interceptor.discard_scope(scope) {
                    warn!(%scope_err, "Discarding interception scope failed");
                }
                return Err(err.into());
            }
        };

        debug!(phase = ?CallPhase::Reconcile);
        env.interceptor
            .end_scope(scope, &env.module, env.ledger.as_mut(), &self.config)
            .map_err(|e| Failure::Revert(e.to_string()))?;

        let output = encode_typed(&method.outputs, &values)
            .map_err(|e| Failure::Revert(format!("invalid return values: {e}")))?;

        debug!(phase = ?CallPhase::Finalize);
        let cost = env.gas_meter.consumed().saturating_sub(initial_gas);
        if cost > call.gas_budget {
            return Err(Failure::OutOfGas);
        }
        Ok((cost, output))
    }
}

impl<M: ModuleStore> PrecompiledContract<M> for PrecompileKernel<M> {
    fn address(&self) -> Address {
        self.address
    }

    fn required_gas(&self, input: &[u8]) -> u64 {
        PrecompileKernel::required_gas(self, input)
    }

    fn run(
        &self,
        env: &mut ExecutionEnv<M>,
        call: CallContext,
    ) -> Result<PrecompileOutput, PrecompileError> {
        PrecompileKernel::run(self, env, call)
    }
}

// =============================================================================
// TESTS
// =============================================================================
