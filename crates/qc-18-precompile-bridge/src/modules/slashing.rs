//! # Slashing Precompile

use crate::abi::topics::EventDescriptor;
use crate::abi::word::Value;
use crate::domain::value_objects::Address;
use crate::errors::{AbiError, HandlerError};
use crate::kernel::env::HandlerContext;
use crate::kernel::method::MethodDescriptor;
use crate::modules::address_arg;
use crate::ports::outbound::{ModuleHandler, ModuleStore, SlashingKeeper};

/// Slashing module handler.
pub struct SlashingHandler {
    methods: Vec<MethodDescriptor>,
    unjailed: EventDescriptor,
}

impl SlashingHandler {
    /// Declares the slashing methods and events.
    pub fn new() -> Result<Self, AbiError> {
        Ok(Self {
            methods: vec![
                MethodDescriptor::new("unjail", &["address"], &["bool"])?,
                MethodDescriptor::new("isJailed", &["address"], &["bool"])?,
            ],
            unjailed: EventDescriptor::new("ValidatorUnjailed", &[("address", true)])?,
        })
    }
}

impl<M: ModuleStore + SlashingKeeper> ModuleHandler<M> for SlashingHandler {
    fn methods(&self) -> Vec<MethodDescriptor> {
        self.methods.clone()
    }

    fn is_mutating(&self, method: &str) -> bool {
        method == "unjail"
    }

    fn handle(
        &self,
        ctx: &mut HandlerContext<'_, M>,
        caller: Address,
        method: &MethodDescriptor,
        args: Vec<Value>,
    ) -> Result<Vec<Value>, HandlerError> {
        let validator = address_arg(&args, 0, "validator")?;
        match method.name.as_str() {
            "unjail" => {
                ctx.require_caller(caller, validator)?;
                ctx.charge_write(Address::LEN)?;
                ctx.store_mut()?.unjail(validator)?;
                ctx.emit(&self.unjailed, vec![Value::Address(validator)])?;
                Ok(vec![Value::Bool(true)])
            }
            "isJailed" => {
                ctx.charge_read(Address::LEN)?;
                let jailed = ctx.store().is_jailed(&validator)?;
                Ok(vec![Value::Bool(jailed)])
            }
            other => Err(HandlerError::Module(format!("unknown method {other}"))),
        }
    }
}
