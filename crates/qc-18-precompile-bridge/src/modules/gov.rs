//! # Governance Precompile

use crate::abi::topics::EventDescriptor;
use crate::abi::word::Value;
use crate::domain::value_objects::Address;
use crate::errors::{AbiError, HandlerError};
use crate::kernel::env::HandlerContext;
use crate::kernel::method::MethodDescriptor;
use crate::modules::{address_arg, string_arg, u64_arg, u8_arg};
use crate::ports::outbound::{GovKeeper, ModuleHandler, ModuleStore};

/// Returned by `getVote` when no vote was cast.
pub const VOTE_OPTION_UNSPECIFIED: u8 = 0;

/// Governance module handler.
pub struct GovHandler {
    methods: Vec<MethodDescriptor>,
    vote: EventDescriptor,
}

impl GovHandler {
    /// Declares the governance methods and events.
    pub fn new() -> Result<Self, AbiError> {
        Ok(Self {
            methods: vec![
                MethodDescriptor::new("vote", &["address", "uint64", "uint8", "string"], &["bool"])?,
                MethodDescriptor::new("getVote", &["uint64", "address"], &["uint8"])?,
            ],
            vote: EventDescriptor::new(
                "Vote",
                &[("address", true), ("uint64", true), ("uint8", false)],
            )?,
        })
    }
}

impl<M: ModuleStore + GovKeeper> ModuleHandler<M> for GovHandler {
    fn methods(&self) -> Vec<MethodDescriptor> {
        self.methods.clone()
    }

    fn is_mutating(&self, method: &str) -> bool {
        method == "vote"
    }

    fn handle(
        &self,
        ctx: &mut HandlerContext<'_, M>,
        caller: Address,
        method: &MethodDescriptor,
        args: Vec<Value>,
    ) -> Result<Vec<Value>, HandlerError> {
        match method.name.as_str() {
            "vote" => {
                let voter = address_arg(&args, 0, "voter")?;
                let proposal_id = u64_arg(&args, 1, "proposalId")?;
                let option = u8_arg(&args, 2, "option")?;
                let metadata = string_arg(&args, 3, "metadata")?;

                ctx.require_caller(caller, voter)?;
                ctx.charge_write(8 + Address::LEN + 1 + metadata.len())?;
                ctx.store_mut()?.vote(proposal_id, voter, option, metadata)?;
                ctx.emit(
                    &self.vote,
                    vec![
                        Value::Address(voter),
                        Value::Uint64(proposal_id),
                        Value::Uint8(option),
                    ],
                )?;
                Ok(vec![Value::Bool(true)])
            }
            "getVote" => {
                let proposal_id = u64_arg(&args, 0, "proposalId")?;
                let voter = address_arg(&args, 1, "voter")?;

                ctx.charge_read(8 + Address::LEN)?;
                let option = ctx
                    .store()
                    .get_vote(proposal_id, &voter)?
                    .unwrap_or(VOTE_OPTION_UNSPECIFIED);
                Ok(vec![Value::Uint8(option)])
            }
            other => Err(HandlerError::Module(format!("unknown method {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryLedger, InMemoryModuleStore};
    use crate::config::BridgeConfig;
    use crate::domain::value_objects::GasMeter;
    use crate::kernel::env::ExecutionEnv;
    use crate::ports::outbound::vote_options;

    fn addr(n: u8) -> Address {
        Address::new([n; 20])
    }

    fn method(handler: &GovHandler, name: &str) -> MethodDescriptor {
        ModuleHandler::<InMemoryModuleStore>::methods(handler)
            .into_iter()
            .find(|m| m.name == name)
            .unwrap()
    }

    #[test]
    fn test_vote_then_get_vote() {
        let handler = GovHandler::new().unwrap();
        let config = BridgeConfig::default();
        let mut store = InMemoryModuleStore::new(config.clone());
        store.add_proposal(7);
        let mut env = ExecutionEnv::new(InMemoryLedger::new(), store, GasMeter::infinite());
        let mut ctx = HandlerContext::new(&mut env, addr(5), false, &config);

        let vote = vec![
            Value::Address(addr(1)),
            Value::Uint64(7),
            Value::Uint8(vote_options::YES),
            Value::String(String::new()),
        ];
        handler
            .handle(&mut ctx, addr(1), &method(&handler, "vote"), vote)
            .unwrap();

        let out = handler
            .handle(
                &mut ctx,
                addr(2),
                &method(&handler, "getVote"),
                vec![Value::Uint64(7), Value::Address(addr(1))],
            )
            .unwrap();
        assert_eq!(out, vec![Value::Uint8(vote_options::YES)]);

        let out = handler
            .handle(
                &mut ctx,
                addr(2),
                &method(&handler, "getVote"),
                vec![Value::Uint64(7), Value::Address(addr(3))],
            )
            .unwrap();
        assert_eq!(out, vec![Value::Uint8(VOTE_OPTION_UNSPECIFIED)]);
    }

    #[test]
    fn test_vote_for_someone_else_rejected() {
        let handler = GovHandler::new().unwrap();
        let config = BridgeConfig::default();
        let mut store = InMemoryModuleStore::new(config.clone());
        store.add_proposal(7);
        let mut env = ExecutionEnv::new(InMemoryLedger::new(), store, GasMeter::infinite());
        let mut ctx = HandlerContext::new(&mut env, addr(5), false, &config);

        let vote = vec![
            Value::Address(addr(1)),
            Value::Uint64(7),
            Value::Uint8(vote_options::NO),
            Value::String(String::new()),
        ];
        let err = handler
            .handle(&mut ctx, addr(2), &method(&handler, "vote"), vote)
            .unwrap_err();
        assert!(matches!(err, HandlerError::Unauthorized { .. }));
    }
}
