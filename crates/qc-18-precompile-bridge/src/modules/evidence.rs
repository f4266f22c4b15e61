//! # Evidence Precompile

use crate::abi::topics::EventDescriptor;
use crate::abi::word::Value;
use crate::domain::value_objects::Address;
use crate::errors::{AbiError, HandlerError};
use crate::kernel::env::HandlerContext;
use crate::kernel::method::MethodDescriptor;
use crate::modules::{address_arg, bytes_arg, hash_arg};
use crate::ports::outbound::{EvidenceKeeper, ModuleHandler, ModuleStore};

/// Evidence module handler.
pub struct EvidenceHandler {
    methods: Vec<MethodDescriptor>,
    submitted: EventDescriptor,
}

impl EvidenceHandler {
    /// Declares the evidence methods and events.
    pub fn new() -> Result<Self, AbiError> {
        Ok(Self {
            methods: vec![
                MethodDescriptor::new("submitEvidence", &["address", "bytes"], &["bytes32"])?,
                MethodDescriptor::new("evidence", &["bytes32"], &["bytes"])?,
            ],
            submitted: EventDescriptor::new(
                "SubmitEvidence",
                &[("address", true), ("bytes32", false)],
            )?,
        })
    }
}

impl<M: ModuleStore + EvidenceKeeper> ModuleHandler<M> for EvidenceHandler {
    fn methods(&self) -> Vec<MethodDescriptor> {
        self.methods.clone()
    }

    fn is_mutating(&self, method: &str) -> bool {
        method == "submitEvidence"
    }

    fn handle(
        &self,
        ctx: &mut HandlerContext<'_, M>,
        caller: Address,
        method: &MethodDescriptor,
        args: Vec<Value>,
    ) -> Result<Vec<Value>, HandlerError> {
        match method.name.as_str() {
            "submitEvidence" => {
                let submitter = address_arg(&args, 0, "submitter")?;
                let evidence = bytes_arg(&args, 1, "evidence")?;

                ctx.require_caller(caller, submitter)?;
                ctx.charge_write(evidence.len())?;
                let hash = ctx.store_mut()?.submit_evidence(submitter, evidence)?;
                ctx.emit(
                    &self.submitted,
                    vec![Value::Address(submitter), Value::Hash(hash)],
                )?;
                Ok(vec![Value::Hash(hash)])
            }
            "evidence" => {
                let hash = hash_arg(&args, 0, "evidenceHash")?;
                ctx.charge_read(hash.0.len())?;
                let evidence = ctx
                    .store()
                    .evidence(&hash)
                    .ok_or_else(|| HandlerError::Module(format!("evidence {hash} not found")))?;
                Ok(vec![Value::Bytes(evidence)])
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
    use crate::domain::services::keccak256;
    use crate::domain::value_objects::GasMeter;
    use crate::kernel::env::ExecutionEnv;

    fn method(handler: &EvidenceHandler, name: &str) -> MethodDescriptor {
        ModuleHandler::<InMemoryModuleStore>::methods(handler)
            .into_iter()
            .find(|m| m.name == name)
            .unwrap()
    }

    #[test]
    fn test_submit_and_query() {
        let handler = EvidenceHandler::new().unwrap();
        let config = BridgeConfig::default();
        let submitter = Address::new([3u8; 20]);
        let mut env = ExecutionEnv::new(
            InMemoryLedger::new(),
            InMemoryModuleStore::new(config.clone()),
            GasMeter::infinite(),
        );
        let mut ctx = HandlerContext::new(&mut env, Address::ZERO, false, &config);

        let out = handler
            .handle(
                &mut ctx,
                submitter,
                &method(&handler, "submitEvidence"),
                vec![Value::Address(submitter), Value::Bytes(b"equivocation".to_vec())],
            )
            .unwrap();
        let hash = keccak256(b"equivocation");
        assert_eq!(out, vec![Value::Hash(hash)]);

        let out = handler
            .handle(&mut ctx, submitter, &method(&handler, "evidence"), vec![Value::Hash(hash)])
            .unwrap();
        assert_eq!(out, vec![Value::Bytes(b"equivocation".to_vec())]);
    }

    #[test]
    fn test_missing_evidence() {
        let handler = EvidenceHandler::new().unwrap();
        let config = BridgeConfig::default();
        let mut env = ExecutionEnv::new(
            InMemoryLedger::new(),
            InMemoryModuleStore::new(config.clone()),
            GasMeter::infinite(),
        );
        let mut ctx = HandlerContext::new(&mut env, Address::ZERO, true, &config);
        let err = handler
            .handle(
                &mut ctx,
                Address::ZERO,
                &method(&handler, "evidence"),
                vec![Value::Hash(keccak256(b"nothing"))],
            )
            .unwrap_err();
        assert!(matches!(err, HandlerError::Module(_)));
    }
}
