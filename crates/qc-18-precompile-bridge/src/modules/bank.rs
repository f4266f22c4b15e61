//! # Bank Precompile
//!
//! Balance queries and coin transfers. Transfers move module coins; the
//! resulting `coin_spent` / `coin_received` notifications are replayed onto
//! the EVM ledger by the kernel.

use crate::abi::topics::EventDescriptor;
use crate::abi::word::{BigInt, Value};
use crate::config::is_valid_denom;
use crate::domain::value_objects::{Address, Coin};
use crate::errors::{AbiError, HandlerError};
use crate::kernel::env::HandlerContext;
use crate::kernel::method::MethodDescriptor;
use crate::modules::{address_arg, string_arg, u256_arg};
use crate::ports::outbound::{BankKeeper, ModuleHandler, ModuleStore};

/// Bank module handler.
pub struct BankHandler {
    methods: Vec<MethodDescriptor>,
    transfer: EventDescriptor,
}

impl BankHandler {
    /// Declares the bank methods and events.
    pub fn new() -> Result<Self, AbiError> {
        Ok(Self {
            methods: vec![
                MethodDescriptor::new("balances", &["address"], &["(string,uint256)[]"])?,
                MethodDescriptor::new("supplyOf", &["string"], &["uint256"])?,
                MethodDescriptor::new(
                    "send",
                    &["address", "address", "string", "uint256"],
                    &["bool"],
                )?,
            ],
            transfer: EventDescriptor::new(
                "Transfer",
                &[
                    ("address", true),
                    ("address", true),
                    ("string", false),
                    ("uint256", false),
                ],
            )?,
        })
    }

    fn balances<M: ModuleStore + BankKeeper>(
        ctx: &mut HandlerContext<'_, M>,
        args: &[Value],
    ) -> Result<Vec<Value>, HandlerError> {
        let account = address_arg(args, 0, "account")?;
        ctx.charge_read(Address::LEN)?;
        let coins = ctx
            .store()
            .all_balances(&account)
            .into_iter()
            .map(|coin| {
                Value::Tuple(vec![
                    Value::String(coin.denom),
                    Value::BigInt(BigInt::from_u256(coin.amount)),
                ])
            })
            .collect();
        Ok(vec![Value::Array(coins)])
    }

    fn supply_of<M: ModuleStore + BankKeeper>(
        ctx: &mut HandlerContext<'_, M>,
        args: &[Value],
    ) -> Result<Vec<Value>, HandlerError> {
        let denom = string_arg(args, 0, "denom")?;
        ctx.charge_read(denom.len())?;
        let supply = ctx.store().supply_of(denom);
        Ok(vec![Value::BigInt(BigInt::from_u256(supply))])
    }

    fn send<M: ModuleStore + BankKeeper>(
        &self,
        ctx: &mut HandlerContext<'_, M>,
        caller: Address,
        args: &[Value],
    ) -> Result<Vec<Value>, HandlerError> {
        let from = address_arg(args, 0, "from")?;
        let to = address_arg(args, 1, "to")?;
        let denom = string_arg(args, 2, "denom")?;
        let amount = u256_arg(args, 3, "amount")?;

        ctx.require_caller(caller, from)?;
        if !is_valid_denom(denom) {
            return Err(HandlerError::Argument(format!("invalid denom {denom:?}")));
        }
        if amount.is_zero() {
            return Err(HandlerError::Argument("amount must be positive".to_string()));
        }

        // Sender and recipient balance keys.
        let key_len = Address::LEN + denom.len();
        ctx.charge_write(key_len)?;
        ctx.charge_write(key_len)?;
        ctx.store_mut()?
            .send_coins(from, to, &[Coin::new(denom, amount)])?;

        ctx.emit(
            &self.transfer,
            vec![
                Value::Address(from),
                Value::Address(to),
                Value::String(denom.to_string()),
                Value::BigInt(BigInt::from_u256(amount)),
            ],
        )?;
        Ok(vec![Value::Bool(true)])
    }
}

impl<M: ModuleStore + BankKeeper> ModuleHandler<M> for BankHandler {
    fn methods(&self) -> Vec<MethodDescriptor> {
        self.methods.clone()
    }

    fn is_mutating(&self, method: &str) -> bool {
        method == "send"
    }

    fn handle(
        &self,
        ctx: &mut HandlerContext<'_, M>,
        caller: Address,
        method: &MethodDescriptor,
        args: Vec<Value>,
    ) -> Result<Vec<Value>, HandlerError> {
        match method.name.as_str() {
            "balances" => Self::balances(ctx, &args),
            "supplyOf" => Self::supply_of(ctx, &args),
            "send" => self.send(ctx, caller, &args),
            other => Err(HandlerError::Module(format!("unknown method {other}"))),
        }
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
    use crate::domain::value_objects::{GasMeter, U256};
    use crate::kernel::env::ExecutionEnv;

    fn addr(n: u8) -> Address {
        Address::new([n; 20])
    }

    fn env() -> ExecutionEnv<InMemoryModuleStore> {
        let mut store = InMemoryModuleStore::new(BridgeConfig::default());
        store.set_balance(addr(1), Coin::new("uqc", 10u64));
        store.set_balance(addr(1), Coin::new("stake", 2u64));
        ExecutionEnv::new(InMemoryLedger::new(), store, GasMeter::infinite())
    }

    fn method(handler: &BankHandler, name: &str) -> MethodDescriptor {
        ModuleHandler::<InMemoryModuleStore>::methods(handler)
            .into_iter()
            .find(|m| m.name == name)
            .unwrap()
    }

    #[test]
    fn test_balances_sorted() {
        let handler = BankHandler::new().unwrap();
        let config = BridgeConfig::default();
        let mut env = env();
        let mut ctx = HandlerContext::new(&mut env, addr(9), true, &config);

        let out = handler
            .handle(&mut ctx, addr(1), &method(&handler, "balances"), vec![Value::Address(addr(1))])
            .unwrap();

        assert_eq!(
            out,
            vec![Value::Array(vec![
                Value::Tuple(vec![
                    Value::String("stake".into()),
                    Value::BigInt(BigInt::from_u256(U256::from(2)))
                ]),
                Value::Tuple(vec![
                    Value::String("uqc".into()),
                    Value::BigInt(BigInt::from_u256(U256::from(10)))
                ]),
            ])]
        );
    }

    #[test]
    fn test_send_requires_owner() {
        let handler = BankHandler::new().unwrap();
        let config = BridgeConfig::default();
        let mut env = env();
        let mut ctx = HandlerContext::new(&mut env, addr(9), false, &config);

        let args = vec![
            Value::Address(addr(1)),
            Value::Address(addr(2)),
            Value::String("uqc".into()),
            Value::BigInt(BigInt::from_u256(U256::from(3))),
        ];
        let err = handler
            .handle(&mut ctx, addr(2), &method(&handler, "send"), args)
            .unwrap_err();
        assert!(matches!(err, HandlerError::Unauthorized { .. }));
    }

    #[test]
    fn test_send_moves_coins_and_emits() {
        let handler = BankHandler::new().unwrap();
        let config = BridgeConfig::default();
        let mut env = env();
        {
            let mut ctx = HandlerContext::new(&mut env, addr(9), false, &config);
            let args = vec![
                Value::Address(addr(1)),
                Value::Address(addr(2)),
                Value::String("uqc".into()),
                Value::BigInt(BigInt::from_u256(U256::from(3))),
            ];
            let out = handler
                .handle(&mut ctx, addr(1), &method(&handler, "send"), args)
                .unwrap();
            assert_eq!(out, vec![Value::Bool(true)]);
        }

        assert_eq!(BankKeeper::balance(&env.module, &addr(2), "uqc"), U256::from(3));
        assert_eq!(env.logs.len(), 1);
        assert_eq!(env.logs[0].topics.len(), 3);
        assert_eq!(env.logs[0].address, addr(9));
    }

    #[test]
    fn test_send_zero_rejected() {
        let handler = BankHandler::new().unwrap();
        let config = BridgeConfig::default();
        let mut env = env();
        let mut ctx = HandlerContext::new(&mut env, addr(9), false, &config);
        let args = vec![
            Value::Address(addr(1)),
            Value::Address(addr(2)),
            Value::String("uqc".into()),
            Value::BigInt(BigInt::from_u256(U256::zero())),
        ];
        assert!(matches!(
            handler.handle(&mut ctx, addr(1), &method(&handler, "send"), args),
            Err(HandlerError::Argument(_))
        ));
    }
}
