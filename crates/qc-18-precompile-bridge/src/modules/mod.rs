//! # Module Handlers
//!
//! Thin translators from decoded precompile calls to keeper operations.
//! Each handler checks who is acting, meters its storage accesses, calls
//! its keeper and emits an event log on success.
//!
//! | Module | Address | Mutating methods |
//! |--------|---------|------------------|
//! | bank | `0x…0804` | `send` |
//! | gov | `0x…0805` | `vote` |
//! | slashing | `0x…0806` | `unjail` |
//! | evidence | `0x…0807` | `submitEvidence` |

pub mod bank;
pub mod evidence;
pub mod gov;
pub mod slashing;

pub use bank::BankHandler;
pub use evidence::EvidenceHandler;
pub use gov::GovHandler;
pub use slashing::SlashingHandler;

use crate::abi::word::Value;
use crate::config::BridgeConfig;
use crate::domain::value_objects::{Address, Hash, U256};
use crate::errors::{AbiError, HandlerError};
use crate::kernel::registry::PrecompileSet;
use crate::kernel::runner::PrecompileKernel;
use crate::ports::outbound::{BankKeeper, EvidenceKeeper, GovKeeper, ModuleStore, SlashingKeeper};
use std::sync::Arc;

/// Well-known precompile addresses.
pub mod addresses {
    use crate::domain::value_objects::Address;

    const fn precompile(low: u16) -> Address {
        let mut bytes = [0u8; 20];
        bytes[18] = (low >> 8) as u8;
        bytes[19] = (low & 0xff) as u8;
        Address::new(bytes)
    }

    /// Bank precompile.
    pub const BANK: Address = precompile(0x0804);
    /// Governance precompile.
    pub const GOV: Address = precompile(0x0805);
    /// Slashing precompile.
    pub const SLASHING: Address = precompile(0x0806);
    /// Evidence precompile.
    pub const EVIDENCE: Address = precompile(0x0807);
}

/// Builds the four module precompiles at their well-known addresses.
pub fn install_all<M>(config: &BridgeConfig) -> Result<PrecompileSet<M>, AbiError>
where
    M: ModuleStore + BankKeeper + GovKeeper + SlashingKeeper + EvidenceKeeper + 'static,
{
    let mut set = PrecompileSet::new();
    set.register(Arc::new(PrecompileKernel::new(
        addresses::BANK,
        config.clone(),
        BankHandler::new()?,
    )));
    set.register(Arc::new(PrecompileKernel::new(
        addresses::GOV,
        config.clone(),
        GovHandler::new()?,
    )));
    set.register(Arc::new(PrecompileKernel::new(
        addresses::SLASHING,
        config.clone(),
        SlashingHandler::new()?,
    )));
    set.register(Arc::new(PrecompileKernel::new(
        addresses::EVIDENCE,
        config.clone(),
        EvidenceHandler::new()?,
    )));
    Ok(set)
}

// =============================================================================
// ARGUMENT ACCESS
// =============================================================================

fn arg<'a>(args: &'a [Value], index: usize, name: &str) -> Result<&'a Value, HandlerError> {
    args.get(index)
        .ok_or_else(|| HandlerError::Argument(format!("missing argument {name}")))
}

fn mismatch(name: &str, expected: &str, actual: &Value) -> HandlerError {
    HandlerError::Argument(format!(
        "argument {name}: expected {expected}, got {}",
        actual.kind_name()
    ))
}

pub(crate) fn address_arg(args: &[Value], index: usize, name: &str) -> Result<Address, HandlerError> {
    match arg(args, index, name)? {
        Value::Address(address) => Ok(*address),
        other => Err(mismatch(name, "address", other)),
    }
}

pub(crate) fn u256_arg(args: &[Value], index: usize, name: &str) -> Result<U256, HandlerError> {
    let value = arg(args, index, name)?;
    value
        .as_u256()
        .ok_or_else(|| mismatch(name, "unsigned integer", value))
}

pub(crate) fn u64_arg(args: &[Value], index: usize, name: &str) -> Result<u64, HandlerError> {
    match arg(args, index, name)? {
        Value::Uint64(v) => Ok(*v),
        other => Err(mismatch(name, "uint64", other)),
    }
}

pub(crate) fn u8_arg(args: &[Value], index: usize, name: &str) -> Result<u8, HandlerError> {
    match arg(args, index, name)? {
        Value::Uint8(v) => Ok(*v),
        other => Err(mismatch(name, "uint8", other)),
    }
}

pub(crate) fn string_arg<'a>(
    args: &'a [Value],
    index: usize,
    name: &str,
) -> Result<&'a str, HandlerError> {
    match arg(args, index, name)? {
        Value::String(s) => Ok(s),
        other => Err(mismatch(name, "string", other)),
    }
}

pub(crate) fn bytes_arg<'a>(
    args: &'a [Value],
    index: usize,
    name: &str,
) -> Result<&'a [u8], HandlerError> {
    match arg(args, index, name)? {
        Value::Bytes(b) => Ok(b),
        other => Err(mismatch(name, "bytes", other)),
    }
}

pub(crate) fn hash_arg(args: &[Value], index: usize, name: &str) -> Result<Hash, HandlerError> {
    match arg(args, index, name)? {
        Value::Hash(h) => Ok(*h),
        other => Err(mismatch(name, "bytes32", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryModuleStore;

    #[test]
    fn test_addresses() {
        assert_eq!(
            addresses::BANK.to_hex(),
            "0x0000000000000000000000000000000000000804"
        );
        assert_eq!(addresses::EVIDENCE.as_bytes()[19], 0x07);
    }

    #[test]
    fn test_install_all() {
        let set = install_all::<InMemoryModuleStore>(&BridgeConfig::default()).unwrap();
        assert_eq!(set.addresses().count(), 4);
        assert!(set.is_precompile(&addresses::GOV));
        assert!(!set.is_precompile(&Address::ZERO));
    }

    #[test]
    fn test_argument_helpers() {
        let args = vec![Value::Uint64(5), Value::String("x".into())];
        assert_eq!(u64_arg(&args, 0, "a").unwrap(), 5);
        assert_eq!(string_arg(&args, 1, "b").unwrap(), "x");
        assert!(matches!(
            address_arg(&args, 0, "a"),
            Err(HandlerError::Argument(_))
        ));
        assert!(u8_arg(&args, 2, "c").is_err());
    }
}
