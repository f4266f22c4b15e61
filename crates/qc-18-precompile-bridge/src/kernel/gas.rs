//! # Precompile Gas Schedule
//!
//! Key-value storage costs used both for the interpreter's base charge
//! (`required_gas`) and for per-access metering inside handlers.
//!
//! Mutating ("transaction") methods are priced on the write schedule,
//! queries on the read schedule.

use crate::config::KvGasConfig;

/// Gas meter descriptors.
pub mod descriptors {
    /// Key-value read.
    pub const READ: &str = "ReadPerByte";
    /// Key-value write.
    pub const WRITE: &str = "WritePerByte";
}

/// Cost of reading `len` bytes.
#[must_use]
pub fn kv_read_cost(gas: &KvGasConfig, len: usize) -> u64 {
    gas.read_cost_flat
        .saturating_add(gas.read_cost_per_byte.saturating_mul(len as u64))
}

/// Cost of writing `len` bytes.
#[must_use]
pub fn kv_write_cost(gas: &KvGasConfig, len: usize) -> u64 {
    gas.write_cost_flat
        .saturating_add(gas.write_cost_per_byte.saturating_mul(len as u64))
}

/// Base charge for a resolved call.
///
/// `args_len` excludes the selector.
#[must_use]
pub fn base_cost(gas: &KvGasConfig, is_mutating: bool, args_len: usize) -> u64 {
    if is_mutating {
        kv_write_cost(gas, args_len)
    } else {
        kv_read_cost(gas, args_len)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule() {
        let gas = KvGasConfig::default();
        assert_eq!(kv_read_cost(&gas, 0), 1000);
        assert_eq!(kv_read_cost(&gas, 32), 1000 + 3 * 32);
        assert_eq!(kv_write_cost(&gas, 0), 2000);
        assert_eq!(kv_write_cost(&gas, 64), 2000 + 30 * 64);
    }

    #[test]
    fn test_base_cost_selects_schedule() {
        let gas = KvGasConfig::default();
        assert_eq!(base_cost(&gas, true, 10), kv_write_cost(&gas, 10));
        assert_eq!(base_cost(&gas, false, 10), kv_read_cost(&gas, 10));
    }

    #[test]
    fn test_saturates() {
        let gas = KvGasConfig {
            write_cost_per_byte: u64::MAX,
            ..KvGasConfig::default()
        };
        assert_eq!(kv_write_cost(&gas, 2), u64::MAX);
    }
}
