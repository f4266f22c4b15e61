//! # Bridge Configuration
//!
//! Immutable settings threaded through every kernel, interceptor and encoder
//! entry point. Nothing in the crate reads process-wide state after the
//! configuration has been built.

use crate::domain::value_objects::U256;
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Number of fractional digits on the EVM side of the bridge.
pub const EVM_DECIMALS: u8 = 18;

/// Key-value store gas schedule.
///
/// Mirrors the storage-metering costs of the module layer so that a
/// precompile's base charge tracks what its keeper calls will spend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KvGasConfig {
    /// Flat cost of a read.
    pub read_cost_flat: u64,
    /// Cost per byte read.
    pub read_cost_per_byte: u64,
    /// Flat cost of a write.
    pub write_cost_flat: u64,
    /// Cost per byte written.
    pub write_cost_per_byte: u64,
}

impl Default for KvGasConfig {
    fn default() -> Self {
        Self {
            read_cost_flat: 1000,
            read_cost_per_byte: 3,
            write_cost_flat: 2000,
            write_cost_per_byte: 30,
        }
    }
}

/// Precompile bridge configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Module denomination mirrored onto the EVM balance ledger.
    pub evm_denom: String,
    /// Fractional digits of `evm_denom` on the module ledger.
    pub module_decimals: u8,
    /// Human-readable part of module bech32 addresses.
    pub bech32_prefix: String,
    /// Storage gas schedule.
    pub gas: KvGasConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            evm_denom: "uqc".to_string(),
            module_decimals: 6,
            bech32_prefix: "qc".to_string(),
            gas: KvGasConfig::default(),
        }
    }
}

impl BridgeConfig {
    /// Parses and validates a JSON document. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by `QC_PRECOMPILE_*` environment variables.
    ///
    /// Unparseable numeric values are ignored with a warning.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(denom) = std::env::var("QC_PRECOMPILE_EVM_DENOM") {
            config.evm_denom = denom;
        }
        if let Ok(prefix) = std::env::var("QC_PRECOMPILE_BECH32_PREFIX") {
            config.bech32_prefix = prefix;
        }
        if let Ok(val) = std::env::var("QC_PRECOMPILE_MODULE_DECIMALS") {
            match val.parse() {
                Ok(decimals) => config.module_decimals = decimals,
                Err(_) => warn!(value = %val, "Ignoring invalid QC_PRECOMPILE_MODULE_DECIMALS"),
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks denom syntax, decimal range and prefix shape.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_denom(&self.evm_denom) {
            return Err(ConfigError::InvalidDenom(self.evm_denom.clone()));
        }
        if self.module_decimals > EVM_DECIMALS {
            return Err(ConfigError::InvalidDecimals(self.module_decimals));
        }
        let prefix_ok = !self.bech32_prefix.is_empty()
            && self
                .bech32_prefix
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
        if !prefix_ok {
            return Err(ConfigError::InvalidPrefix(self.bech32_prefix.clone()));
        }
        Ok(())
    }

    /// Multiplier from module units of `evm_denom` to EVM ledger units.
    #[must_use]
    pub fn conversion_factor(&self) -> U256 {
        U256::exp10(usize::from(EVM_DECIMALS.saturating_sub(self.module_decimals)))
    }
}

/// Coin denomination syntax: a letter followed by 2-127 of
/// `[a-zA-Z0-9/:._-]`.
#[must_use]
pub fn is_valid_denom(denom: &str) -> bool {
    let bytes = denom.as_bytes();
    if !(3..=128).contains(&bytes.len()) || !bytes[0].is_ascii_alphabetic() {
        return false;
    }
    bytes[1..]
        .iter()
        .all(|&b| b.is_ascii_alphanumeric() || matches!(b, b'/' | b':' | b'.' | b'_' | b'-'))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = BridgeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.conversion_factor(), U256::exp10(12));
    }

    #[test]
    fn test_eighteen_decimals_is_identity() {
        let config = BridgeConfig {
            module_decimals: 18,
            ..BridgeConfig::default()
        };
        assert_eq!(config.conversion_factor(), U256::one());
    }

    #[test]
    fn test_from_json_partial() {
        let config = BridgeConfig::from_json_str(r#"{"evm_denom":"aqc","module_decimals":18}"#)
            .unwrap();
        assert_eq!(config.evm_denom, "aqc");
        assert_eq!(config.bech32_prefix, "qc");
        assert_eq!(config.gas, KvGasConfig::default());
    }

    #[test]
    fn test_from_json_rejects_bad_decimals() {
        let err = BridgeConfig::from_json_str(r#"{"module_decimals":19}"#).unwrap_err();
        assert_eq!(err, ConfigError::InvalidDecimals(19));
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(
            BridgeConfig::from_json_str("not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_denom_syntax() {
        assert!(is_valid_denom("uqc"));
        assert!(is_valid_denom("ibc/ABC123"));
        assert!(!is_valid_denom("1qc"));
        assert!(!is_valid_denom("ab"));
        assert!(!is_valid_denom("bad denom"));
    }

    #[test]
    fn test_prefix_must_be_lowercase() {
        let config = BridgeConfig {
            bech32_prefix: "QC".to_string(),
            ..BridgeConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidPrefix(_))));
    }
}
