//! # Domain Services
//!
//! Pure helper functions shared by the encoder, the interceptor and the
//! module handlers. These functions are deterministic and have no side
//! effects.

use crate::config::{is_valid_denom, BridgeConfig};
use crate::domain::value_objects::{Address, Coin, DecCoin, Hash, U256};
use crate::errors::InterceptError;
use bech32::{Bech32, Hrp};
use sha3::{Digest, Keccak256};

// =============================================================================
// HASHING
// =============================================================================

/// Computes Keccak-256 hash of input data.
#[must_use]
pub fn keccak256(data: &[u8]) -> Hash {
    let hash = Keccak256::digest(data);
    let mut result = [0u8; 32];
    result.copy_from_slice(&hash);
    Hash::new(result)
}

/// First four bytes of the Keccak-256 of a canonical signature.
#[must_use]
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    let mut out = [0u8; 4];
    out.copy_from_slice(&hash.0[..4]);
    out
}

// =============================================================================
// ADDRESS CODECS
// =============================================================================

/// Parses a module-side address attribute.
///
/// Accepts bech32 with the configured prefix, or `0x`-prefixed hex.
pub fn parse_address(value: &str, config: &BridgeConfig) -> Result<Address, InterceptError> {
    let invalid = |reason: String| InterceptError::InvalidAddress {
        value: value.to_string(),
        reason,
    };

    if let Some(hex_part) = value.strip_prefix("0x") {
        let raw = hex::decode(hex_part).map_err(|e| invalid(e.to_string()))?;
        return Address::from_slice(&raw)
            .ok_or_else(|| invalid(format!("expected 20 bytes, got {}", raw.len())));
    }

    let (hrp, data) = bech32::decode(value).map_err(|e| invalid(e.to_string()))?;
    if !hrp.as_str().eq_ignore_ascii_case(&config.bech32_prefix) {
        return Err(invalid(format!(
            "prefix {} does not match {}",
            hrp.as_str(),
            config.bech32_prefix
        )));
    }
    Address::from_slice(&data)
        .ok_or_else(|| invalid(format!("expected 20 bytes, got {}", data.len())))
}

/// Renders an address in the configured bech32 form.
pub fn to_bech32(address: &Address, config: &BridgeConfig) -> Result<String, InterceptError> {
    let invalid = |reason: String| InterceptError::InvalidAddress {
        value: address.to_hex(),
        reason,
    };
    let hrp = Hrp::parse(&config.bech32_prefix).map_err(|e| invalid(e.to_string()))?;
    bech32::encode::<Bech32>(hrp, address.as_bytes()).map_err(|e| invalid(e.to_string()))
}

// =============================================================================
// COIN PARSING
// =============================================================================

/// Most fractional digits a decimal coin amount may carry.
pub const MAX_DEC_PRECISION: u8 = 18;

/// Parses a comma-separated coin list such as `5uqc,3stake`, truncating
/// decimal amounts to integers.
///
/// An empty string is an empty set.
pub fn parse_coins(value: &str) -> Result<Vec<Coin>, InterceptError> {
    Ok(parse_dec_coins(value)?.iter().map(DecCoin::truncate).collect())
}

/// Parses a comma-separated decimal coin list such as `1.5uqc,3stake`.
pub fn parse_dec_coins(value: &str) -> Result<Vec<DecCoin>, InterceptError> {
    let invalid = |reason: String| InterceptError::InvalidAmount {
        value: value.to_string(),
        reason,
    };

    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    trimmed
        .split(',')
        .map(|part| {
            let part = part.trim();
            let split = part
                .find(|c: char| !c.is_ascii_digit() && c != '.')
                .ok_or_else(|| invalid(format!("coin {part:?} has no denom")))?;
            let (number, denom) = part.split_at(split);
            let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));

            if whole.is_empty() && fraction.is_empty() {
                return Err(invalid(format!("coin {part:?} has no amount")));
            }
            if number.ends_with('.') || fraction.contains('.') {
                return Err(invalid(format!("malformed decimal {number:?}")));
            }
            let precision = u8::try_from(fraction.len())
                .ok()
                .filter(|p| *p <= MAX_DEC_PRECISION)
                .ok_or_else(|| invalid(format!("more than {MAX_DEC_PRECISION} decimal places")))?;
            if !is_valid_denom(denom) {
                return Err(invalid(format!("invalid denom {denom:?}")));
            }

            let amount = U256::from_dec_str(&format!("{whole}{fraction}"))
                .map_err(|e| invalid(format!("{e:?}")))?;
            Ok(DecCoin {
                denom: denom.to_string(),
                amount,
                precision,
            })
        })
        .collect()
}

/// Sum of the coins of one denomination. Absent denominations are zero.
pub fn amount_of(coins: &[Coin], denom: &str) -> Result<U256, InterceptError> {
    coins
        .iter()
        .filter(|coin| coin.denom == denom)
        .try_fold(U256::zero(), |acc, coin| {
            acc.checked_add(coin.amount)
                .ok_or(InterceptError::AmountOverflow(coin.amount))
        })
}

/// Converts a module amount of the designated denom to EVM ledger units.
pub fn to_evm_amount(amount: U256, config: &BridgeConfig) -> Result<U256, InterceptError> {
    amount
        .checked_mul(config.conversion_factor())
        .ok_or(InterceptError::AmountOverflow(amount))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keccak256_empty() {
        let hash = keccak256(&[]);
        assert_eq!(
            hex::encode(hash.0),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_selector_transfer() {
        assert_eq!(selector("transfer(address,uint256)"), [0xa9, 0x05, 0x9c, 0xbb]);
    }

    #[test]
    fn test_bech32_roundtrip() {
        let config = BridgeConfig::default();
        let address = Address::new([7u8; 20]);
        let encoded = to_bech32(&address, &config).unwrap();
        assert!(encoded.starts_with("qc1"));
        assert_eq!(parse_address(&encoded, &config).unwrap(), address);
    }

    #[test]
    fn test_parse_address_hex() {
        let config = BridgeConfig::default();
        let parsed =
            parse_address("0x0101010101010101010101010101010101010101", &config).unwrap();
        assert_eq!(parsed, Address::new([1u8; 20]));
    }

    #[test]
    fn test_parse_address_wrong_prefix() {
        let config = BridgeConfig::default();
        let other = BridgeConfig {
            bech32_prefix: "cosmos".to_string(),
            ..BridgeConfig::default()
        };
        let encoded = to_bech32(&Address::new([2u8; 20]), &other).unwrap();
        let err = parse_address(&encoded, &config).unwrap_err();
        assert!(matches!(err, InterceptError::InvalidAddress { .. }));
    }

    #[test]
    fn test_parse_address_garbage() {
        let config = BridgeConfig::default();
        assert!(parse_address("not-an-address", &config).is_err());
        assert!(parse_address("0xzz", &config).is_err());
        assert!(parse_address("0x0102", &config).is_err());
    }

    #[test]
    fn test_parse_coins() {
        let coins = parse_coins("5uqc,3stake").unwrap();
        assert_eq!(coins, vec![Coin::new("uqc", 5u64), Coin::new("stake", 3u64)]);
        assert!(parse_coins("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_coins_rejects_malformed() {
        assert!(parse_coins("uqc").is_err());
        assert!(parse_coins("5").is_err());
        assert!(parse_coins("5u").is_err());
    }

    #[test]
    fn test_parse_coins_truncates_decimals() {
        let coins = parse_coins("1.500000uqc,0.25stake,.5atom").unwrap();
        assert_eq!(
            coins,
            vec![
                Coin::new("uqc", 1u64),
                Coin::new("stake", 0u64),
                Coin::new("atom", 0u64)
            ]
        );
    }

    #[test]
    fn test_parse_dec_coins_keeps_precision() {
        let coins = parse_dec_coins("2.75uqc").unwrap();
        assert_eq!(coins[0].amount, U256::from(275u64));
        assert_eq!(coins[0].precision, 2);
        assert_eq!(coins[0].truncate(), Coin::new("uqc", 2u64));
    }

    #[test]
    fn test_parse_dec_coins_rejects_malformed() {
        assert!(parse_dec_coins("1.uqc").is_err());
        assert!(parse_dec_coins("1.2.3uqc").is_err());
        assert!(parse_dec_coins(".uqc").is_err());
        assert!(parse_dec_coins("0.0000000000000000001uqc").is_err());
    }

    #[test]
    fn test_amount_of_absent_is_zero() {
        let coins = parse_coins("3stake").unwrap();
        assert_eq!(amount_of(&coins, "uqc").unwrap(), U256::zero());
    }

    #[test]
    fn test_to_evm_amount_scales() {
        let config = BridgeConfig::default();
        assert_eq!(
            to_evm_amount(U256::from(5u64), &config).unwrap(),
            U256::from(5u64) * U256::exp10(12)
        );
        assert!(to_evm_amount(U256::MAX, &config).is_err());
    }
}
