//! Small helpers shared by the contract layer, the adapters and the tools.

use std::str::FromStr;

use ethers::types::{Address, U256};
use ethers::utils::{parse_units, to_checksum};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref EVM_ADDRESS: Regex = Regex::new(r"^0x[a-fA-F0-9]{40}$").unwrap();
}

/// `true` for a 0x-prefixed, 40 hex character address (any casing).
pub fn is_evm_address(s: &str) -> bool {
    EVM_ADDRESS.is_match(s)
}

/// Parses an address and renders it in EIP-55 checksum form.
pub fn checksum_address(s: &str) -> Option<String> {
    if !is_evm_address(s) {
        return None;
    }
    Address::from_str(s).ok().map(|a| to_checksum(&a, None))
}

/// Converts a human decimal amount (e.g. "1.5") into base units.
pub fn to_base_units(amount: &str, decimals: u32) -> Option<U256> {
    parse_units(amount.trim(), decimals).ok().map(Into::into)
}

/// Reads a numeric field that providers send either as a JSON number or a
/// string, returning `None` for anything else.
pub fn lenient_f64(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn address_pattern() {
        assert!(is_evm_address("0x0000000000000000000000000000000000000000"));
        assert!(is_evm_address("0xAbCdEf0123456789abcdef0123456789ABCDEF01"));
        assert!(!is_evm_address("0x123"));
        assert!(!is_evm_address("0000000000000000000000000000000000000000"));
        assert!(!is_evm_address("0xZZ00000000000000000000000000000000000000"));
    }

    #[test]
    fn checksums_lowercase_input() {
        assert_eq!(
            checksum_address("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed").as_deref(),
            Some("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed")
        );
        assert_eq!(checksum_address("not-an-address"), None);
    }

    #[test]
    fn unit_conversion() {
        let wei = to_base_units("1.5", 18).unwrap();
        assert_eq!(wei, U256::from(1_500_000_000_000_000_000u128));
        assert_eq!(to_base_units("2", 6), Some(U256::from(2_000_000u64)));
        assert_eq!(to_base_units("abc", 18), None);
    }

    #[test]
    fn lenient_numbers() {
        assert_eq!(lenient_f64(&json!("12.5")), Some(12.5));
        assert_eq!(lenient_f64(&json!(3)), Some(3.0));
        assert_eq!(lenient_f64(&json!(null)), None);
    }
}
