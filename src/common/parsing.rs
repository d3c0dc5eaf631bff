// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use alloy::primitives::B256;
use alloy::primitives::utils::parse_units;

pub fn strip_0x(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

pub fn parse_hex_bytes(s: &str) -> Option<Vec<u8>> {
    hex::decode(strip_0x(s)).ok()
}

pub fn parse_b256_hex(s: &str) -> Option<B256> {
    let bytes = parse_hex_bytes(s)?;
    if bytes.len() != 32 {
        return None;
    }
    Some(B256::from_slice(&bytes))
}

/// Decimal gwei amount (e.g. `"0.01"`, `"25"`) to wei.
pub fn parse_gwei(raw: &str) -> Option<u128> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with('-') {
        return None;
    }
    let wei = parse_units(trimmed, "gwei").ok()?.get_absolute();
    u128::try_from(wei).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_parsers_accept_lower_and_upper_prefixes() {
        assert_eq!(parse_hex_bytes("0Xabcd"), Some(vec![0xab, 0xcd]));
        assert_eq!(parse_hex_bytes("abcd"), Some(vec![0xab, 0xcd]));
        let key = format!("0x{}", "11".repeat(32));
        assert_eq!(parse_b256_hex(&key), Some(B256::from([0x11; 32])));
        assert_eq!(parse_b256_hex(&"11".repeat(31)), None);
    }

    #[test]
    fn gwei_amounts_convert_to_wei() {
        assert_eq!(parse_gwei("0.01"), Some(10_000_000));
        assert_eq!(parse_gwei("25"), Some(25_000_000_000));
        assert_eq!(parse_gwei(" 1.5 "), Some(1_500_000_000));
        assert_eq!(parse_gwei(""), None);
        assert_eq!(parse_gwei("-1"), None);
        assert_eq!(parse_gwei("abc"), None);
    }
}
