use crate::error::UpstreamError;

/// Ports `util.Hex2int64`/`Hex2uint64`: strips an optional `0x` prefix and parses base 16.
pub fn hex_to_u64(hex: &str) -> Result<u64, UpstreamError> {
    let cleaned = hex.strip_prefix("0x").unwrap_or(hex);
    let cleaned = if cleaned.is_empty() { "0" } else { cleaned };
    u64::from_str_radix(cleaned, 16).map_err(|_| UpstreamError::InvalidHex(hex.to_owned()))
}

pub fn hex_to_i128(hex: &str) -> Result<i128, UpstreamError> {
    let cleaned = hex.strip_prefix("0x").unwrap_or(hex);
    let cleaned = if cleaned.is_empty() { "0" } else { cleaned };
    i128::from_str_radix(cleaned, 16).map_err(|_| UpstreamError::InvalidHex(hex.to_owned()))
}

pub fn u64_to_hex(value: u64) -> String {
    format!("0x{value:x}")
}
