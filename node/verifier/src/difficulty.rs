use num_bigint::BigUint;
use num_traits::Zero;

/// `2^256`, the modulus difficulty and target are defined against.
fn pow256() -> BigUint {
    BigUint::from(1u8) << 256u32
}

/// `target2diff(targetHex) = 2^256 / big-endian(targetHex)`.
///
/// Ported from `Target2diff` (arbitrary-precision, never a float division on a
/// 256-bit value).
pub fn target_to_difficulty(target_hex: &str) -> BigUint {
    let bytes = decode_hex(target_hex);
    let target = BigUint::from_bytes_be(&bytes);
    if target.is_zero() { BigUint::zero() } else { pow256() / target }
}

/// `diff2target(diff) = 2^256 / diff`, formatted as a `0x`-prefixed, zero-padded
/// 64-hex-character string.
pub fn difficulty_to_target(difficulty: &BigUint) -> String {
    if difficulty.is_zero() {
        return format!("0x{}", "0".repeat(64));
    }
    let target = pow256() / difficulty;
    let hex = target.to_str_radix(16);
    format!("0x{:0>64}", hex)
}

fn decode_hex(hex: &str) -> Vec<u8> {
    let cleaned = hex.strip_prefix("0x").unwrap_or(hex);
    let cleaned = if cleaned.len() % 2 == 1 { format!("0{cleaned}") } else { cleaned.to_owned() };
    (0..cleaned.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&cleaned[i..i + 2], 16).unwrap_or(0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_and_difficulty_round_trip_approximately() {
        let target = "0x0000000400000000000000000000000000000000000000000000000000000";
        // trim to 64 hex chars, as real targets are
        let target = &target[..66.min(target.len())];
        let diff = target_to_difficulty(target);
        assert!(!diff.is_zero());
        let back = difficulty_to_target(&diff);
        assert_eq!(back.len(), 66);
    }

    #[test]
    fn zero_target_yields_zero_difficulty() {
        assert!(target_to_difficulty("0x0").is_zero());
    }
}
