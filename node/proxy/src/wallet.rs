/// Validates `^0x[0-9a-fA-F]{40}$` and rejects the all-zeros address, matching
/// `util.IsValidHexAddress` plus spec.md §4.4's "not be all zeros" clause.
pub fn is_valid_wallet(address: &str) -> bool {
    let Some(digits) = address.strip_prefix("0x") else { return false };
    if digits.len() != 40 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return false;
    }
    !digits.chars().all(|c| c == '0')
}

/// The `worker` header value that signals an older client encoding `wallet.worker`
/// in `params[0]`, matching `stratum.go::HandleSubmitLogin`'s
/// `if worker == "eth1.0" { strings.Split(params[0], ".") }`.
const DOTTED_WORKER_HEADER: &str = "eth1.0";

/// Splits a `wallet.worker` login parameter into its two parts. Only splits on `.`
/// when the `worker` header names the older `eth1.0` client convention; otherwise
/// the header (if any) names the worker directly.
pub fn split_wallet_worker(param: &str, header_worker: Option<&str>) -> (String, String) {
    if header_worker == Some(DOTTED_WORKER_HEADER) {
        if let Some((wallet, worker)) = param.split_once('.') {
            return (wallet.to_owned(), worker.to_owned());
        }
    }
    let worker = header_worker.filter(|w| !w.is_empty()).unwrap_or("0").to_owned();
    (param.to_owned(), worker)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_address() {
        assert!(is_valid_wallet("0x000000000000000000000000000000000000dEaD"));
    }

    #[test]
    fn rejects_all_zero_address() {
        assert!(!is_valid_wallet(&format!("0x{}", "0".repeat(40))));
    }

    #[test]
    fn rejects_malformed_address() {
        assert!(!is_valid_wallet("not-a-hex"));
        assert!(!is_valid_wallet("0x1234"));
    }

    #[test]
    fn splits_dotted_wallet_worker_only_under_the_eth1_0_header() {
        assert_eq!(split_wallet_worker("0xabc.rig1", Some("eth1.0")), ("0xabc".to_owned(), "rig1".to_owned()));
    }

    #[test]
    fn leaves_dotted_param_untouched_without_the_eth1_0_header() {
        assert_eq!(split_wallet_worker("0xabc.rig1", None), ("0xabc.rig1".to_owned(), "0".to_owned()));
        assert_eq!(split_wallet_worker("0xabc.rig1", Some("rig2")), ("0xabc.rig1".to_owned(), "rig2".to_owned()));
    }

    #[test]
    fn falls_back_to_header_worker_then_zero() {
        assert_eq!(split_wallet_worker("0xabc", Some("rig2")), ("0xabc".to_owned(), "rig2".to_owned()));
        assert_eq!(split_wallet_worker("0xabc", None), ("0xabc".to_owned(), "0".to_owned()));
    }
}
