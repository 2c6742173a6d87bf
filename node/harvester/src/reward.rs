//! Era reward table and per-candidate reward arithmetic, ported from
//! `original_source/core/harvester.go`'s reward constants and `getConstReward`/
//! `getUncleReward` helpers.

use poolproxy_node_upstream::{hex_to_i128, hex_to_u64, Block, ChainConfig, UpstreamClient};

use num_bigint::BigInt;
use num_traits::ToPrimitive;

const WEI_PER_ETHER: i128 = 1_000_000_000_000_000_000;

#[derive(Debug, thiserror::Error)]
pub enum HarvesterConfigError {
    #[error("poolFeeAddress is not a valid hex address: {0}")]
    InvalidPoolFeeAddress(String),
    #[error("depth must be at least 32 blocks, got {0}")]
    DepthTooShallow(u64),
    #[error("immatureDepth must be at least 16 blocks, got {0}")]
    ImmatureDepthTooShallow(u64),
}

/// Static per-era block subsidy in wei, keyed by the height the reward was earned at.
pub fn era_reward(height: u64, chain_config: ChainConfig) -> BigInt {
    let ether = BigInt::from(WEI_PER_ETHER);
    if height < chain_config.byzantium_block {
        ether * 5
    } else if height < chain_config.constantinople_block {
        ether * 3
    } else {
        ether * 2
    }
}

/// Canonical-block reward: static era reward, plus Σ(gasUsed·gasPrice) over the block's
/// transactions minus gasUsed·baseFeePerGas (the EIP-1559 burn, zero pre-London), plus a
/// 1/32 bonus per included uncle. The gas-fee term can be negative on a heavily-EIP-1559
/// block, so this stays in signed `BigInt` until persistence.
pub async fn calculate_block_reward(upstream: &UpstreamClient, block: &Block, chain_config: ChainConfig) -> BigInt {
    let height = hex_to_u64(&block.number).unwrap_or(0);
    let mut reward = era_reward(height, chain_config);

    let gas_used = hex_to_i128(&block.gas_used).unwrap_or(0);
    let base_fee = block.base_fee_per_gas.as_deref().and_then(|hex| hex_to_i128(hex).ok()).unwrap_or(0);

    let mut gas_fee_income: i128 = 0;
    for transaction in &block.transactions {
        let Ok(receipt) = upstream.get_transaction_receipt(&transaction.hash).await else { continue };
        let tx_gas_used = hex_to_i128(&receipt.gas_used).unwrap_or(0);
        let gas_price = transaction.gas_price.as_deref().and_then(|hex| hex_to_i128(hex).ok()).unwrap_or(0);
        gas_fee_income += tx_gas_used * gas_price;
    }
    let burnt = gas_used * base_fee;

    reward += BigInt::from(gas_fee_income - burnt);
    reward += era_reward(height, chain_config) / 32 * block.uncles.len() as i64;

    reward
}

/// Uncle reward: `staticReward(includedAtHeight) * (8 - (includedAt - uncleHeight)) / 8`.
/// The era lookup uses the height the uncle was *included at*, not its own height,
/// matching `harvester.go::calculateRewardUncleBlock`'s `GetStaticReward(height)`.
pub fn calculate_uncle_reward(included_at_height: u64, uncle: &Block, chain_config: ChainConfig) -> BigInt {
    let uncle_own_height = hex_to_u64(&uncle.number).unwrap_or(included_at_height);
    let depth = included_at_height.saturating_sub(uncle_own_height) as i64;
    let factor = (8 - depth).max(0);
    era_reward(included_at_height, chain_config) * factor / 8
}

/// Converts a wei amount to whole-coin `f64` for persistence (spec.md §9(c): precision
/// loss beyond ~15 significant digits is accepted, negligible against ETH's 18 decimals).
pub fn wei_to_whole_coin(wei: &BigInt) -> f64 {
    wei.to_f64().unwrap_or(0.0) / WEI_PER_ETHER as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn era_reward_follows_the_fork_schedule() {
        let chain_config = ChainConfig::default();
        assert_eq!(era_reward(0, chain_config), BigInt::from(WEI_PER_ETHER) * 5);
        assert_eq!(era_reward(4_370_000, chain_config), BigInt::from(WEI_PER_ETHER) * 3);
        assert_eq!(era_reward(7_280_000, chain_config), BigInt::from(WEI_PER_ETHER) * 2);
    }

    #[test]
    fn uncle_reward_decays_with_depth() {
        let chain_config = ChainConfig::default();
        let uncle = Block { number: "0x2".to_owned(), ..Default::default() };
        // included one block after its own height: factor = 8 - 1 = 7
        let reward = calculate_uncle_reward(3, &uncle, chain_config);
        assert_eq!(reward, era_reward(3, chain_config) * 7 / 8);
    }

    #[test]
    fn wei_to_whole_coin_divides_by_1e18() {
        assert_eq!(wei_to_whole_coin(&(BigInt::from(WEI_PER_ETHER) * 5)), 5.0);
    }
}
