//! Block maturation, era-reward computation, and pro-rata reward distribution
//! (spec.md §4.8). Runs on its own cancellable interval, independent of the
//! proxy and the state aggregator.

mod reward;

pub use reward::{era_reward, HarvesterConfigError};

use poolproxy_node_store::{BalanceChangeType, Block, BlockStatus, BlockType, Store};
use poolproxy_node_upstream::UpstreamClient;

use num_bigint::BigInt;
use num_traits::Zero;
use std::sync::Arc;
use tokio::{
    sync::{Mutex, Notify},
    task::JoinHandle,
};

/// How far on either side of a candidate's own height the harvester searches the
/// canonical chain and its uncles for a matching nonce — spec.md §4.8 step 3.
const SEARCH_RADIUS: i64 = 16;

/// Validated harvester configuration (spec.md §4.8's constructor-time checks, ported
/// from `original_source/core/harvester.go::NewHarvester`'s `log.Fatalf` guards).
#[derive(Clone, Debug)]
pub struct HarvesterConfig {
    pub pool_fee: f64,
    pub pool_fee_address: Option<String>,
    pub depth: u64,
    pub immature_depth: u64,
    pub keep_tx_fees: bool,
}

impl HarvesterConfig {
    /// `depth` must be at least 32 (`minDepth * 2`), `immature_depth` at least 16
    /// (`minDepth`), and a non-empty `pool_fee_address` must be a valid hex address.
    /// These are fatal at startup, not at tick time (spec.md §7).
    pub fn validate(&self) -> Result<(), HarvesterConfigError> {
        if let Some(address) = &self.pool_fee_address {
            if !address.is_empty() && !poolproxy_node_verifier_address_is_valid(address) {
                return Err(HarvesterConfigError::InvalidPoolFeeAddress(address.clone()));
            }
        }
        if self.depth < 32 {
            return Err(HarvesterConfigError::DepthTooShallow(self.depth));
        }
        if self.immature_depth < 16 {
            return Err(HarvesterConfigError::ImmatureDepthTooShallow(self.immature_depth));
        }
        Ok(())
    }
}

/// `^0x[0-9a-fA-F]{40}$`, not all-zero — the same wallet-address shape the proxy
/// validates on login (spec.md §4.4), duplicated here so this crate doesn't need to
/// depend on `poolproxy-node-proxy` just for one predicate.
fn poolproxy_node_verifier_address_is_valid(address: &str) -> bool {
    let Some(digits) = address.strip_prefix("0x") else { return false };
    digits.len() == 40 && digits.chars().all(|c| c.is_ascii_hexdigit()) && !digits.chars().all(|c| c == '0')
}

pub struct Harvester {
    quit: Arc<Notify>,
    task: JoinHandle<()>,
}

impl Harvester {
    pub fn spawn(
        interval: std::time::Duration,
        store: Arc<Mutex<Store>>,
        upstream: UpstreamClient,
        config: HarvesterConfig,
    ) -> Self {
        let quit = Arc::new(Notify::new());
        let quit_for_task = quit.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                tokio::select! {
                    biased;
                    _ = quit_for_task.notified() => return,
                    _ = ticker.tick() => {
                        if let Err(error) = run_tick(&store, &upstream, &config).await {
                            tracing::warn!(%error, "harvester tick failed, will retry next interval");
                        }
                    }
                }
            }
        });

        Self { quit, task }
    }

    pub async fn shutdown(self) {
        self.quit.notify_one();
        let _ = self.task.await;
    }
}

async fn run_tick(store: &Arc<Mutex<Store>>, upstream: &UpstreamClient, config: &HarvesterConfig) -> Result<(), String> {
    let current_block_number =
        upstream.block_number().await.map_err(|error| format!("failed to read current block height: {error}"))?;

    let Some(maturation_height) = current_block_number.checked_sub(config.immature_depth) else {
        tracing::trace!("chain shorter than immatureDepth, nothing to harvest yet");
        return Ok(());
    };

    let candidates = store
        .lock()
        .await
        .pending_blocks_at_or_below(maturation_height as i64)
        .await
        .map_err(|error| error.to_string())?;

    for candidate in candidates {
        if let Err(error) = mature_one(store, upstream, config, &candidate).await {
            tracing::warn!(block = candidate.block, %error, "failed to mature a pending block, will retry next tick");
        }
    }

    Ok(())
}

async fn mature_one(
    store: &Arc<Mutex<Store>>,
    upstream: &UpstreamClient,
    config: &HarvesterConfig,
    candidate: &Block,
) -> Result<(), String> {
    let chain_config = upstream.chain_config();

    let mut resolution: Option<(String, BlockType, i32, BigInt)> = None;

    for offset in -SEARCH_RADIUS..SEARCH_RADIUS {
        let height = candidate.block + offset;
        if height < 0 {
            continue;
        }
        let height = height as u64;

        let Ok(container) = upstream.get_block_by_number(height).await else { continue };

        if container.nonce == candidate.nonce {
            let reward = reward::calculate_block_reward(upstream, &container, chain_config).await;
            resolution = Some((container.hash.clone(), BlockType::Block, 0, reward));
            break;
        }

        for uncle_index in 0..container.uncles.len() {
            let Ok(uncle) = upstream.get_uncle_by_block_number_and_index(height, uncle_index).await else { continue };
            if uncle.nonce == candidate.nonce {
                let reward = reward::calculate_uncle_reward(height, &uncle, chain_config);
                resolution = Some((uncle.hash.clone(), BlockType::Uncle, uncle_index as i32, reward));
                break;
            }
        }
        if resolution.is_some() {
            break;
        }
    }

    let (hash, block_type, uncle_index, status, reward_wei) = match resolution {
        Some((hash, block_type, uncle_index, reward)) => (Some(hash), Some(block_type), uncle_index, BlockStatus::Confirmed, reward),
        None => (None, None, 0, BlockStatus::Orphaned, BigInt::zero()),
    };

    let reward_whole_coin = reward::wei_to_whole_coin(&reward_wei);

    {
        let mut store = store.lock().await;
        store
            .resolve_block(candidate.id, hash.as_deref(), block_type, uncle_index, reward_whole_coin, status)
            .await
            .map_err(|error| error.to_string())?;
    }

    metrics::decrement_gauge!(poolproxy_node_metrics::blocks::PENDING, 1.0);
    match status {
        BlockStatus::Confirmed => {
            metrics::increment_gauge!(poolproxy_node_metrics::blocks::CONFIRMED, 1.0);
            distribute(store, config, candidate.block, reward_whole_coin).await?;
        }
        BlockStatus::Orphaned => {
            metrics::increment_counter!(poolproxy_node_metrics::blocks::ORPHANED);
        }
        BlockStatus::Pending => unreachable!("mature_one always resolves to Confirmed or Orphaned"),
    }

    Ok(())
}

/// Tallies share counts per miner for `block` and credits each miner's balance
/// `reward × count ÷ totalShares`, via the balance/audit-log transaction (spec.md
/// §4.6/§4.8 step 6). `config.pool_fee`/`config.pool_fee_address` are validated at
/// startup but, matching `original_source/core/harvester.go`, are not applied as a
/// cut here — the full block reward is split pro-rata across contributing shares.
async fn distribute(store: &Arc<Mutex<Store>>, _config: &HarvesterConfig, block: i64, reward: f64) -> Result<(), String> {
    if reward <= 0.0 {
        return Ok(());
    }

    let counts = store.lock().await.share_counts_for_block(block).await.map_err(|error| error.to_string())?;
    let total_shares: i64 = counts.iter().map(|(_, count)| count).sum();
    if total_shares == 0 {
        return Ok(());
    }

    let mut store = store.lock().await;
    for (miner, count) in counts {
        let share = reward * (count as f64) / (total_shares as f64);
        store
            .credit_balance(&miner, share, "mining reward", BalanceChangeType::Income)
            .await
            .map_err(|error| error.to_string())?;
    }
    Ok(())
}

/// Re-exported so callers building [`HarvesterConfig`] don't need their own dependency
/// on `poolproxy-node-upstream` just for this one type.
pub use poolproxy_node_upstream::ChainConfig;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_shallow_depth() {
        let config = HarvesterConfig { pool_fee: 1.0, pool_fee_address: None, depth: 31, immature_depth: 16, keep_tx_fees: false };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_shallow_immature_depth() {
        let config = HarvesterConfig { pool_fee: 1.0, pool_fee_address: None, depth: 32, immature_depth: 15, keep_tx_fees: false };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_invalid_pool_fee_address() {
        let config = HarvesterConfig {
            pool_fee: 1.0,
            pool_fee_address: Some("not-an-address".to_owned()),
            depth: 32,
            immature_depth: 16,
            keep_tx_fees: false,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn accepts_well_formed_config() {
        let config = HarvesterConfig {
            pool_fee: 1.0,
            pool_fee_address: Some("0x000000000000000000000000000000000000dEaD".to_owned()),
            depth: 32,
            immature_depth: 16,
            keep_tx_fees: false,
        };
        assert!(config.validate().is_ok());
    }
}
