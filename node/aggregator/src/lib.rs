//! Periodic rolling-window hashrate computation (spec.md §4.7): buckets recent shares
//! per (miner, worker), updates worker/miner rows, and appends a pool-state snapshot.

use poolproxy_node_sender::Sender;
use poolproxy_node_store::{HashrateSnapshot, MinerHashrate, PoolSnapshot, ShareRow, Store, WorkerHashrate, ONLINE_WINDOW};
use poolproxy_node_upstream::UpstreamClient;

use std::{collections::HashMap, sync::Arc};
use time::{Duration as TimeDuration, OffsetDateTime};
use tokio::{
    sync::{Mutex, Notify},
    task::JoinHandle,
};

/// The five rolling windows a worker/miner hashrate is computed over. The first
/// (10 minutes) is the "live" value stored on the worker/miner row; all five are
/// persisted on the per-miner [`HashrateSnapshot`] row.
const WINDOWS: [TimeDuration; 5] = [
    TimeDuration::seconds(600),
    TimeDuration::seconds(3_600),
    TimeDuration::seconds(6 * 3_600),
    TimeDuration::seconds(12 * 3_600),
    TimeDuration::seconds(24 * 3_600),
];

/// How far back shares are fetched each tick — covers the widest rolling window.
const LOOKBACK: TimeDuration = TimeDuration::seconds(24 * 3_600);

/// How far back the upstream network-hashrate sample window reaches (spec.md §4.7 step 6).
const NETWORK_HASHRATE_WINDOW: std::time::Duration = std::time::Duration::from_secs(600);

/// Drives the state-aggregator tick on a cancellable interval.
pub struct Aggregator {
    quit: Arc<Notify>,
    task: JoinHandle<()>,
}

impl Aggregator {
    /// Spawns the aggregator loop. Each tick is skipped (not merely delayed) if the
    /// Sender hasn't ingested any work yet, per spec.md §4.7 step 1.
    pub fn spawn(
        interval: std::time::Duration,
        store: Arc<Mutex<Store>>,
        sender: Arc<Sender>,
        upstream: UpstreamClient,
    ) -> Self {
        let quit = Arc::new(Notify::new());
        let quit_for_task = quit.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // first tick fires immediately; skip it to wait a full interval
            loop {
                tokio::select! {
                    biased;
                    _ = quit_for_task.notified() => return,
                    _ = ticker.tick() => {
                        if let Err(error) = run_tick(&store, &sender, &upstream).await {
                            tracing::warn!(%error, "state aggregator tick failed, will retry next interval");
                        }
                    }
                }
            }
        });

        Self { quit, task }
    }

    /// Signals the loop to stop and waits for the in-flight tick (if any) to finish.
    pub async fn shutdown(self) {
        self.quit.notify_one();
        let _ = self.task.await;
    }
}

async fn run_tick(store: &Arc<Mutex<Store>>, sender: &Arc<Sender>, upstream: &UpstreamClient) -> Result<(), String> {
    let Some(latest_work) = sender.last_work() else {
        tracing::trace!("no work ingested yet, skipping state aggregator tick");
        return Ok(());
    };

    let now = OffsetDateTime::now_utc();
    let since = now - LOOKBACK;

    let shares = store.lock().await.shares_since(since).await.map_err(|error| error.to_string())?;
    let buckets = bucket_by_miner_worker(&shares, now);
    let online_window = TimeDuration::seconds(ONLINE_WINDOW.as_secs() as i64);

    let mut miner_hashrates: HashMap<String, f64> = HashMap::new();
    let mut miner_online: HashMap<String, i32> = HashMap::new();
    let mut miner_offline: HashMap<String, i32> = HashMap::new();
    let mut total_online_workers = 0i32;

    let mut store = store.lock().await;

    for (key, bucket) in &buckets {
        let online = bucket.last_beat.map(|beat| now - beat <= online_window).unwrap_or(false);
        let live_hashrate = bucket.hashrate(0);

        store
            .update_worker_hashrate(&WorkerHashrate {
                miner: key.miner.clone(),
                worker: key.worker.clone(),
                hashrate: live_hashrate,
                online,
            })
            .await
            .map_err(|error| error.to_string())?;

        *miner_hashrates.entry(key.miner.clone()).or_default() += live_hashrate;
        if online {
            *miner_online.entry(key.miner.clone()).or_default() += 1;
            total_online_workers += 1;
        } else {
            *miner_offline.entry(key.miner.clone()).or_default() += 1;
        }
    }

    let mut per_miner_buckets: HashMap<String, [f64; WINDOWS.len()]> = HashMap::new();
    for (key, bucket) in &buckets {
        let entry = per_miner_buckets.entry(key.miner.clone()).or_insert([0.0; WINDOWS.len()]);
        for (i, value) in entry.iter_mut().enumerate() {
            *value += bucket.hashrate(i);
        }
    }

    for (miner, hashrate) in &miner_hashrates {
        store
            .update_miner_hashrate(&MinerHashrate {
                miner: miner.clone(),
                hashrate: *hashrate,
                online_workers: *miner_online.get(miner).unwrap_or(&0),
                offline_workers: *miner_offline.get(miner).unwrap_or(&0),
            })
            .await
            .map_err(|error| error.to_string())?;
    }

    for (miner, windows) in &per_miner_buckets {
        store
            .insert_hashrate_snapshot(&HashrateSnapshot {
                miner: miner.clone(),
                hashrate: windows[0],
                hashrate_1h: windows[1],
                hashrate_6h: windows[2],
                hashrate_12h: windows[3],
                hashrate_24h: windows[4],
            })
            .await
            .map_err(|error| error.to_string())?;
    }

    let pool_hashrate: f64 = miner_hashrates.values().sum();
    let block = hex_to_u64(&latest_work[3]).unwrap_or(0);
    let network_target = sender.latest_work_raw().map(|tuple| tuple[2].clone()).unwrap_or_default();
    let network_difficulty = big_to_f64(&poolproxy_node_verifier::target_to_difficulty(&network_target));

    let network_hashrate = match upstream.network_hashrate(NETWORK_HASHRATE_WINDOW).await {
        Ok(hashrate) => hashrate,
        Err(error) => {
            tracing::warn!(%error, "failed to sample network hashrate, recording 0 for this tick");
            0
        }
    };

    store
        .write_pool_snapshot(&PoolSnapshot {
            miners: miner_hashrates.len() as i32,
            workers: total_online_workers,
            block: block as i64,
            pool_hashrate,
            network_hashrate: network_hashrate as f64,
            network_difficulty,
        })
        .await
        .map_err(|error| error.to_string())?;

    metrics::gauge!(poolproxy_node_metrics::pool::HASHRATE, pool_hashrate);
    metrics::gauge!(poolproxy_node_metrics::network::HASHRATE, network_hashrate as f64);
    metrics::gauge!(poolproxy_node_metrics::network::DIFFICULTY, network_difficulty);

    Ok(())
}

#[derive(Default)]
struct Bucket {
    /// Σ difficulty of shares within each of [`WINDOWS`], indexed the same way.
    sums: [f64; WINDOWS.len()],
    last_beat: Option<OffsetDateTime>,
}

impl Bucket {
    /// Σ difficulty ÷ window-seconds for window `i`. Divides by the full wall-clock
    /// window regardless of how much of it is actually covered by samples — spec.md
    /// §9(a): preserved behavior, yields a low rate for a pool's first partial window.
    fn hashrate(&self, i: usize) -> f64 {
        self.sums[i] / WINDOWS[i].as_seconds_f64()
    }
}

#[derive(Hash, Eq, PartialEq, Clone)]
struct MinerWorker {
    miner: String,
    worker: String,
}

fn bucket_by_miner_worker(shares: &[ShareRow], now: OffsetDateTime) -> HashMap<MinerWorker, Bucket> {
    let mut buckets: HashMap<MinerWorker, Bucket> = HashMap::new();
    for share in shares {
        let key = MinerWorker { miner: share.miner.clone(), worker: share.worker.clone() };
        let entry = buckets.entry(key).or_default();
        let age = now - share.created_at;
        for (i, window) in WINDOWS.iter().enumerate() {
            if age <= *window {
                entry.sums[i] += share.difficulty;
            }
        }
        entry.last_beat = Some(entry.last_beat.map_or(share.created_at, |existing| existing.max(share.created_at)));
    }
    buckets
}

fn hex_to_u64(hex: &str) -> Option<u64> {
    u64::from_str_radix(hex.trim_start_matches("0x"), 16).ok()
}

fn big_to_f64(value: &num_bigint::BigUint) -> f64 {
    value.to_string().parse::<f64>().unwrap_or(f64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn share(miner: &str, worker: &str, difficulty: f64, age_secs: i64, now: OffsetDateTime) -> ShareRow {
        ShareRow { miner: miner.to_owned(), worker: worker.to_owned(), difficulty, created_at: now - TimeDuration::seconds(age_secs) }
    }

    #[test]
    fn buckets_split_by_window_and_identity() {
        let now = OffsetDateTime::now_utc();
        let shares = vec![
            share("0xminer", "rig1", 100.0, 60, now),
            share("0xminer", "rig1", 100.0, 3_700, now),
            share("0xminer", "rig2", 50.0, 60, now),
        ];
        let buckets = bucket_by_miner_worker(&shares, now);

        let rig1 = buckets.get(&MinerWorker { miner: "0xminer".to_owned(), worker: "rig1".to_owned() }).unwrap();
        // 10-minute bucket only sees the first share.
        assert_eq!(rig1.sums[0], 100.0);
        // 1h bucket also misses the 3700s-old share (> 3600s).
        assert_eq!(rig1.sums[1], 100.0);
        // 6h bucket catches both.
        assert_eq!(rig1.sums[2], 200.0);

        let rig2 = buckets.get(&MinerWorker { miner: "0xminer".to_owned(), worker: "rig2".to_owned() }).unwrap();
        assert_eq!(rig2.sums[0], 50.0);
    }

    #[test]
    fn hashrate_divides_by_full_window_not_coverage() {
        let now = OffsetDateTime::now_utc();
        let shares = vec![share("0xminer", "rig1", 600.0, 60, now)];
        let buckets = bucket_by_miner_worker(&shares, now);
        let rig1 = buckets.get(&MinerWorker { miner: "0xminer".to_owned(), worker: "rig1".to_owned() }).unwrap();
        assert_eq!(rig1.hashrate(0), 1.0); // 600 difficulty / 600s window, not / 60s elapsed
    }
}
