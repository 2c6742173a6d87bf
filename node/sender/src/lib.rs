use poolproxy_node_messages::WorkTuple;

use parking_lot::Mutex;
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::sync::mpsc;

/// Identifies a subscriber within the Sender's fan-out map. Issued by the TCP layer.
pub type SessionId = u64;

/// How far behind `latestWork`'s block number a history entry may be before the
/// eviction ticker drops it. Matches the 8-block anti-replay window in the data model.
pub const STALE_THRESHOLD: u64 = 7;

/// How often the eviction pass runs.
const EVICTION_INTERVAL: Duration = Duration::from_secs(5);

/// Bound on the inbound notification channel; a burst of pushes drops the oldest
/// unconsumed entry rather than blocking the HTTP handler.
const INBOUND_CHANNEL_CAPACITY: usize = 16;

/// Bound on each subscriber's outbound channel; a slow session never blocks ingest.
const SUBSCRIBER_CHANNEL_CAPACITY: usize = 8;

struct Inner {
    latest_work: Option<WorkTuple>,
    history: HashMap<String, WorkTuple>,
    subscribers: HashMap<SessionId, mpsc::Sender<WorkTuple>>,
}

/// Holds the latest work tuple, a short header-keyed history, and the subscriber
/// fan-out map; rewrites the published target to the pool-wide value.
pub struct Sender {
    inner: Mutex<Inner>,
    pool_target: String,
}

impl Sender {
    /// Builds a Sender and spawns its ingest and eviction background tasks.
    /// Returns the Sender handle and the channel the Notify Receiver pushes into.
    pub fn spawn(pool_target: String) -> (Arc<Self>, mpsc::Sender<WorkTuple>) {
        let sender =
            Arc::new(Self { inner: Mutex::new(Inner { latest_work: None, history: HashMap::new(), subscribers: HashMap::new() }), pool_target });

        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_CHANNEL_CAPACITY);

        tokio::spawn(Self::ingest_loop(sender.clone(), inbound_rx));
        tokio::spawn(Self::eviction_loop(sender.clone()));

        (sender, inbound_tx)
    }

    /// Registers a new subscriber, returning the receiving half of its outbound queue.
    pub fn attach(&self, id: SessionId) -> mpsc::Receiver<WorkTuple> {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_CHANNEL_CAPACITY);
        self.inner.lock().subscribers.insert(id, tx);
        rx
    }

    /// Removes a subscriber. Safe to call more than once for the same id.
    pub fn detach(&self, id: SessionId) {
        self.inner.lock().subscribers.remove(&id);
    }

    /// Returns a copy of the latest work tuple with the target rewritten to the
    /// pool-wide value, or `None` if nothing has been ingested yet.
    pub fn last_work(&self) -> Option<WorkTuple> {
        let guard = self.inner.lock();
        guard.latest_work.as_ref().map(|tuple| self.with_pool_target(tuple))
    }

    /// Looks up a previously-ingested work tuple by header hash, for validating
    /// submitted shares. Returned with the pool target already substituted.
    pub fn by_header(&self, header_hash: &str) -> Option<WorkTuple> {
        let guard = self.inner.lock();
        guard.history.get(header_hash).map(|tuple| self.with_pool_target(tuple))
    }

    /// Same lookup as [`Sender::by_header`] but without the pool-target substitution —
    /// used to recover the real network target/difficulty for a submitted share
    /// (spec.md §3/§4.5: `difficulty` and `networkDifficulty` are distinct fields).
    pub fn by_header_raw(&self, header_hash: &str) -> Option<WorkTuple> {
        self.inner.lock().history.get(header_hash).cloned()
    }

    /// Returns a copy of `latestWork` exactly as ingested, without the pool-target
    /// substitution — used by the State Aggregator to compute the network (not pool)
    /// difficulty for the pool-state snapshot (spec.md §4.7 step 6).
    pub fn latest_work_raw(&self) -> Option<WorkTuple> {
        self.inner.lock().latest_work.clone()
    }

    /// Returns `latestWork`'s block number (as a raw u64), if any.
    pub fn latest_block_number(&self) -> Option<u64> {
        let guard = self.inner.lock();
        guard.latest_work.as_ref().and_then(|tuple| parse_hex_u64(&tuple[3]))
    }

    fn with_pool_target(&self, tuple: &WorkTuple) -> WorkTuple {
        [tuple[0].clone(), tuple[1].clone(), self.pool_target.clone(), tuple[3].clone()]
    }

    async fn ingest_loop(self: Arc<Self>, mut inbound_rx: mpsc::Receiver<WorkTuple>) {
        while let Some(tuple) = inbound_rx.recv().await {
            let header_hash = tuple[0].clone();
            let subscribers: Vec<(SessionId, mpsc::Sender<WorkTuple>)> = {
                let mut guard = self.inner.lock();
                guard.latest_work = Some(tuple.clone());
                guard.history.insert(header_hash, tuple.clone());
                guard.subscribers.iter().map(|(id, tx)| (*id, tx.clone())).collect()
            };

            let outbound = self.with_pool_target(&tuple);
            let mut dead = Vec::new();
            for (id, tx) in subscribers {
                // try_send: a full queue means the subscriber is too slow; drop the
                // notification for it rather than block other subscribers.
                if tx.try_send(outbound.clone()).is_err() && tx.is_closed() {
                    dead.push(id);
                }
            }
            if !dead.is_empty() {
                let mut guard = self.inner.lock();
                for id in dead {
                    guard.subscribers.remove(&id);
                }
            }
        }
    }

    async fn eviction_loop(self: Arc<Self>) {
        let mut ticker = tokio::time::interval(EVICTION_INTERVAL);
        loop {
            ticker.tick().await;
            let mut guard = self.inner.lock();
            let Some(latest_block) = guard.latest_work.as_ref().and_then(|tuple| parse_hex_u64(&tuple[3])) else {
                continue;
            };
            guard.history.retain(|_, tuple| match parse_hex_u64(&tuple[3]) {
                Some(block) => latest_block.saturating_sub(block) < STALE_THRESHOLD,
                None => false,
            });
        }
    }
}

fn parse_hex_u64(hex: &str) -> Option<u64> {
    u64::from_str_radix(hex.trim_start_matches("0x"), 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tuple(header: &str, block_hex: &str) -> WorkTuple {
        [header.to_owned(), "0xseed".to_owned(), "0xtarget".to_owned(), block_hex.to_owned()]
    }

    #[tokio::test]
    async fn fan_out_rewrites_target_and_delivers_to_subscribers() {
        let (sender, inbound) = Sender::spawn("0xpooltarget".to_owned());
        let mut rx = sender.attach(1);

        inbound.send(tuple("0xhdr", "0x10")).await.unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received[2], "0xpooltarget");
        assert_eq!(received[3], "0x10");
    }

    #[tokio::test]
    async fn by_header_resolves_recent_work() {
        let (sender, inbound) = Sender::spawn("0xpooltarget".to_owned());
        inbound.send(tuple("0xhdr", "0x10")).await.unwrap();
        // give the ingest task a tick to run
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(10)).await;

        let found = sender.by_header("0xhdr");
        assert!(found.is_some());
        assert!(sender.by_header("0xmissing").is_none());
    }

    #[test]
    fn detach_is_idempotent() {
        let inner = Inner { latest_work: None, history: HashMap::new(), subscribers: HashMap::new() };
        let sender = Sender { inner: Mutex::new(inner), pool_target: "0x1".to_owned() };
        sender.detach(42);
        sender.detach(42);
    }
}
