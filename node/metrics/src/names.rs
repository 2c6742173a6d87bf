pub const GAUGE_NAMES: [&str; 6] = [
    sessions::CONNECTED,
    pool::HASHRATE,
    network::HASHRATE,
    network::DIFFICULTY,
    blocks::PENDING,
    blocks::CONFIRMED,
];

pub const COUNTER_NAMES: [&str; 4] = [shares::VALID, shares::STALE, shares::INVALID, blocks::ORPHANED];

pub const HISTOGRAM_NAMES: [&str; 1] = [shares::SUBMIT_LATENCY_SECONDS];

pub mod sessions {
    pub const CONNECTED: &str = "poolproxy_sessions_connected";
}

pub mod shares {
    pub const VALID: &str = "poolproxy_shares_valid_total";
    pub const STALE: &str = "poolproxy_shares_stale_total";
    pub const INVALID: &str = "poolproxy_shares_invalid_total";
    pub const SUBMIT_LATENCY_SECONDS: &str = "poolproxy_share_submit_latency_seconds";
}

pub mod pool {
    pub const HASHRATE: &str = "poolproxy_pool_hashrate";
}

pub mod network {
    pub const HASHRATE: &str = "poolproxy_network_hashrate";
    pub const DIFFICULTY: &str = "poolproxy_network_difficulty";
}

pub mod blocks {
    pub const PENDING: &str = "poolproxy_blocks_pending";
    pub const CONFIRMED: &str = "poolproxy_blocks_confirmed_total";
    pub const ORPHANED: &str = "poolproxy_blocks_orphaned_total";
}
