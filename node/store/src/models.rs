use time::OffsetDateTime;

/// Classification of a submitted share, per spec.md §3.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShareType {
    Valid,
    Stale,
    Invalid,
}

impl ShareType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Stale => "stale",
            Self::Invalid => "invalid",
        }
    }
}

/// A candidate block's resolution once the harvester walks the canonical chain past it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockType {
    Block,
    Uncle,
}

impl BlockType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Block => "block",
            Self::Uncle => "uncle",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockStatus {
    Pending,
    Confirmed,
    Orphaned,
}

impl BlockStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Orphaned => "orphaned",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BalanceChangeType {
    Income,
    Expenditure,
}

impl BalanceChangeType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expenditure => "expenditure",
        }
    }
}

/// A share row to be inserted — the anti-replay check and the miner/worker counter
/// bumps happen inside [`crate::Store::write_share`]'s transaction.
#[derive(Clone, Debug)]
pub struct NewShare {
    pub block: i64,
    pub difficulty: f64,
    pub network_difficulty: f64,
    pub miner: String,
    pub worker: String,
    /// `nonce:headerHash:mixDigest` — the anti-replay key (spec.md §3/§4.5).
    pub pow: String,
    pub share_type: ShareType,
}

#[derive(Clone, Debug)]
pub struct NewBlock {
    pub block: i64,
    pub network_difficulty: f64,
    pub miner: String,
    pub worker: String,
    pub nonce: String,
}

#[derive(Clone, Debug)]
pub struct Block {
    pub id: i64,
    pub block: i64,
    pub network_difficulty: f64,
    pub miner: String,
    pub worker: String,
    pub nonce: String,
    pub hash: Option<String>,
    pub block_type: Option<BlockType>,
    pub uncle_index: i32,
    pub reward: f64,
    pub status: BlockStatus,
    pub created_at: OffsetDateTime,
}

#[derive(Clone, Debug)]
pub struct ShareRow {
    pub miner: String,
    pub worker: String,
    pub difficulty: f64,
    pub created_at: OffsetDateTime,
}

#[derive(Clone, Debug)]
pub struct PoolSnapshot {
    pub miners: i32,
    pub workers: i32,
    pub block: i64,
    pub pool_hashrate: f64,
    pub network_hashrate: f64,
    pub network_difficulty: f64,
}

#[derive(Clone, Debug)]
pub struct HashrateSnapshot {
    pub miner: String,
    pub hashrate: f64,
    pub hashrate_1h: f64,
    pub hashrate_6h: f64,
    pub hashrate_12h: f64,
    pub hashrate_24h: f64,
}

#[derive(Clone, Debug)]
pub struct WorkerHashrate {
    pub miner: String,
    pub worker: String,
    pub hashrate: f64,
    pub online: bool,
}

#[derive(Clone, Debug)]
pub struct MinerHashrate {
    pub miner: String,
    pub hashrate: f64,
    pub online_workers: i32,
    pub offline_workers: i32,
}
