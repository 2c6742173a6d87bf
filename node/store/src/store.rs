use crate::{
    error::StoreError,
    models::{
        Block, BlockStatus, BlockType, HashrateSnapshot, MinerHashrate, NewBlock, NewShare, PoolSnapshot, ShareRow,
        ShareType, WorkerHashrate,
    },
};

use std::time::Duration;
use time::OffsetDateTime;
use tokio_postgres::{Client, NoTls};

/// How many block numbers back the anti-replay check looks — spec.md §3/§4.5's 8-block
/// sliding window.
const REPLAY_WINDOW_BLOCKS: i64 = 8;

/// Transactional persistence for the pool. One client per process; `tokio-postgres`'s
/// connection object is spawned off to drive I/O, matching
/// `.crawler/src/storage.rs::initialize_storage`.
pub struct Store {
    client: Client,
}

impl Store {
    pub async fn connect(address: &str, database: &str, username: &str, password: &str) -> Result<Self, StoreError> {
        let config = format!("host={address} dbname={database} user={username} password={password}");
        let (client, connection) = tokio_postgres::connect(&config, NoTls).await?;

        tokio::spawn(async move {
            if let Err(error) = connection.await {
                tracing::error!(%error, "postgres connection terminated");
            }
        });

        client.batch_execute(crate::schema::SCHEMA).await?;
        Ok(Self { client })
    }

    /// `minerLogin`: upsert the miner row if missing, upsert the (wallet, worker) row if
    /// missing. Wallet is lower-cased, matching `postgres.go::MinerLogin`.
    pub async fn miner_login(&mut self, wallet: &str, worker: &str) -> Result<(), StoreError> {
        let wallet = wallet.to_lowercase();
        self.client
            .execute(
                "INSERT INTO miners (miner, created_at) VALUES ($1, now()) ON CONFLICT (miner) DO NOTHING",
                &[&wallet],
            )
            .await?;
        self.client
            .execute(
                "INSERT INTO workers (miner, worker, created_at) VALUES ($1, $2, now())
                 ON CONFLICT (miner, worker) DO NOTHING",
                &[&wallet, &worker],
            )
            .await?;
        Ok(())
    }

    /// `writeShare`: anti-replay check, row insert, best-effort counter bumps — all inside
    /// one transaction, per spec.md §4.5/§4.6.
    pub async fn write_share(&mut self, share: &NewShare) -> Result<(), StoreError> {
        let transaction = self.client.transaction().await?;

        let replay_floor = share.block - REPLAY_WINDOW_BLOCKS;
        let replayed = transaction
            .query_opt(
                "SELECT id FROM shares WHERE block > $1 AND pow = $2 LIMIT 1 FOR UPDATE",
                &[&replay_floor, &share.pow],
            )
            .await?;
        if replayed.is_some() {
            transaction.rollback().await?;
            return Err(StoreError::ReplayedShare);
        }

        transaction
            .execute(
                "INSERT INTO shares (block, difficulty, network_difficulty, miner, worker, pow, type, created_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, now())",
                &[
                    &share.block,
                    &share.difficulty,
                    &share.network_difficulty,
                    &share.miner,
                    &share.worker,
                    &share.pow,
                    &share.share_type.as_str(),
                ],
            )
            .await?;

        transaction.commit().await?;

        // Counter increments are best-effort: logged on failure, never fail the write.
        if let Err(error) = self.bump_share_counters(share).await {
            tracing::warn!(%error, miner = %share.miner, worker = %share.worker, "failed to bump share counters");
        }

        Ok(())
    }

    async fn bump_share_counters(&mut self, share: &NewShare) -> Result<(), StoreError> {
        let column = match share.share_type {
            ShareType::Valid => "valid_shares",
            ShareType::Stale => "stale_shares",
            ShareType::Invalid => "invalid_shares",
        };

        if share.share_type == ShareType::Valid {
            self.client
                .execute(
                    &format!("UPDATE miners SET {column} = {column} + 1, last_valid_share_at = now() WHERE miner = $1"),
                    &[&share.miner],
                )
                .await?;
            self.client
                .execute(
                    &format!(
                        "UPDATE workers SET {column} = {column} + 1, last_valid_share_at = now() WHERE miner = $1 AND worker = $2"
                    ),
                    &[&share.miner, &share.worker],
                )
                .await?;
        } else {
            self.client.execute(&format!("UPDATE miners SET {column} = {column} + 1 WHERE miner = $1"), &[&share.miner]).await?;
            self.client
                .execute(
                    &format!("UPDATE workers SET {column} = {column} + 1 WHERE miner = $1 AND worker = $2"),
                    &[&share.miner, &share.worker],
                )
                .await?;
        }
        Ok(())
    }

    /// `writeBlock`: `writeShare` then insert the candidate block row with `status=pending`.
    pub async fn write_block(&mut self, share: &NewShare, block: &NewBlock) -> Result<(), StoreError> {
        self.write_share(share).await?;
        self.client
            .execute(
                "INSERT INTO blocks (block, network_difficulty, miner, worker, nonce, status, created_at)
                 VALUES ($1, $2, $3, $4, $5, $6, now())",
                &[&block.block, &block.network_difficulty, &block.miner, &block.worker, &block.nonce, &BlockStatus::Pending.as_str()],
            )
            .await?;
        Ok(())
    }

    pub async fn write_pool_snapshot(&mut self, snapshot: &PoolSnapshot) -> Result<(), StoreError> {
        self.client
            .execute(
                "INSERT INTO pools (miners, workers, block, pool_hashrate, network_hashrate, network_difficulty, created_at)
                 VALUES ($1, $2, $3, $4, $5, $6, now())",
                &[
                    &snapshot.miners,
                    &snapshot.workers,
                    &snapshot.block,
                    &snapshot.pool_hashrate,
                    &snapshot.network_hashrate,
                    &snapshot.network_difficulty,
                ],
            )
            .await?;
        Ok(())
    }

    // --- State Aggregator support (spec.md §4.7) ---

    pub async fn shares_since(&self, since: OffsetDateTime) -> Result<Vec<ShareRow>, StoreError> {
        let rows = self
            .client
            .query("SELECT miner, worker, difficulty, created_at FROM shares WHERE created_at >= $1", &[&since])
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| ShareRow { miner: row.get(0), worker: row.get(1), difficulty: row.get(2), created_at: row.get(3) })
            .collect())
    }

    pub async fn update_worker_hashrate(&mut self, worker: &WorkerHashrate) -> Result<(), StoreError> {
        self.client
            .execute(
                "UPDATE workers SET hashrate = $1, online = $2 WHERE miner = $3 AND worker = $4",
                &[&worker.hashrate, &worker.online, &worker.miner, &worker.worker],
            )
            .await?;
        Ok(())
    }

    pub async fn update_miner_hashrate(&mut self, miner: &MinerHashrate) -> Result<(), StoreError> {
        self.client
            .execute(
                "UPDATE miners SET hashrate = $1, online_workers = $2, offline_workers = $3 WHERE miner = $4",
                &[&miner.hashrate, &miner.online_workers, &miner.offline_workers, &miner.miner],
            )
            .await?;
        Ok(())
    }

    pub async fn insert_hashrate_snapshot(&mut self, snapshot: &HashrateSnapshot) -> Result<(), StoreError> {
        self.client
            .execute(
                "INSERT INTO hashrates (miner, hashrate, hashrate_1h, hashrate_6h, hashrate_12h, hashrate_24h, created_at)
                 VALUES ($1, $2, $3, $4, $5, $6, now())",
                &[
                    &snapshot.miner,
                    &snapshot.hashrate,
                    &snapshot.hashrate_1h,
                    &snapshot.hashrate_6h,
                    &snapshot.hashrate_12h,
                    &snapshot.hashrate_24h,
                ],
            )
            .await?;
        Ok(())
    }

    // --- Harvester support (spec.md §4.8) ---

    pub async fn pending_blocks_at_or_below(&self, max_block: i64) -> Result<Vec<Block>, StoreError> {
        let rows = self
            .client
            .query(
                "SELECT id, block, network_difficulty, miner, worker, nonce, hash, type, uncle_index, reward, status, created_at
                 FROM blocks WHERE block <= $1 AND status = $2",
                &[&max_block, &BlockStatus::Pending.as_str()],
            )
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| Block {
                id: row.get(0),
                block: row.get(1),
                network_difficulty: row.get(2),
                miner: row.get(3),
                worker: row.get(4),
                nonce: row.get(5),
                hash: row.get(6),
                block_type: match row.get::<_, Option<String>>(7).as_deref() {
                    Some("block") => Some(BlockType::Block),
                    Some("uncle") => Some(BlockType::Uncle),
                    _ => None,
                },
                uncle_index: row.get(8),
                reward: row.get(9),
                status: match row.get::<_, String>(10).as_str() {
                    "confirmed" => BlockStatus::Confirmed,
                    "orphaned" => BlockStatus::Orphaned,
                    _ => BlockStatus::Pending,
                },
                created_at: row.get(11),
            })
            .collect())
    }

    pub async fn resolve_block(
        &mut self,
        id: i64,
        hash: Option<&str>,
        block_type: Option<BlockType>,
        uncle_index: i32,
        reward: f64,
        status: BlockStatus,
    ) -> Result<(), StoreError> {
        self.client
            .execute(
                "UPDATE blocks SET hash = $1, type = $2, uncle_index = $3, reward = $4, status = $5 WHERE id = $6",
                &[&hash, &block_type.map(BlockType::as_str), &uncle_index, &reward, &status.as_str(), &id],
            )
            .await?;
        Ok(())
    }

    pub async fn share_counts_for_block(&self, block: i64) -> Result<Vec<(String, i64)>, StoreError> {
        let rows = self
            .client
            .query("SELECT miner, count(*) FROM shares WHERE block = $1 GROUP BY miner", &[&block])
            .await?;
        Ok(rows.into_iter().map(|row| (row.get(0), row.get(1))).collect())
    }

    /// Upserts a wallet's balance and appends the audit-log row inside one transaction
    /// (spec.md §4.6's reward-distribution transaction).
    pub async fn credit_balance(
        &mut self,
        wallet: &str,
        amount: f64,
        usage: &str,
        change_type: crate::models::BalanceChangeType,
    ) -> Result<(), StoreError> {
        let transaction = self.client.transaction().await?;

        let resulting_balance: f64 = match transaction.query_opt("SELECT amount FROM balances WHERE wallet = $1", &[&wallet]).await? {
            Some(row) => {
                let current: f64 = row.get(0);
                let updated = current + amount;
                transaction.execute("UPDATE balances SET amount = $1, updated_at = now() WHERE wallet = $2", &[&updated, &wallet]).await?;
                updated
            }
            None => {
                transaction
                    .execute(
                        "INSERT INTO balances (wallet, amount, updated_at) VALUES ($1, $2, now())",
                        &[&wallet, &amount],
                    )
                    .await?;
                amount
            }
        };

        transaction
            .execute(
                "INSERT INTO balance_changes (wallet, amount, balance, usage, type, created_at)
                 VALUES ($1, $2, $3, $4, $5, now())",
                &[&wallet, &amount, &resulting_balance, &usage, &change_type.as_str()],
            )
            .await?;

        transaction.commit().await?;
        Ok(())
    }
}

/// A worker is considered online iff its last beat (here, last valid share) fell within
/// this window — spec.md §4.7 step 4.
pub const ONLINE_WINDOW: Duration = Duration::from_secs(300);
