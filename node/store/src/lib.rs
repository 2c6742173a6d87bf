mod error;
mod models;
mod schema;
mod store;

pub use error::StoreError;
pub use models::{
    Block, BalanceChangeType, BlockStatus, BlockType, HashrateSnapshot, MinerHashrate, NewBlock, NewShare, PoolSnapshot,
    ShareRow, ShareType, WorkerHashrate,
};
pub use store::{Store, ONLINE_WINDOW};
