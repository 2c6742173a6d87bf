use thiserror::Error;

/// Reasons a line of miner input never made it to a handler.
#[derive(Debug, Error)]
pub enum StratumError {
    #[error("line exceeds the 1024-byte limit (flood detected)")]
    Flood,
    #[error("malformed JSON-RPC line: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("the connection was closed")]
    Closed,
}
