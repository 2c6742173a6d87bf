use crate::{
    error::UpstreamError,
    hex::{hex_to_u64, u64_to_hex},
    rpc::{RpcRequest, RpcResponse, JSONRPC_VERSION},
    types::{Block, Chain, ChainConfig, TransactionReceipt},
};

use serde_json::{json, Value};
use std::time::Duration;

/// Stateless JSON-RPC-over-HTTP client to the execution-layer node. One POST per call,
/// no retry ladder — transport and RPC-level failures both surface as [`UpstreamError`]
/// and the caller is expected to log and retry on its own timer (spec.md §4.1/§7).
#[derive(Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    url: String,
    chain: Chain,
    chain_config: ChainConfig,
}

impl UpstreamClient {
    pub fn new(host: &str, port: u16, chain: Chain) -> Self {
        let http = reqwest::Client::builder().timeout(Duration::from_secs(10)).build().expect("failed to build the upstream HTTP client");
        Self { http, url: format!("http://{host}:{port}"), chain, chain_config: ChainConfig::default() }
    }

    pub fn chain(&self) -> Chain {
        self.chain
    }

    pub fn chain_config(&self) -> ChainConfig {
        self.chain_config
    }

    pub async fn block_number(&self) -> Result<u64, UpstreamError> {
        let result = self.call("eth_blockNumber", json!([])).await?;
        hex_to_u64(as_str(&result, "eth_blockNumber")?)
    }

    pub async fn coinbase(&self) -> Result<String, UpstreamError> {
        let result = self.call("eth_coinbase", json!([])).await?;
        Ok(as_str(&result, "eth_coinbase")?.to_owned())
    }

    pub async fn balance(&self, address: &str) -> Result<u64, UpstreamError> {
        let result = self.call("eth_getBalance", json!([address, "latest"])).await?;
        hex_to_u64(as_str(&result, "eth_getBalance")?)
    }

    pub async fn get_block_by_number(&self, number: u64) -> Result<Block, UpstreamError> {
        let result = self.call("eth_getBlockByNumber", json!([u64_to_hex(number), true])).await?;
        decode(result, "eth_getBlockByNumber")
    }

    pub async fn get_block_by_hash(&self, hash: &str) -> Result<Block, UpstreamError> {
        let result = self.call("eth_getBlockByHash", json!([hash, true])).await?;
        decode(result, "eth_getBlockByHash")
    }

    pub async fn get_uncle_by_block_number_and_index(&self, number: u64, index: usize) -> Result<Block, UpstreamError> {
        let result =
            self.call("eth_getUncleByBlockNumberAndIndex", json!([u64_to_hex(number), u64_to_hex(index as u64)])).await?;
        decode(result, "eth_getUncleByBlockNumberAndIndex")
    }

    pub async fn get_uncle_count_by_block_number(&self, number: u64) -> Result<u64, UpstreamError> {
        let result = self.call("eth_getUncleCountByBlockNumber", json!([u64_to_hex(number)])).await?;
        hex_to_u64(as_str(&result, "eth_getUncleCountByBlockNumber")?)
    }

    pub async fn get_transaction_receipt(&self, hash: &str) -> Result<TransactionReceipt, UpstreamError> {
        let result = self.call("eth_getTransactionReceipt", json!([hash])).await?;
        decode(result, "eth_getTransactionReceipt")
    }

    /// Returns the 3-tuple `[headerHash, seedHash, target]`. The Notify Receiver is the
    /// primary source of fresh work in this proxy; this method exists for completeness
    /// with the original's daemon surface and isn't polled on a hot path.
    pub async fn get_work(&self) -> Result<[String; 3], UpstreamError> {
        let result = self.call("eth_getWork", json!([])).await?;
        decode(result, "eth_getWork")
    }

    pub async fn submit_work(&self, nonce: &str, header_hash: &str, mix_digest: &str) -> Result<bool, UpstreamError> {
        let result = self.call("eth_submitWork", json!([nonce, header_hash, mix_digest])).await?;
        result.as_bool().ok_or(UpstreamError::Decode {
            method: "eth_submitWork",
            source: serde::de::Error::custom("expected a bool result"),
        })
    }

    /// Walks parents from `latest` until the accumulated timestamp span is at least
    /// `window`, then returns Σ difficulty ÷ elapsed seconds (spec.md §4.1).
    pub async fn network_hashrate(&self, window: Duration) -> Result<u64, UpstreamError> {
        let window_seconds = window.as_secs().max(1);
        let latest_number = self.block_number().await?;
        let mut block = self.get_block_by_number(latest_number).await?;

        let latest_timestamp = hex_to_u64(&block.timestamp)?;
        let mut total_difficulty: u128 = 0;
        let mut elapsed = 0u64;
        let mut current_number = latest_number;

        loop {
            total_difficulty += hex_to_u64(&block.difficulty)? as u128;
            let block_timestamp = hex_to_u64(&block.timestamp)?;
            elapsed = latest_timestamp.saturating_sub(block_timestamp);

            if elapsed >= window_seconds || current_number == 0 {
                break;
            }
            current_number -= 1;
            block = self.get_block_by_number(current_number).await?;
        }

        let divisor = elapsed.max(1);
        Ok((total_difficulty / divisor as u128) as u64)
    }

    async fn call(&self, method: &'static str, params: Value) -> Result<Value, UpstreamError> {
        let request = RpcRequest { id: 0, jsonrpc: JSONRPC_VERSION, method, params };

        let response = self
            .http
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|source| UpstreamError::Transport { method, source })?;

        let body: RpcResponse = response.json().await.map_err(|source| UpstreamError::Transport { method, source })?;

        if let Some(error) = body.error {
            tracing::warn!(%method, message = %error.message, "upstream node rejected request");
            return Err(UpstreamError::Rpc { method, message: error.message });
        }

        body.result.ok_or(UpstreamError::Rpc { method, message: "missing result".to_owned() })
    }
}

fn as_str<'a>(value: &'a Value, method: &'static str) -> Result<&'a str, UpstreamError> {
    value.as_str().ok_or(UpstreamError::Decode { method, source: serde::de::Error::custom("expected a string result") })
}

fn decode<T: serde::de::DeserializeOwned>(value: Value, method: &'static str) -> Result<T, UpstreamError> {
    serde_json::from_value(value).map_err(|source| UpstreamError::Decode { method, source })
}
