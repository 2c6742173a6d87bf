use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single stratum JSON-RPC 2.0 request line.
///
/// `worker` is a miner-specific extension some older clients send as a sibling of
/// `params` rather than encoding `wallet.worker` inside `params[0]`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Request {
    pub id: i64,
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker: Option<String>,
}

impl Request {
    pub const VERSION: &'static str = "2.0";

    /// Returns `params` as a `Vec<String>`, the shape every stratum method in this
    /// proxy expects. Non-string entries or a non-array `params` are rejected.
    pub fn string_params(&self) -> Option<Vec<String>> {
        let array = self.params.as_array()?;
        array.iter().map(|value| value.as_str().map(str::to_owned)).collect()
    }
}
