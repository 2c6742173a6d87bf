use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A stratum JSON-RPC 2.0 response line, including unsolicited pushes (`id = 0`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Response {
    pub id: i64,
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

impl Response {
    pub fn ok(id: i64, result: impl Into<Value>) -> Self {
        Self { id, jsonrpc: crate::request::Request::VERSION.to_owned(), result: Some(result.into()), error: None }
    }

    pub fn err(id: i64, reason: impl Into<String>) -> Self {
        Self {
            id,
            jsonrpc: crate::request::Request::VERSION.to_owned(),
            result: None,
            error: Some(Value::String(reason.into())),
        }
    }

    /// Builds the unsolicited `id: 0` work push sent to a subscribed session:
    /// `[headerHash, seedHash, poolTarget, blockNumberHex]`.
    pub fn work_push(tuple: &[String; 4]) -> Self {
        Self::ok(0, Value::Array(tuple.iter().cloned().map(Value::String).collect()))
    }
}
