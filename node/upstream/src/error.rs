use thiserror::Error;

/// Every failure mode of a call to the execution-layer node collapses to one of these —
/// matching spec.md §4.1: "any transport failure or RPC `error` field surfaces as a single
/// opaque failure; callers log and continue on a timer."
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("transport error calling {method}: {source}")]
    Transport { method: &'static str, #[source] source: reqwest::Error },

    #[error("node rejected {method}: {message}")]
    Rpc { method: &'static str, message: String },

    #[error("malformed response from {method}: {source}")]
    Decode { method: &'static str, #[source] source: serde_json::Error },

    #[error("invalid hex value: {0}")]
    InvalidHex(String),
}
