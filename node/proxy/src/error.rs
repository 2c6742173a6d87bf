use thiserror::Error;

/// Error-kind taxonomy from spec.md §7. `Malformed`/flood/write-error close the
/// connection; the rest are returned as RPC error responses and the session continues.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Invalid params: {0}")]
    Malformed(String),
    #[error("Invalid wallet: {0}")]
    AuthInvalid(String),
    #[error("not authenticated")]
    NotAuthenticated,
    #[error("Work is outdated, or not requested")]
    WorkUnknown,
    #[error("invalid proof-of-work")]
    PoWInvalid,
    #[error("Pow exists.")]
    ReplayedShare,
    #[error("upstream transport error: {0}")]
    UpstreamTransport(String),
    #[error("Submit fail")]
    UpstreamRejected,
    #[error("Method not found")]
    MethodNotFound,
    #[error("storage failure: {0}")]
    StorageFailure(String),
}

impl SessionError {
    /// Whether this error kind still returns a response on the wire, or terminates the
    /// session outright (spec.md §7's close-vs-respond split).
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }
}
