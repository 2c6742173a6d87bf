pub mod codec;
pub mod error;
pub mod request;
pub mod response;

pub use codec::StratumCodec;
pub use error::StratumError;
pub use request::Request;
pub use response::Response;

/// The `[headerHash, seedHash, target, blockNumberHex]` announcement unit.
pub type WorkTuple = [String; 4];

pub mod methods {
    pub const SUBMIT_LOGIN: &str = "eth_submitLogin";
    pub const GET_WORK: &str = "eth_getWork";
    pub const SUBMIT_HASHRATE: &str = "eth_submitHashrate";
    pub const SUBMIT_WORK: &str = "eth_submitWork";
}
