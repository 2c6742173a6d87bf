use ethereum_types::{H256, U256};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VerifierError {
    #[error("invalid hex value: {0}")]
    InvalidHex(String),
}

/// Process-wide Ethash seal checker. The DAG/cache backing it is expensive to
/// build, so one instance is constructed at startup and shared by every session.
pub struct Verifier {
    manager: ethash::EthashManager,
}

impl Verifier {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { manager: ethash::EthashManager::new(cache_dir, ethash::OptimizeFor::Cpu, u64::MAX) }
    }

    /// Runs the Ethash seal check at the given difficulty (derived from the pool
    /// target via [`crate::difficulty::target_to_difficulty`]). Returns `true`
    /// when the nonce/mix pair satisfies that difficulty's boundary.
    pub fn verify(&self, block_number: u64, header_hash: H256, nonce: u64, mix_digest: H256, boundary: H256) -> bool {
        let result = self.manager.compute_light(block_number, &header_hash, nonce);
        H256(result.mix_hash) == mix_digest && boundary_satisfied(&H256(result.value), &boundary)
    }

    /// The Ethash seed hash for the epoch containing `block_number`.
    pub fn seed_hash(&self, block_number: u64) -> H256 {
        let seed = ethash::SeedHashCompute::default().hash_block_number(block_number);
        H256::from_slice(&seed[..])
    }
}

fn boundary_satisfied(value: &H256, boundary: &H256) -> bool {
    value <= boundary
}

/// Thin wrapper over `ethash::difficulty_to_boundary`, the canonical
/// difficulty -> boundary conversion used by the pool-target seal check.
pub fn difficulty_to_boundary(difficulty: U256) -> H256 {
    ethash::difficulty_to_boundary(&difficulty)
}

pub fn decode_hash(hex: &str) -> Result<H256, VerifierError> {
    let cleaned = hex.strip_prefix("0x").unwrap_or(hex);
    let bytes = hex::decode(cleaned).map_err(|_| VerifierError::InvalidHex(hex.to_owned()))?;
    if bytes.len() != 32 {
        return Err(VerifierError::InvalidHex(hex.to_owned()));
    }
    Ok(H256::from_slice(&bytes))
}

pub fn decode_nonce(hex: &str) -> Result<u64, VerifierError> {
    let cleaned = hex.strip_prefix("0x").unwrap_or(hex);
    u64::from_str_radix(cleaned, 16).map_err(|_| VerifierError::InvalidHex(hex.to_owned()))
}
