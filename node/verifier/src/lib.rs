pub mod difficulty;
pub mod seal;

pub use difficulty::{difficulty_to_target, target_to_difficulty};
pub use seal::{decode_hash, decode_nonce, difficulty_to_boundary, Verifier, VerifierError};
