use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    /// The anti-replay check in [`crate::Store::write_share`] found a prior row with the
    /// same `pow` string inside the 8-block window (spec.md §4.5/§8 P1).
    #[error("Pow exists.")]
    ReplayedShare,
}
