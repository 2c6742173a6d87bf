//! Configuration loading and process lifecycle for the poolproxy mining-pool proxy
//! (spec.md §4.9/§6). Wires the Upstream Client, Store, Proxy, State Aggregator, and
//! Harvester crates together behind a single `Config`/`Node` pair.

mod config;
mod error;
mod node;

pub use config::Config;
pub use error::ConfigError;
pub use node::Node;
