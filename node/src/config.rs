//! JSON configuration tree, field-for-field compatible with
//! `original_source/config/*.go`'s JSON tags (spec.md §6).

use crate::error::ConfigError;

use poolproxy_node_upstream::Chain;

use serde::{de::Error as _, Deserialize, Deserializer};
use std::{net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    #[serde(default = "default_threads")]
    pub threads: usize,
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub debugger: Debugger,
    #[serde(default)]
    pub logger: Logger,
    #[serde(default)]
    pub postgres: Postgres,
    #[serde(default)]
    pub proxy: Proxy,
    #[serde(default)]
    pub harvester: Harvester,
    /// Accepted so a config file written for the original system still deserializes;
    /// no component in spec.md's §2 table consumes it (DESIGN.md Open Question (d)).
    #[serde(default)]
    pub redis: Option<serde_json::Value>,
    /// Same treatment as `redis`: accepted, never read.
    #[serde(default)]
    pub api: Option<serde_json::Value>,
}

impl Config {
    /// Loads and validates a config file. Invalid `poolFeeAddress`/`depth`/`immatureDepth`
    /// are fatal here, at load time, not once the harvester is already ticking (spec.md §7).
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.to_owned(), source })?;
        let config: Config = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse { path: path.to_owned(), source })?;
        if config.harvester.enabled {
            config.harvester.as_harvester_config().validate()?;
        }
        Ok(config)
    }
}

fn default_threads() -> usize {
    num_cpus_fallback()
}

fn num_cpus_fallback() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

fn default_name() -> String {
    "poolproxy".to_owned()
}

#[derive(Clone, Debug, Deserialize)]
pub struct Debugger {
    #[serde(default)]
    pub enable: bool,
    #[serde(default = "default_debugger_listen")]
    pub listen: SocketAddr,
}

impl Default for Debugger {
    fn default() -> Self {
        Self { enable: false, listen: default_debugger_listen() }
    }
}

fn default_debugger_listen() -> SocketAddr {
    "127.0.0.1:9000".parse().unwrap()
}

#[derive(Clone, Debug, Deserialize)]
pub struct Logger {
    #[serde(default = "default_logger_mode")]
    pub mode: String,
    #[serde(default = "default_logger_file")]
    pub file: PathBuf,
    #[serde(default)]
    pub level: u8,
}

impl Default for Logger {
    fn default() -> Self {
        Self { mode: default_logger_mode(), file: default_logger_file(), level: 0 }
    }
}

fn default_logger_mode() -> String {
    "stdout".to_owned()
}

fn default_logger_file() -> PathBuf {
    PathBuf::from("poolproxy.log")
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Postgres {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Proxy {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_proxy_listen")]
    pub listen: SocketAddr,
    #[serde(default = "default_timeout", deserialize_with = "deserialize_duration")]
    pub timeout: Duration,
    #[serde(rename = "maxConn", default = "default_max_connections")]
    pub max_connections: usize,
    #[serde(default)]
    pub target: String,
    #[serde(rename = "stateInterval", default = "default_state_interval", deserialize_with = "deserialize_duration")]
    pub state_interval: Duration,
    #[serde(default)]
    pub daemon: Daemon,
}

impl Default for Proxy {
    fn default() -> Self {
        Self {
            enabled: false,
            listen: default_proxy_listen(),
            timeout: default_timeout(),
            max_connections: default_max_connections(),
            target: String::new(),
            state_interval: default_state_interval(),
            daemon: Daemon::default(),
        }
    }
}

fn default_proxy_listen() -> SocketAddr {
    "0.0.0.0:8008".parse().unwrap()
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_max_connections() -> usize {
    8192
}

fn default_state_interval() -> Duration {
    Duration::from_secs(10)
}

#[derive(Clone, Debug, Deserialize)]
pub struct Daemon {
    #[serde(default = "default_daemon_host")]
    pub host: String,
    #[serde(default = "default_daemon_port")]
    pub port: u16,
    #[serde(rename = "notifyWorkUrl", default = "default_notify_listen")]
    pub notify_listen: SocketAddr,
    #[serde(default = "default_chain", deserialize_with = "deserialize_chain")]
    pub chain: Chain,
}

impl Default for Daemon {
    fn default() -> Self {
        Self { host: default_daemon_host(), port: default_daemon_port(), notify_listen: default_notify_listen(), chain: default_chain() }
    }
}

fn default_daemon_host() -> String {
    "127.0.0.1".to_owned()
}

fn default_daemon_port() -> u16 {
    8545
}

fn default_notify_listen() -> SocketAddr {
    "0.0.0.0:8009".parse().unwrap()
}

fn default_chain() -> Chain {
    Chain::Mainnet
}

#[derive(Clone, Debug, Deserialize)]
pub struct Harvester {
    #[serde(default)]
    pub enabled: bool,
    #[serde(rename = "poolFee", default)]
    pub pool_fee: f64,
    #[serde(rename = "poolFeeAddress", default)]
    pub pool_fee_address: Option<String>,
    #[serde(default = "default_depth")]
    pub depth: u64,
    #[serde(rename = "immatureDepth", default = "default_immature_depth")]
    pub immature_depth: u64,
    #[serde(rename = "keepTxFees", default)]
    pub keep_tx_fees: bool,
    #[serde(default = "default_harvester_interval", deserialize_with = "deserialize_duration")]
    pub interval: Duration,
}

impl Default for Harvester {
    fn default() -> Self {
        Self {
            enabled: false,
            pool_fee: 0.0,
            pool_fee_address: None,
            depth: default_depth(),
            immature_depth: default_immature_depth(),
            keep_tx_fees: false,
            interval: default_harvester_interval(),
        }
    }
}

impl Harvester {
    pub fn as_harvester_config(&self) -> poolproxy_node_harvester::HarvesterConfig {
        poolproxy_node_harvester::HarvesterConfig {
            pool_fee: self.pool_fee,
            pool_fee_address: self.pool_fee_address.clone(),
            depth: self.depth,
            immature_depth: self.immature_depth,
            keep_tx_fees: self.keep_tx_fees,
        }
    }
}

fn default_depth() -> u64 {
    32
}

fn default_immature_depth() -> u64 {
    16
}

fn default_harvester_interval() -> Duration {
    Duration::from_secs(60)
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    humantime::parse_duration(&raw).map_err(D::Error::custom)
}

fn deserialize_chain<'de, D>(deserializer: D) -> Result<Chain, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Chain::from_str(&raw).map_err(D::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "threads": 4,
        "name": "my-pool",
        "logger": { "mode": "file", "file": "/var/log/poolproxy.log", "level": 1 },
        "postgres": { "address": "localhost", "database": "pool", "username": "pool", "password": "secret" },
        "proxy": {
            "enabled": true,
            "listen": "0.0.0.0:8008",
            "timeout": "30s",
            "maxConn": 4096,
            "target": "0x00000000ffff0000000000000000000000000000000000000000000000000",
            "stateInterval": "10s",
            "daemon": { "host": "127.0.0.1", "port": 8545, "notifyWorkUrl": "0.0.0.0:8009", "chain": "mainnet" }
        },
        "harvester": {
            "enabled": true,
            "poolFee": 1.5,
            "poolFeeAddress": "0x000000000000000000000000000000000000dEaD",
            "depth": 64,
            "immatureDepth": 20,
            "keepTxFees": false,
            "interval": "1m"
        }
    }"#;

    #[test]
    fn parses_camel_case_field_names_and_duration_strings() {
        let config: Config = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(config.threads, 4);
        assert_eq!(config.proxy.max_connections, 4096);
        assert_eq!(config.proxy.timeout, Duration::from_secs(30));
        assert_eq!(config.proxy.state_interval, Duration::from_secs(10));
        assert_eq!(config.proxy.daemon.notify_listen, "0.0.0.0:8009".parse().unwrap());
        assert_eq!(config.proxy.daemon.chain, Chain::Mainnet);
        assert_eq!(config.harvester.immature_depth, 20);
        assert_eq!(config.harvester.keep_tx_fees, false);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert!(!config.proxy.enabled);
        assert!(!config.harvester.enabled);
        assert_eq!(config.logger.mode, "stdout");
    }

    #[test]
    fn redis_and_api_sections_are_accepted_but_unused() {
        let config: Config =
            serde_json::from_str(r#"{"redis": {"url": "redis://localhost"}, "api": {"listen": "0.0.0.0:8080"}}"#).unwrap();
        assert!(config.redis.is_some());
        assert!(config.api.is_some());
    }
}
