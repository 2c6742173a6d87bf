use serde::Deserialize;

/// Execution-layer block body, matching `eth_getBlockBy*`'s response shape.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Block {
    #[serde(rename = "parentHash")]
    pub parent_hash: Option<String>,
    #[serde(rename = "difficulty")]
    pub difficulty: String,
    pub number: String,
    #[serde(rename = "timestamp")]
    pub timestamp: String,
    #[serde(rename = "gasUsed")]
    pub gas_used: String,
    #[serde(rename = "baseFeePerGas")]
    pub base_fee_per_gas: Option<String>,
    pub nonce: String,
    pub hash: String,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub uncles: Vec<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Transaction {
    pub hash: String,
    #[serde(rename = "gasPrice")]
    pub gas_price: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TransactionReceipt {
    #[serde(rename = "transactionHash")]
    pub transaction_hash: String,
    #[serde(rename = "gasUsed")]
    pub gas_used: String,
}

/// Fork-activation heights the harvester's static-era-reward table keys off of. The
/// original hardcodes mainnet Ethash constants rather than fetching them over RPC
/// (see DESIGN.md / SPEC_FULL §4.1); this struct exists so a future chain-specific
/// override has somewhere to live without touching the harvester's call sites.
#[derive(Clone, Copy, Debug)]
pub struct ChainConfig {
    pub byzantium_block: u64,
    pub constantinople_block: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self { byzantium_block: 4_370_000, constantinople_block: 7_280_000 }
    }
}

/// Supported Ethash-family networks (spec.md §6 `proxy.daemon.chain`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Chain {
    Mainnet,
    Rinkeby,
    Goerli,
    Ropsten,
    Sepolia,
}

impl std::str::FromStr for Chain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainnet" => Ok(Self::Mainnet),
            "rinkeby" => Ok(Self::Rinkeby),
            "goerli" => Ok(Self::Goerli),
            "ropsten" => Ok(Self::Ropsten),
            "sepolia" => Ok(Self::Sepolia),
            other => Err(format!("unknown chain: {other}")),
        }
    }
}
