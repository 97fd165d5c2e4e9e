use std::time::Duration;

pub const PROJECT_NAME: &str = "airdrop_tools";

pub const BINARIES: [&str; 5] = [
    "calculate_airdrop_amount",
    "token_holders_nodereal",
    "token_holders_scan",
    "transactions_fee_scan",
    "stake_info",
];

pub const NODEREAL_BASE_URL: &str = "https://opbnb-mainnet.nodereal.io/v1";
pub const NODEREAL_PAGE_SIZE: &str = "0x64";
pub const NODEREAL_DELAY: Duration = Duration::from_secs(2);

pub const SCAN_BASE_URL: &str = "https://bnb.xterscan.io/api/v2";
pub const SCAN_DELAY: Duration = Duration::from_secs(5);

pub const RARITY_TO_AMOUNT_FILE: &str = "rarity-to-amount.txt";
pub const NFT_ID_TO_RARITY_FILE: &str = "nftId-to-rarity.txt";
pub const DEFAULT_OUTPUT_FILE: &str = "result.csv";

pub const DEFAULT_RANGE_BLOCK_NUMBER: u64 = 10_000;

pub fn get_env(key: &str) -> String {
    std::env::var(key).unwrap_or_default()
}

/// Settings read straight from `.env` / the process environment. The
/// remaining knobs are clap flags with `env` fallbacks on each binary.
#[derive(Debug, Clone)]
pub struct Env {
    pub nodereal_api_key: String,
    pub log_level: String,
}

impl Env {
    pub fn new() -> Self {
        Env {
            nodereal_api_key: get_env("NODEREAL_API_KEY"),
            log_level: get_env("LOG_LEVEL"),
        }
    }

    pub fn nodereal_url(&self) -> String {
        format!("{}/{}", NODEREAL_BASE_URL, self.nodereal_api_key)
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}
