//! Upstream APIs the fetchers page through.

pub mod nodereal;
pub mod scan;

use ethers::types::U256;
use serde::{Deserialize, Deserializer};

pub use nodereal::NoderealHolders;
pub use scan::{ExplorerSource, HolderItem, TransactionItem};

/// A token holder and its raw balance as decimal text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HolderRecord {
    pub address: String,
    pub balance: String,
}

pub(crate) fn u256_from_hex<'de, D: Deserializer<'de>>(de: D) -> Result<U256, D::Error> {
    let s = String::deserialize(de)?;
    let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(&s);
    if digits.is_empty() {
        return Ok(U256::zero());
    }
    U256::from_str_radix(digits, 16).map_err(|e| serde::de::Error::custom(format!("{s:?}: {e}")))
}
