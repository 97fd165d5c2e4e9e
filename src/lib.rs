pub mod airdrop;
pub mod constants;
pub mod error;
pub mod pagination;
pub mod report;
pub mod sources;
pub mod staking;
pub mod table;
pub mod utils;

pub use error::{Result, ToolError};
