use anyhow::{bail, Context, Result};
use clap::Parser;
use ethers::{
    providers::{Http, Provider},
    types::Address,
};
use std::time::Duration;

use airdrop_tools::{
    constants::DEFAULT_RANGE_BLOCK_NUMBER,
    pagination::RetryPolicy,
    staking::{write_stake_report, StakeScanner},
    utils::setup_logger,
};

/// Snapshots every stake of the staking contract up to a block, as CSV on stdout.
#[derive(Parser, Debug)]
#[command(name = "stake_info", version, about)]
struct Args {
    /// Blockchain rpc node
    #[arg(long, env = "RPC_URL")]
    rpc: String,
    /// Staking contract address
    #[arg(long = "xter-staking-address")]
    staking_address: Address,
    /// Block the staking contract was deployed at
    #[arg(long = "deploy-block-number", default_value_t = 0)]
    deploy_block_number: u64,
    /// Snapshot block
    #[arg(long = "end-block-number", default_value_t = 0)]
    end_block_number: u64,
    /// Blocks per eth_getLogs query
    #[arg(long = "range-block-number", default_value_t = DEFAULT_RANGE_BLOCK_NUMBER)]
    range_block_number: u64,
    #[arg(long, env = "RETRY_LIMIT")]
    retry_limit: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    setup_logger()?;
    let args = Args::parse();

    if args.end_block_number < args.deploy_block_number {
        bail!(
            "end block {} is before deploy block {}",
            args.end_block_number,
            args.deploy_block_number
        );
    }

    let provider = Provider::<Http>::try_from(args.rpc.as_str())
        .with_context(|| format!("invalid rpc url {}", args.rpc))?;

    let scanner = StakeScanner {
        contract: args.staking_address,
        from_block: args.deploy_block_number,
        to_block: args.end_block_number,
        range: args.range_block_number,
        policy: RetryPolicy::fixed(Duration::ZERO).with_max_attempts(args.retry_limit),
        show_progress: true,
    };

    let book = scanner.scan(&provider).await?;
    write_stake_report(&book.reconcile(), std::io::stdout().lock())?;
    Ok(())
}
