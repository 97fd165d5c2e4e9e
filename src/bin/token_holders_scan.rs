use anyhow::Result;
use clap::Parser;
use ethers::types::Address;
use log::info;
use std::path::PathBuf;

use airdrop_tools::{
    constants::{DEFAULT_OUTPUT_FILE, SCAN_BASE_URL, SCAN_DELAY},
    pagination::{paginate, RetryPolicy},
    report::{create_output, HolderCsv},
    sources::{ExplorerSource, HolderItem},
    utils::setup_logger,
};

/// Dumps every holder of a token from the explorer's holders endpoint.
#[derive(Parser, Debug)]
#[command(name = "token_holders_scan", version, about)]
struct Args {
    #[arg(long, env = "TOKEN_ADDRESS")]
    token_address: Address,
    #[arg(long, env = "SCAN_BASE_URL", default_value = SCAN_BASE_URL)]
    scan_base_url: String,
    #[arg(long, default_value = DEFAULT_OUTPUT_FILE)]
    output: PathBuf,
    #[arg(long, env = "RETRY_LIMIT")]
    retry_limit: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    setup_logger()?;
    let args = Args::parse();

    let source = ExplorerSource::<HolderItem>::token_holders(&args.scan_base_url, args.token_address)?;
    info!("fetching {}", source.url());
    let policy = RetryPolicy::fixed(SCAN_DELAY).with_max_attempts(args.retry_limit);
    let mut sink = HolderCsv::new(create_output(&args.output)?);

    let summary = paginate(&source, &policy, &mut sink).await?;
    info!("wrote {} holders to {}", summary.items, args.output.display());
    Ok(())
}
