use anyhow::{bail, Result};
use clap::Parser;
use ethers::types::Address;
use log::info;
use std::path::PathBuf;

use airdrop_tools::{
    constants::{Env, DEFAULT_OUTPUT_FILE, NODEREAL_DELAY},
    pagination::{paginate, RetryPolicy},
    report::{create_output, HolderCsv},
    sources::NoderealHolders,
    utils::setup_logger,
};

/// Dumps every holder of a token through Nodereal's `nr_getTokenHolders`.
#[derive(Parser, Debug)]
#[command(name = "token_holders_nodereal", version, about)]
struct Args {
    #[arg(long, env = "TOKEN_ADDRESS")]
    token_address: Address,
    /// Full endpoint; defaults to the opBNB endpoint with NODEREAL_API_KEY
    #[arg(long, env = "NODEREAL_URL")]
    url: Option<String>,
    #[arg(long, default_value_t = 100)]
    page_size: u32,
    #[arg(long, default_value = DEFAULT_OUTPUT_FILE)]
    output: PathBuf,
    /// Give up after this many attempts per page (default: never)
    #[arg(long, env = "RETRY_LIMIT")]
    retry_limit: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    setup_logger()?;
    let args = Args::parse();
    let env = Env::new();

    let url = match args.url {
        Some(url) => url,
        None if !env.nodereal_api_key.is_empty() => env.nodereal_url(),
        None => bail!("set --url or NODEREAL_API_KEY"),
    };

    let source = NoderealHolders::new(url, args.token_address).with_page_size(args.page_size);
    let policy = RetryPolicy::fixed(NODEREAL_DELAY).with_max_attempts(args.retry_limit);
    let mut sink = HolderCsv::new(create_output(&args.output)?);

    let summary = paginate(&source, &policy, &mut sink).await?;
    info!("wrote {} holders to {}", summary.items, args.output.display());
    Ok(())
}
