use anyhow::Result;
use clap::Parser;
use log::info;
use std::path::PathBuf;

use airdrop_tools::{
    airdrop::AirdropLedger,
    constants::{NFT_ID_TO_RARITY_FILE, RARITY_TO_AMOUNT_FILE},
    table::KeyValueTable,
    utils::setup_logger,
};

/// Sums each owner's airdrop from NFT rarity tiers and prints `owner,amount`.
#[derive(Parser, Debug)]
#[command(name = "calculate_airdrop_amount", version, about)]
struct Args {
    /// `nftId,owner` file
    owners: PathBuf,
    #[arg(long, default_value = RARITY_TO_AMOUNT_FILE)]
    rarity_to_amount: PathBuf,
    #[arg(long, default_value = NFT_ID_TO_RARITY_FILE)]
    nft_id_to_rarity: PathBuf,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    setup_logger()?;
    let args = Args::parse();

    let rarity_to_amount = KeyValueTable::load(&args.rarity_to_amount)?;
    let id_to_rarity = KeyValueTable::load(&args.nft_id_to_rarity)?;
    let id_to_owner = KeyValueTable::load(&args.owners)?;
    info!(
        "{} rarities, {} rated ids, {} owned ids",
        rarity_to_amount.len(),
        id_to_rarity.len(),
        id_to_owner.len()
    );

    let ledger = AirdropLedger::aggregate(&id_to_owner, &id_to_rarity, &rarity_to_amount);
    ledger.write_to(std::io::stdout().lock())?;
    info!("{} owners", ledger.len());
    Ok(())
}
