#![forbid(unsafe_code)]
//! Publish the pending-batch queue as the next block on the chain.

use clap::Parser;
use colored::*;
use palisade::chain::publish_block;
use palisade::cli::{load_signing_key, open_store_from_config};
use palisade::error::ChainError;
use palisade::persistence::BlockStore;
use palisade::transaction::short_id;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Name of the validator key to sign with
    #[arg(long)]
    key: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let (config, store) = open_store_from_config()?;
    let head = store.chain_head()?.ok_or(ChainError::EmptyChain)?;

    let pending = store.pending_batches()?;
    if pending.is_empty() {
        println!("{}", "Nothing to publish: the batch queue is empty.".yellow());
        return Ok(());
    }

    let signer = load_signing_key(&config, cli.key.as_deref())?;
    let block = publish_block(&head, pending, &signer)?;

    // Persist first, then clear the queue; a failed put leaves the queue intact.
    store.put_block(&block)?;
    store.drain_pending()?;

    println!("{}", "Block published".bright_green());
    println!("  number:    {}", block.num().to_string().bright_white());
    println!("  block id:  {}", short_id(block.id()).bright_yellow());
    println!(
        "  contents:  {} batch(es), {} transaction(s)",
        block.batch_count(),
        block.transaction_count()
    );
    println!("  consensus: {}", block.header.consensus);

    Ok(())
}
