#![forbid(unsafe_code)]
//! Create the genesis block: block 0, carrying the initial on-chain settings
//! (most importantly the consensus algorithm selection).

use clap::Parser;
use colored::*;
use palisade::cli::{load_signing_key, open_store_from_config};
use palisade::error::ChainError;
use palisade::genesis::{build_genesis, CONSENSUS_SETTING};
use palisade::persistence::BlockStore;
use palisade::transaction::short_id;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Consensus algorithm to record on-chain (defaults to devmode)
    #[arg(long)]
    consensus: Option<String>,

    /// Additional settings as key=value pairs, repeatable
    #[arg(short = 's', long = "setting")]
    settings: Vec<String>,

    /// Name of the validator key to sign with
    #[arg(long)]
    key: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let (config, store) = open_store_from_config()?;
    if store.block_count()? > 0 {
        return Err(ChainError::GenesisExists.into());
    }

    let mut settings: Vec<(String, String)> = Vec::new();
    if let Some(consensus) = &cli.consensus {
        settings.push((CONSENSUS_SETTING.to_string(), consensus.clone()));
    }
    for entry in &cli.settings {
        let (key, value) = entry.split_once('=').ok_or_else(|| {
            ChainError::ConfigError(format!("Setting '{}' is not of the form key=value", entry))
        })?;
        settings.push((key.to_string(), value.to_string()));
    }

    let signer = load_signing_key(&config, cli.key.as_deref())?;
    let genesis = build_genesis(&settings, &signer)?;
    store.put_block(&genesis)?;

    println!("{}", "Genesis block created".bright_green());
    println!("  block id:  {}", short_id(genesis.id()).bright_yellow());
    println!("  consensus: {}", genesis.header.consensus.bright_white());
    println!(
        "  settings:  {} transaction(s) in {} batch(es)",
        genesis.transaction_count(),
        genesis.batch_count()
    );

    Ok(())
}
