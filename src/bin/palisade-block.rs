#![forbid(unsafe_code)]
//! Inspect the block store: list known blocks or show one in full.

use chrono::DateTime;
use clap::{Parser, Subcommand};
use colored::*;
use palisade::block::Block;
use palisade::cli::{block_list_table, open_store_from_config};
use palisade::error::ChainError;
use palisade::persistence::BlockStore;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lists blocks newest-first: NUM BLOCK_ID BATS TXNS SIGNER
    List {
        /// Maximum number of rows to print (0 = all)
        #[arg(long, default_value_t = 0)]
        limit: usize,
    },
    /// Shows one block by number or by (a unique prefix of) its id
    Show {
        /// Block number or block id prefix
        block: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    match &cli.command {
        Commands::List { limit } => list(*limit)?,
        Commands::Show { block } => show(block)?,
    }

    Ok(())
}

fn list(limit: usize) -> Result<(), Box<dyn std::error::Error>> {
    let (_config, store) = open_store_from_config()?;
    let blocks = store.list_blocks()?;
    if blocks.is_empty() {
        return Err(ChainError::EmptyChain.into());
    }
    print!("{}", block_list_table(&blocks, limit));
    Ok(())
}

fn show(reference: &str) -> Result<(), Box<dyn std::error::Error>> {
    let (_config, store) = open_store_from_config()?;

    let block = match reference.parse::<u64>() {
        Ok(num) => store.block_by_num(num)?,
        Err(_) => store.block_by_id(reference)?,
    }
    .ok_or_else(|| ChainError::BlockNotFound(reference.to_string()))?;

    print_block(&block);
    Ok(())
}

fn print_block(block: &Block) {
    if block.is_genesis() {
        println!(
            "{} {}",
            "Block 0".bright_cyan().bold(),
            "(genesis block)".bright_magenta()
        );
    } else {
        println!("{}", format!("Block {}", block.num()).bright_cyan().bold());
    }
    println!("  block id:       {}", block.id().bright_yellow());
    println!("  previous id:    {}", block.header.previous_block_id);
    println!("  signer:         {}", block.header.signer_public_key);
    println!("  consensus:      {}", block.header.consensus);
    println!("  state root:     {}", block.header.state_root_hash);
    println!("  published:      {}", format_timestamp(block.header.timestamp));
    println!("  batches:        {}", block.batch_count());
    println!("  transactions:   {}", block.transaction_count());
    for batch in &block.batches {
        println!("    {} {}", "batch".bright_white(), batch.id());
        for txn in &batch.transactions {
            println!(
                "      {} {} ({} v{})",
                "txn".bright_white(),
                txn.id(),
                txn.header.family_name,
                txn.header.family_version
            );
        }
    }
}

fn format_timestamp(timestamp: i64) -> String {
    match DateTime::from_timestamp(timestamp, 0) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => "Invalid".to_string(),
    }
}
