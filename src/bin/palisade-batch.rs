#![forbid(unsafe_code)]
//! Manage the pending-batch queue: submit processed batches and list what is
//! waiting to be published.

use clap::{Parser, Subcommand};
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color as TableColor, ContentArrangement, Table};
use palisade::batch::Batch;
use palisade::cli::{format_signer, open_store_from_config};
use palisade::persistence::BlockStore;
use palisade::transaction::short_id;
use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validates batches from a processed workload file and queues them
    Submit {
        /// File of signed batches, one JSON batch per line
        input: String,
    },
    /// Lists the pending-batch queue
    List,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Submit { input } => submit(input)?,
        Commands::List => list()?,
    }

    Ok(())
}

fn submit(input: &str) -> Result<(), Box<dyn std::error::Error>> {
    let (_config, store) = open_store_from_config()?;

    let reader = BufReader::new(File::open(input)?);
    let mut submitted = 0usize;
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let batch: Batch = serde_json::from_str(&line)?;
        batch.validate()?;
        store.queue_batch(&batch)?;
        submitted += 1;
    }

    println!(
        "{}",
        format!("Queued {} batch(es) for publication", submitted).bright_green()
    );
    Ok(())
}

fn list() -> Result<(), Box<dyn std::error::Error>> {
    let (_config, store) = open_store_from_config()?;
    let pending = store.pending_batches()?;

    if pending.is_empty() {
        println!("{}", "No pending batches.".yellow());
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Batch")
                .fg(TableColor::Cyan)
                .add_attribute(Attribute::Bold),
            Cell::new("Txns")
                .fg(TableColor::Cyan)
                .add_attribute(Attribute::Bold),
            Cell::new("Signer")
                .fg(TableColor::Cyan)
                .add_attribute(Attribute::Bold),
        ]);

    for batch in &pending {
        table.add_row(vec![
            Cell::new(short_id(batch.id())).fg(TableColor::White),
            Cell::new(batch.transaction_count()).fg(TableColor::White),
            Cell::new(format_signer(&batch.header.signer_public_key)).fg(TableColor::Grey),
        ]);
    }

    println!("{}", table);
    println!("{} pending batch(es)", pending.len());
    Ok(())
}
