#![forbid(unsafe_code)]
//! Generate and process transaction playlists for load testing.
//!
//! `generate` writes a reproducible playlist of smallbank-style payloads;
//! `process` signs a playlist into batches ready for `palisade-batch submit`.

use clap::{Parser, Subcommand};
use colored::*;
use palisade::cli::load_signing_key;
use palisade::config::load_config;
use palisade::workload::{self, DEFAULT_BATCH_SIZE};
use std::fs::File;
use std::io::{self, Read, Write};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Writes a playlist, one JSON payload per line
    Generate {
        /// Number of accounts to create before the random transactions
        #[arg(long, default_value_t = 10)]
        accounts: usize,
        /// Number of random transactions after the account creations
        #[arg(long, default_value_t = 100)]
        transactions: usize,
        /// Seed for repeatable output
        #[arg(long)]
        seed: Option<u64>,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Signs a playlist into batches, one JSON batch per line
    Process {
        /// Playlist file (stdin when omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Transactions per batch
        #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
        batch_size: usize,
        /// Name of the signing key
        #[arg(long)]
        key: Option<String>,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Generate {
            accounts,
            transactions,
            seed,
            output,
        } => generate(*accounts, *transactions, *seed, output.as_deref())?,
        Commands::Process {
            input,
            batch_size,
            key,
            output,
        } => process(input.as_deref(), *batch_size, key.as_deref(), output.as_deref())?,
    }

    Ok(())
}

fn generate(
    accounts: usize,
    transactions: usize,
    seed: Option<u64>,
    output: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut writer: Box<dyn Write> = match output {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(io::stdout()),
    };
    workload::generate_playlist(&mut writer, accounts, transactions, seed)?;

    eprintln!(
        "{}",
        format!(
            "Generated playlist: {} account(s), {} transaction(s)",
            accounts, transactions
        )
        .bright_green()
    );
    Ok(())
}

fn process(
    input: Option<&str>,
    batch_size: usize,
    key: Option<&str>,
    output: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let signer = load_signing_key(&config, key)?;

    let mut reader: Box<dyn Read> = match input {
        Some(path) => Box::new(File::open(path)?),
        None => Box::new(io::stdin()),
    };
    let payloads = workload::read_playlist(&mut reader)?;
    let batches = workload::process_playlist(&payloads, &signer, batch_size)?;

    let mut writer: Box<dyn Write> = match output {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(io::stdout()),
    };
    for batch in &batches {
        writeln!(writer, "{}", serde_json::to_string(batch)?)?;
    }

    eprintln!(
        "{}",
        format!(
            "Processed {} payload(s) into {} batch(es)",
            payloads.len(),
            batches.len()
        )
        .bright_green()
    );
    Ok(())
}
