#![forbid(unsafe_code)]
//! Generate a named signing key and store it in the key directory.

use clap::Parser;
use colored::*;
use palisade::config::load_config;
use palisade::keyfile::KeyFile;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Name of the key to create (defaults to the configured default key)
    name: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let config = load_config()?;
    let name = cli.name.unwrap_or_else(|| config.keys.default_name.clone());

    let keyfile = KeyFile::generate(&name);
    let path = keyfile.save(&config.key_dir()?)?;

    println!("{}", "Key generated".bright_green());
    println!("  name:       {}", name.bright_white());
    println!("  public key: {}", keyfile.public_key.bright_yellow());
    println!("  stored at:  {}", path.display());

    Ok(())
}
