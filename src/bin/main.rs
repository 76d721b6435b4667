#![forbid(unsafe_code)]

use colored::*;

fn main() {
    println!("{}", "Palisade CLI".bright_cyan().bold());
    println!("{}", "------------".bright_cyan());
    println!();
    println!(
        "{}",
        "This is the main entry point, but each command is a separate binary.".yellow()
    );
    println!(
        "{}",
        "Use 'cargo run --bin <binary_name>' to run a specific command.".yellow()
    );
    println!();
    println!("{}", "Available binaries:".bright_green().underline());
    println!("  - {}", "palisade-keygen".bright_white());
    println!("  - {}", "palisade-genesis".bright_white());
    println!("  - {}", "palisade-block".bright_white());
    println!("  - {}", "palisade-batch".bright_white());
    println!("  - {}", "palisade-publish".bright_white());
    println!("  - {}", "palisade-workload".bright_white());
    println!();
    println!("{}", "Example:".bright_green().underline());
    println!("{}", "  cargo run --bin palisade-block -- list".italic());
}
