//! Deterministic transaction playlists for load testing
//!
//! A playlist is a reproducible stream of smallbank-style payloads: first the
//! account creations, then a random mix of deposits, check writes, savings
//! adjustments, payments, and amalgamations. Given the same seed the stream is
//! identical, so runs can be compared. Playlists are written one JSON payload
//! per line and later processed into signed batches.

use crate::batch::Batch;
use crate::crypto::{self, KeyPair};
use crate::error::Result;
use crate::transaction::{Transaction, TransactionSpec};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Read, Write};

pub const FAMILY_NAME: &str = "smallbank";
pub const FAMILY_VERSION: &str = "1.0";

/// Number of transactions wrapped into each batch when processing a playlist
pub const DEFAULT_BATCH_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "transaction_type", rename_all = "snake_case")]
pub enum WorkloadPayload {
    CreateAccount {
        customer_id: u32,
        customer_name: String,
        initial_balance: u32,
    },
    DepositChecking {
        customer_id: u32,
        amount: u32,
    },
    WriteCheck {
        customer_id: u32,
        amount: u32,
    },
    /// Savings adjustments may be negative, so the amount is signed
    TransactSavings {
        customer_id: u32,
        amount: i32,
    },
    SendPayment {
        source_customer_id: u32,
        dest_customer_id: u32,
        amount: u32,
    },
    /// Moves the full savings balance from one account to another
    Amalgamate {
        source_customer_id: u32,
        dest_customer_id: u32,
    },
}

impl WorkloadPayload {
    /// State addresses this payload reads and writes.
    pub fn addresses(&self) -> Vec<String> {
        match self {
            WorkloadPayload::CreateAccount { customer_id, .. }
            | WorkloadPayload::DepositChecking { customer_id, .. }
            | WorkloadPayload::WriteCheck { customer_id, .. }
            | WorkloadPayload::TransactSavings { customer_id, .. } => {
                vec![account_address(*customer_id)]
            }
            WorkloadPayload::SendPayment {
                source_customer_id,
                dest_customer_id,
                ..
            }
            | WorkloadPayload::Amalgamate {
                source_customer_id,
                dest_customer_id,
            } => vec![
                account_address(*source_customer_id),
                account_address(*dest_customer_id),
            ],
        }
    }
}

/// State namespace prefix for the workload family: the first 6 hex characters
/// of the SHA-512 of the family name.
pub fn namespace_prefix() -> String {
    crypto::sha512_hex(FAMILY_NAME.as_bytes())[..6].to_string()
}

/// State address of a customer account.
pub fn account_address(customer_id: u32) -> String {
    let digest = crypto::sha512_hex(customer_id.to_string().as_bytes());
    format!("{}{}", namespace_prefix(), &digest[..64])
}

/// Generates a playlist and writes it to `output`, one JSON payload per line.
///
/// The playlist consists of `num_accounts` CreateAccount payloads followed by
/// `num_transactions` payloads drawn at random from the five smallbank
/// transaction kinds. A seed makes the output repeatable.
pub fn generate_playlist(
    output: &mut dyn Write,
    num_accounts: usize,
    num_transactions: usize,
    seed: Option<u64>,
) -> Result<()> {
    for payload in create_playlist(num_accounts, num_transactions, seed) {
        let line = serde_json::to_string(&payload)?;
        writeln!(output, "{}", line)?;
    }
    Ok(())
}

/// The payload iterator behind [`generate_playlist`].
pub fn create_playlist(
    num_accounts: usize,
    num_transactions: usize,
    seed: Option<u64>,
) -> impl Iterator<Item = WorkloadPayload> {
    let rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    WorkloadIter {
        num_accounts,
        current_account: 0,
        num_transactions,
        current_transaction: 0,
        rng,
    }
}

/// Reads a playlist written by [`generate_playlist`].
pub fn read_playlist(input: &mut dyn Read) -> Result<Vec<WorkloadPayload>> {
    let reader = BufReader::new(input);
    let mut payloads = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        payloads.push(serde_json::from_str(&line)?);
    }
    Ok(payloads)
}

/// Signs every payload as a transaction and wraps them into batches of
/// `batch_size`. The same key signs transactions and batches, mirroring a
/// single-client workload.
pub fn process_playlist(
    payloads: &[WorkloadPayload],
    signer: &KeyPair,
    batch_size: usize,
) -> Result<Vec<Batch>> {
    let batch_size = batch_size.max(1);
    let batcher_public_key = signer.public_key_hex();

    let mut batches = Vec::new();
    let mut pending = Vec::with_capacity(batch_size);
    for payload in payloads {
        let addresses = payload.addresses();
        let txn = Transaction::create(
            TransactionSpec {
                family_name: FAMILY_NAME.to_string(),
                family_version: FAMILY_VERSION.to_string(),
                inputs: addresses.clone(),
                outputs: addresses,
                payload: serde_json::to_vec(payload)?,
            },
            signer,
            &batcher_public_key,
        )?;
        pending.push(txn);
        if pending.len() == batch_size {
            batches.push(Batch::create(std::mem::take(&mut pending), signer)?);
        }
    }
    if !pending.is_empty() {
        batches.push(Batch::create(pending, signer)?);
    }
    Ok(batches)
}

struct WorkloadIter {
    num_accounts: usize,
    current_account: usize,
    num_transactions: usize,
    current_transaction: usize,
    rng: StdRng,
}

impl Iterator for WorkloadIter {
    type Item = WorkloadPayload;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_account < self.num_accounts {
            let customer_id = self.current_account as u32;
            self.current_account += 1;
            Some(WorkloadPayload::CreateAccount {
                customer_id,
                customer_name: format!("customer_{:06}", customer_id),
                initial_balance: 1_000_000,
            })
        } else if self.current_transaction < self.num_transactions && self.num_accounts > 0 {
            self.current_transaction += 1;
            let accounts = self.num_accounts as u32;
            // two-party kinds need at least two accounts to pick from
            let kind = if self.num_accounts < 2 {
                self.rng.gen_range(0..3)
            } else {
                self.rng.gen_range(0..5)
            };
            let payload = match kind {
                0 => WorkloadPayload::DepositChecking {
                    customer_id: self.rng.gen_range(0..accounts),
                    amount: self.rng.gen_range(10..200),
                },
                1 => WorkloadPayload::WriteCheck {
                    customer_id: self.rng.gen_range(0..accounts),
                    amount: self.rng.gen_range(10..200),
                },
                2 => WorkloadPayload::TransactSavings {
                    customer_id: self.rng.gen_range(0..accounts),
                    amount: self.rng.gen_range(10..200),
                },
                3 => {
                    let source = self.rng.gen_range(0..accounts);
                    let dest = next_non_matching_in_range(&mut self.rng, accounts, source);
                    WorkloadPayload::SendPayment {
                        source_customer_id: source,
                        dest_customer_id: dest,
                        amount: self.rng.gen_range(10..200),
                    }
                }
                _ => {
                    let source = self.rng.gen_range(0..accounts);
                    let dest = next_non_matching_in_range(&mut self.rng, accounts, source);
                    WorkloadPayload::Amalgamate {
                        source_customer_id: source,
                        dest_customer_id: dest,
                    }
                }
            };
            Some(payload)
        } else {
            None
        }
    }
}

fn next_non_matching_in_range(rng: &mut StdRng, max: u32, exclude: u32) -> u32 {
    let mut selected = exclude;
    while selected == exclude {
        selected = rng.gen_range(0..max);
    }
    selected
}
