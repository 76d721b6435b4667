//! Integration tests for the block listing surface

use palisade::chain::{publish_block, Chain};
use palisade::cli::{block_list_table, BLOCK_LIST_HEADER};
use palisade::crypto::KeyPair;
use palisade::genesis::build_genesis;
use palisade::workload;

/// Helper to build a chain with the given number of blocks on top of genesis
fn build_chain(extra_blocks: usize) -> Result<Chain, Box<dyn std::error::Error>> {
    let keypair = KeyPair::generate();
    let mut chain = Chain::new();
    chain.append(build_genesis(&[], &keypair)?)?;

    for i in 0..extra_blocks {
        let payloads: Vec<_> = workload::create_playlist(2, 3, Some(i as u64)).collect();
        let batches = workload::process_playlist(&payloads, &keypair, 2)?;
        let block = publish_block(chain.head().ok_or("no head")?, batches, &keypair)?;
        chain.append(block)?;
    }
    Ok(chain)
}

fn render(chain: &Chain, limit: usize) -> String {
    let blocks: Vec<_> = chain.iter_newest_first().cloned().collect();
    block_list_table(&blocks, limit)
}

#[test]
fn test_header_matches_documented_columns() -> Result<(), Box<dyn std::error::Error>> {
    let chain = build_chain(2)?;
    let table = render(&chain, 0);

    let header: Vec<&str> = table.lines().next().ok_or("empty table")?.split_whitespace().collect();
    assert_eq!(header, BLOCK_LIST_HEADER.to_vec());
    assert_eq!(header, vec!["NUM", "BLOCK_ID", "BATS", "TXNS", "SIGNER"]);
    Ok(())
}

#[test]
fn test_exactly_one_genesis_row() -> Result<(), Box<dyn std::error::Error>> {
    let chain = build_chain(3)?;
    let table = render(&chain, 0);

    let genesis_rows = table
        .lines()
        .skip(1)
        .filter(|line| line.split_whitespace().next() == Some("0"))
        .count();
    assert_eq!(genesis_rows, 1);

    // and genesis is the last row, since listing is newest-first
    let last = table.lines().last().ok_or("no rows")?;
    assert_eq!(last.split_whitespace().next(), Some("0"));
    Ok(())
}

#[test]
fn test_block_ids_are_128_char_hex() -> Result<(), Box<dyn std::error::Error>> {
    let chain = build_chain(2)?;
    let table = render(&chain, 0);

    for line in table.lines().skip(1) {
        let id = line.split_whitespace().nth(1).ok_or("missing id column")?;
        assert_eq!(id.len(), 128);
        assert!(id.bytes().all(|b| b.is_ascii_hexdigit()));
    }
    Ok(())
}

#[test]
fn test_rows_descend_from_head_to_genesis() -> Result<(), Box<dyn std::error::Error>> {
    let chain = build_chain(4)?;
    let table = render(&chain, 0);

    let nums: Vec<u64> = table
        .lines()
        .skip(1)
        .map(|line| line.split_whitespace().next().unwrap().parse().unwrap())
        .collect();
    assert_eq!(nums, vec![4, 3, 2, 1, 0]);
    Ok(())
}

#[test]
fn test_batch_and_txn_counts_reported() -> Result<(), Box<dyn std::error::Error>> {
    let chain = build_chain(1)?;
    let table = render(&chain, 0);

    // head block: 5 payloads (2 accounts + 3 transactions) in batches of 2
    let head_row = table.lines().nth(1).ok_or("no head row")?;
    let cells: Vec<&str> = head_row.split_whitespace().collect();
    assert_eq!(cells[2], "3"); // BATS
    assert_eq!(cells[3], "5"); // TXNS
    Ok(())
}

#[test]
fn test_signer_column_is_truncated_pubkey() -> Result<(), Box<dyn std::error::Error>> {
    let chain = build_chain(1)?;
    let signer_key = chain.head().ok_or("no head")?.header.signer_public_key.clone();
    let table = render(&chain, 0);

    for line in table.lines().skip(1) {
        let signer = line.split_whitespace().last().ok_or("missing signer")?;
        assert!(signer.ends_with("..."));
        assert_eq!(&signer[..8], &signer_key[..8]);
    }
    Ok(())
}

#[test]
fn test_limit_shows_newest_blocks() -> Result<(), Box<dyn std::error::Error>> {
    let chain = build_chain(5)?;
    let table = render(&chain, 3);

    let nums: Vec<&str> = table
        .lines()
        .skip(1)
        .map(|line| line.split_whitespace().next().unwrap())
        .collect();
    assert_eq!(nums, vec!["5", "4", "3"]);
    Ok(())
}
