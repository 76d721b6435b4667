//! Chain management: linkage rules, append validation, block publishing

use crate::batch::Batch;
use crate::block::Block;
use crate::crypto::KeyPair;
use crate::error::{ChainError, Result};
use crate::genesis::DEFAULT_CONSENSUS;
use crate::transaction::short_id;
use log::{info, warn};

/// An in-memory view of the chain, blocks in ascending order. Construction and
/// every append re-check the linkage invariants, so a `Chain` is valid by
/// construction.
#[derive(Debug, Clone, Default)]
pub struct Chain {
    blocks: Vec<Block>,
}

impl Chain {
    pub fn new() -> Self {
        Chain { blocks: Vec::new() }
    }

    /// Builds a chain from blocks in ascending order, validating every block
    /// and every link.
    pub fn from_blocks(blocks: Vec<Block>) -> Result<Self> {
        let mut chain = Chain::new();
        for block in blocks {
            chain.append(block)?;
        }
        Ok(chain)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn head(&self) -> Option<&Block> {
        self.blocks.last()
    }

    pub fn genesis(&self) -> Option<&Block> {
        self.blocks.first()
    }

    /// The consensus algorithm currently in force: the head's, or the default
    /// before any block exists.
    pub fn consensus(&self) -> &str {
        self.head()
            .map(|b| b.header.consensus.as_str())
            .unwrap_or(DEFAULT_CONSENSUS)
    }

    /// Blocks newest-first, the order `block list` prints them in.
    pub fn iter_newest_first(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter().rev()
    }

    /// Validates `block` against the current head and appends it.
    pub fn append(&mut self, block: Block) -> Result<()> {
        block.validate()?;

        match self.head() {
            None => {
                if !block.is_genesis() {
                    return Err(ChainError::InvalidBlockLinkage(format!(
                        "First block must be the genesis block, got block {}",
                        block.num()
                    )));
                }
            }
            Some(head) => {
                if block.num() != head.num() + 1 {
                    return Err(ChainError::InvalidBlockLinkage(format!(
                        "Expected block {}, got block {}",
                        head.num() + 1,
                        block.num()
                    )));
                }
                if block.header.previous_block_id != head.id() {
                    warn!(
                        "block {} links to {} but head is {}",
                        block.num(),
                        short_id(&block.header.previous_block_id),
                        short_id(head.id())
                    );
                    return Err(ChainError::InvalidBlockLinkage(format!(
                        "Block {} does not link to the chain head",
                        block.num()
                    )));
                }
            }
        }

        if self.blocks.iter().any(|b| b.id() == block.id()) {
            return Err(ChainError::BlockAlreadyExists);
        }

        info!(
            "appended block {} ({}) with {} batches",
            block.num(),
            short_id(block.id()),
            block.batch_count()
        );
        self.blocks.push(block);
        Ok(())
    }
}

/// Publishes a new block on top of `head`: validates the batches, inherits the
/// head's consensus algorithm, and signs with the validator key.
pub fn publish_block(
    head: &Block,
    batches: Vec<Batch>,
    signer: &KeyPair,
) -> Result<Block> {
    if batches.is_empty() {
        return Err(ChainError::InvalidBlock(
            "A published block must contain at least one batch".to_string(),
        ));
    }
    for batch in &batches {
        batch.validate()?;
    }

    Block::create(
        head.num() + 1,
        head.id(),
        &head.header.state_root_hash,
        &head.header.consensus,
        batches,
        signer,
    )
}
