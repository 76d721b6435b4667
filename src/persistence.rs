//! Block store backends
//!
//! The store keeps committed blocks keyed by block number plus a queue of
//! pending batches waiting to be published. Blocks are stored whole as JSON;
//! the indexed columns exist for lookups, not as a second source of truth.

use crate::batch::Batch;
use crate::block::Block;
use crate::chain::Chain;
use crate::error::{ChainError, Result};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

/// Abstraction for persistence backends.
pub trait BlockStore: Send + Sync {
    fn put_block(&self, block: &Block) -> Result<()>;
    fn chain_head(&self) -> Result<Option<Block>>;
    fn block_by_num(&self, num: u64) -> Result<Option<Block>>;
    /// Looks a block up by its full id or a unique id prefix.
    fn block_by_id(&self, id: &str) -> Result<Option<Block>>;
    /// All blocks, newest first.
    fn list_blocks(&self) -> Result<Vec<Block>>;
    fn block_count(&self) -> Result<u64>;

    fn queue_batch(&self, batch: &Batch) -> Result<()>;
    fn pending_batches(&self) -> Result<Vec<Batch>>;
    /// Removes and returns the pending queue, atomically.
    fn drain_pending(&self) -> Result<Vec<Batch>>;

    /// Loads and revalidates the whole chain.
    fn load_chain(&self) -> Result<Chain> {
        let mut blocks = self.list_blocks()?;
        blocks.reverse();
        Chain::from_blocks(blocks)
    }
}

pub struct SqliteBlockStore {
    conn: Mutex<Connection>,
}

impl SqliteBlockStore {
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| ChainError::DatabaseError(format!("Failed to open database: {}", e)))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS blocks (
                block_num INTEGER PRIMARY KEY,
                block_id TEXT NOT NULL UNIQUE,
                previous_block_id TEXT NOT NULL,
                signer_public_key TEXT NOT NULL,
                block_json TEXT NOT NULL
            )",
            [],
        )
        .map_err(|e| ChainError::DatabaseError(format!("Failed to create blocks table: {}", e)))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS pending_batches (
                batch_id TEXT PRIMARY KEY,
                queued_at INTEGER NOT NULL,
                batch_json TEXT NOT NULL
            )",
            [],
        )
        .map_err(|e| {
            ChainError::DatabaseError(format!("Failed to create pending_batches table: {}", e))
        })?;

        Ok(SqliteBlockStore {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| ChainError::DatabaseError("Mutex poisoned".to_string()))
    }

    fn row_to_block(json: &str) -> Result<Block> {
        serde_json::from_str(json)
            .map_err(|e| ChainError::DatabaseError(format!("Failed to decode block: {}", e)))
    }
}

impl BlockStore for SqliteBlockStore {
    fn put_block(&self, block: &Block) -> Result<()> {
        let block_json = serde_json::to_string(block)?;
        let conn = self.lock()?;
        let inserted = conn
            .execute(
                "INSERT OR IGNORE INTO blocks
                 (block_num, block_id, previous_block_id, signer_public_key, block_json)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    block.num() as i64,
                    block.id(),
                    block.header.previous_block_id,
                    block.header.signer_public_key,
                    block_json,
                ],
            )
            .map_err(|e| ChainError::DatabaseError(format!("Failed to save block: {}", e)))?;

        if inserted == 0 {
            return Err(ChainError::BlockAlreadyExists);
        }
        Ok(())
    }

    fn chain_head(&self) -> Result<Option<Block>> {
        let conn = self.lock()?;
        let result = conn.query_row(
            "SELECT block_json FROM blocks ORDER BY block_num DESC LIMIT 1",
            [],
            |row| row.get::<_, String>(0),
        );
        match result {
            Ok(json) => Ok(Some(Self::row_to_block(&json)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(ChainError::DatabaseError(format!(
                "Failed to query chain head: {}",
                e
            ))),
        }
    }

    fn block_by_num(&self, num: u64) -> Result<Option<Block>> {
        let conn = self.lock()?;
        let result = conn.query_row(
            "SELECT block_json FROM blocks WHERE block_num = ?1",
            params![num as i64],
            |row| row.get::<_, String>(0),
        );
        match result {
            Ok(json) => Ok(Some(Self::row_to_block(&json)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(ChainError::DatabaseError(format!(
                "Failed to query block: {}",
                e
            ))),
        }
    }

    fn block_by_id(&self, id: &str) -> Result<Option<Block>> {
        let conn = self.lock()?;
        // LIKE treats % and _ as wildcards; ids are hex so reject them outright
        if id.is_empty() || !id.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Ok(None);
        }
        let mut stmt = conn
            .prepare("SELECT block_json FROM blocks WHERE block_id LIKE ?1 LIMIT 2")
            .map_err(|e| ChainError::DatabaseError(format!("Failed to prepare query: {}", e)))?;
        let rows = stmt
            .query_map(params![format!("{}%", id)], |row| row.get::<_, String>(0))
            .map_err(|e| ChainError::DatabaseError(format!("Failed to query block: {}", e)))?;

        let mut matches = Vec::new();
        for row in rows {
            let json =
                row.map_err(|e| ChainError::DatabaseError(format!("Failed to read row: {}", e)))?;
            matches.push(json);
        }
        match matches.len() {
            0 => Ok(None),
            1 => Ok(Some(Self::row_to_block(&matches[0])?)),
            _ => Err(ChainError::BlockNotFound(format!(
                "Id prefix '{}' is ambiguous",
                id
            ))),
        }
    }

    fn list_blocks(&self) -> Result<Vec<Block>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT block_json FROM blocks ORDER BY block_num DESC")
            .map_err(|e| ChainError::DatabaseError(format!("Failed to prepare query: {}", e)))?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| ChainError::DatabaseError(format!("Failed to query blocks: {}", e)))?;

        let mut blocks = Vec::new();
        for row in rows {
            let json =
                row.map_err(|e| ChainError::DatabaseError(format!("Failed to read row: {}", e)))?;
            blocks.push(Self::row_to_block(&json)?);
        }
        Ok(blocks)
    }

    fn block_count(&self) -> Result<u64> {
        let conn = self.lock()?;
        conn.query_row("SELECT COUNT(*) FROM blocks", [], |row| {
            row.get::<_, i64>(0)
        })
        .map(|n| n as u64)
        .map_err(|e| ChainError::DatabaseError(format!("Failed to count blocks: {}", e)))
    }

    fn queue_batch(&self, batch: &Batch) -> Result<()> {
        let batch_json = serde_json::to_string(batch)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO pending_batches (batch_id, queued_at, batch_json)
             VALUES (?1, ?2, ?3)",
            params![batch.id(), chrono::Utc::now().timestamp(), batch_json],
        )
        .map_err(|e| ChainError::DatabaseError(format!("Failed to queue batch: {}", e)))?;
        Ok(())
    }

    fn pending_batches(&self) -> Result<Vec<Batch>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT batch_json FROM pending_batches ORDER BY queued_at ASC, batch_id ASC")
            .map_err(|e| ChainError::DatabaseError(format!("Failed to prepare query: {}", e)))?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| ChainError::DatabaseError(format!("Failed to query batches: {}", e)))?;

        let mut batches = Vec::new();
        for row in rows {
            let json =
                row.map_err(|e| ChainError::DatabaseError(format!("Failed to read row: {}", e)))?;
            batches.push(
                serde_json::from_str(&json)
                    .map_err(|e| ChainError::DatabaseError(format!("Failed to decode batch: {}", e)))?,
            );
        }
        Ok(batches)
    }

    fn drain_pending(&self) -> Result<Vec<Batch>> {
        let batches = self.pending_batches()?;
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction().map_err(|e| {
            ChainError::DatabaseError(format!("Failed to start transaction: {}", e))
        })?;
        tx.execute("DELETE FROM pending_batches", [])
            .map_err(|e| ChainError::DatabaseError(format!("Failed to drain queue: {}", e)))?;
        tx.commit()
            .map_err(|e| ChainError::DatabaseError(format!("Failed to commit: {}", e)))?;
        Ok(batches)
    }
}

/// Simple in-memory store useful for tests and ephemeral runs.
#[derive(Clone, Default)]
pub struct MemoryBlockStore {
    blocks: Arc<Mutex<Vec<Block>>>,
    pending: Arc<Mutex<Vec<Batch>>>,
}

impl MemoryBlockStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_blocks(&self) -> Result<std::sync::MutexGuard<'_, Vec<Block>>> {
        self.blocks
            .lock()
            .map_err(|_| ChainError::DatabaseError("Mutex poisoned".to_string()))
    }

    fn lock_pending(&self) -> Result<std::sync::MutexGuard<'_, Vec<Batch>>> {
        self.pending
            .lock()
            .map_err(|_| ChainError::DatabaseError("Mutex poisoned".to_string()))
    }
}

impl BlockStore for MemoryBlockStore {
    fn put_block(&self, block: &Block) -> Result<()> {
        let mut blocks = self.lock_blocks()?;
        if blocks
            .iter()
            .any(|b| b.id() == block.id() || b.num() == block.num())
        {
            return Err(ChainError::BlockAlreadyExists);
        }
        blocks.push(block.clone());
        blocks.sort_by_key(|b| b.num());
        Ok(())
    }

    fn chain_head(&self) -> Result<Option<Block>> {
        Ok(self.lock_blocks()?.last().cloned())
    }

    fn block_by_num(&self, num: u64) -> Result<Option<Block>> {
        Ok(self.lock_blocks()?.iter().find(|b| b.num() == num).cloned())
    }

    fn block_by_id(&self, id: &str) -> Result<Option<Block>> {
        if id.is_empty() {
            return Ok(None);
        }
        let blocks = self.lock_blocks()?;
        let matches: Vec<&Block> = blocks.iter().filter(|b| b.id().starts_with(id)).collect();
        match matches.len() {
            0 => Ok(None),
            1 => Ok(Some(matches[0].clone())),
            _ => Err(ChainError::BlockNotFound(format!(
                "Id prefix '{}' is ambiguous",
                id
            ))),
        }
    }

    fn list_blocks(&self) -> Result<Vec<Block>> {
        let mut blocks = self.lock_blocks()?.clone();
        blocks.sort_by(|a, b| b.num().cmp(&a.num()));
        Ok(blocks)
    }

    fn block_count(&self) -> Result<u64> {
        Ok(self.lock_blocks()?.len() as u64)
    }

    fn queue_batch(&self, batch: &Batch) -> Result<()> {
        let mut pending = self.lock_pending()?;
        pending.retain(|b| b.id() != batch.id());
        pending.push(batch.clone());
        Ok(())
    }

    fn pending_batches(&self) -> Result<Vec<Batch>> {
        Ok(self.lock_pending()?.clone())
    }

    fn drain_pending(&self) -> Result<Vec<Batch>> {
        let mut pending = self.lock_pending()?;
        Ok(std::mem::take(&mut *pending))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::publish_block;
    use crate::crypto::KeyPair;
    use crate::genesis::build_genesis;
    use crate::transaction::{Transaction, TransactionSpec};

    fn make_batch(keypair: &KeyPair, payload: &[u8]) -> Batch {
        let txn = Transaction::create(
            TransactionSpec {
                family_name: "smallbank".to_string(),
                family_version: "1.0".to_string(),
                inputs: vec!["332514aa".to_string()],
                outputs: vec!["332514aa".to_string()],
                payload: payload.to_vec(),
            },
            keypair,
            &keypair.public_key_hex(),
        )
        .unwrap();
        Batch::create(vec![txn], keypair).unwrap()
    }

    fn seed_store(store: &dyn BlockStore, keypair: &KeyPair, extra_blocks: usize) {
        let genesis = build_genesis(&[], keypair).unwrap();
        store.put_block(&genesis).unwrap();
        let mut head = genesis;
        for i in 0..extra_blocks {
            let batches = vec![make_batch(keypair, format!("payload {}", i).as_bytes())];
            let block = publish_block(&head, batches, keypair).unwrap();
            store.put_block(&block).unwrap();
            head = block;
        }
    }

    #[test]
    fn test_sqlite_round_trip() {
        let store = SqliteBlockStore::open(":memory:").unwrap();
        let keypair = KeyPair::generate();
        seed_store(&store, &keypair, 2);

        assert_eq!(store.block_count().unwrap(), 3);
        assert_eq!(store.chain_head().unwrap().unwrap().num(), 2);

        let listed = store.list_blocks().unwrap();
        let nums: Vec<u64> = listed.iter().map(|b| b.num()).collect();
        assert_eq!(nums, vec![2, 1, 0]);

        // reloaded chain revalidates
        let chain = store.load_chain().unwrap();
        assert_eq!(chain.len(), 3);
    }

    #[test]
    fn test_sqlite_duplicate_block_rejected() {
        let store = SqliteBlockStore::open(":memory:").unwrap();
        let keypair = KeyPair::generate();
        seed_store(&store, &keypair, 0);

        let genesis = store.block_by_num(0).unwrap().unwrap();
        let err = store.put_block(&genesis).unwrap_err();
        assert!(matches!(err, ChainError::BlockAlreadyExists));
    }

    #[test]
    fn test_block_by_id_prefix() {
        let store = SqliteBlockStore::open(":memory:").unwrap();
        let keypair = KeyPair::generate();
        seed_store(&store, &keypair, 1);

        let head = store.chain_head().unwrap().unwrap();
        let by_full = store.block_by_id(head.id()).unwrap().unwrap();
        assert_eq!(by_full.id(), head.id());

        let by_prefix = store.block_by_id(&head.id()[..16]).unwrap().unwrap();
        assert_eq!(by_prefix.id(), head.id());

        assert!(store.block_by_id("not-hex%").unwrap().is_none());
    }

    #[test]
    fn test_pending_queue() {
        let store = SqliteBlockStore::open(":memory:").unwrap();
        let keypair = KeyPair::generate();

        store.queue_batch(&make_batch(&keypair, b"one")).unwrap();
        store.queue_batch(&make_batch(&keypair, b"two")).unwrap();
        assert_eq!(store.pending_batches().unwrap().len(), 2);

        let drained = store.drain_pending().unwrap();
        assert_eq!(drained.len(), 2);
        assert!(store.pending_batches().unwrap().is_empty());
    }

    #[test]
    fn test_memory_store_matches_sqlite_behavior() {
        let store = MemoryBlockStore::new();
        let keypair = KeyPair::generate();
        seed_store(&store, &keypair, 2);

        assert_eq!(store.block_count().unwrap(), 3);
        let nums: Vec<u64> = store
            .list_blocks()
            .unwrap()
            .iter()
            .map(|b| b.num())
            .collect();
        assert_eq!(nums, vec![2, 1, 0]);

        let head = store.chain_head().unwrap().unwrap();
        assert!(store.block_by_id(&head.id()[..12]).unwrap().is_some());

        let err = store.put_block(&head).unwrap_err();
        assert!(matches!(err, ChainError::BlockAlreadyExists));
    }
}
