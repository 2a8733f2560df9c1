use crate::storage::{StateBatch, StateStore};
use anyhow::{Context, Result};
use rocksdb::{ColumnFamilyDescriptor, DB, Options, WriteBatch};
use std::path::Path;
use std::sync::Arc;

const CF_WORLD_STATE: &str = "world_state";

/// A thread-safe wrapper around RocksDB.
#[derive(Clone)]
pub struct RocksDbStore {
    db: Arc<DB>,
}

impl RocksDbStore {
    /// Opens the database at the specified path, creating it if missing.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let families = vec![ColumnFamilyDescriptor::new(
            CF_WORLD_STATE,
            Options::default(),
        )];

        let db = DB::open_cf_descriptors(&opts, path, families)
            .map_err(|e| anyhow::anyhow!("Failed to open RocksDB: {}", e))?;

        Ok(Self { db: Arc::new(db) })
    }
}

impl StateStore for RocksDbStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let cf = self
            .db
            .cf_handle(CF_WORLD_STATE)
            .context("world_state CF missing")?;

        Ok(self.db.get_cf(cf, key.as_bytes())?)
    }

    fn apply_batch(&self, batch: StateBatch) -> Result<()> {
        let cf = self
            .db
            .cf_handle(CF_WORLD_STATE)
            .context("world_state CF missing")?;

        let mut write_batch = WriteBatch::default();
        for (key, value) in &batch.writes {
            write_batch.put_cf(cf, key.as_bytes(), value);
        }

        self.db.write(write_batch)?;
        Ok(())
    }
}
