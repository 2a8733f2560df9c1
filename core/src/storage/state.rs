use anyhow::Result;

/// Backend holding the committed world state.
///
/// Decouples the ledger from the database: calls read through it and the
/// host applies each successful call's writes as one batch.
pub trait StateStore {
    /// Committed value for `key`, if any
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Apply every write in `batch`, or none of them
    fn apply_batch(&self, batch: StateBatch) -> Result<()>;
}

/// Writes produced by one call, applied atomically
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StateBatch {
    pub writes: Vec<(String, Vec<u8>)>,
}

impl StateBatch {
    pub fn put(&mut self, key: impl Into<String>, value: Vec<u8>) {
        self.writes.push((key.into(), value));
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Vec<u8>)> for StateBatch {
    fn from_iter<I: IntoIterator<Item = (K, Vec<u8>)>>(iter: I) -> Self {
        Self {
            writes: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
